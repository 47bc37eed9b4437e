//! Replication state
//!
//! Tracks the bookmark of each incremental stream and the stream that was
//! being synced when a run stopped. State documents use the Singer layout:
//!
//! ```json
//! {"bookmarks": {"ads_reports": {"date": "2021-09-20"}}, "currently_syncing": null}
//! ```

mod tracker;
mod types;

pub use tracker::StateTracker;
pub use types::{Bookmark, State};

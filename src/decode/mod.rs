//! Response decoder module
//!
//! The Ads API wraps every payload in a `data` member: a list for collection
//! endpoints and a single object for the account endpoint. Decoders pull the
//! records out of an already parsed response body.

mod decoders;
mod types;

pub use decoders::JsonDecoder;
pub use types::RecordDecoder;

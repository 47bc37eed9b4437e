//! Stream definitions
//!
//! Every resource the tap extracts, with its endpoint, primary key,
//! replication strategy and bundled JSON schema.

use crate::error::{Error, Result};
use crate::schema::JsonSchema;
use crate::types::ReplicationMethod;
use std::fmt;
use std::str::FromStr;

/// Replication key of the report stream
pub const REPORT_REPLICATION_KEY: &str = "date";

/// A stream exposed by the tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapStream {
    /// Daily ad performance reports
    AdsReports,
    /// Ads
    Ads,
    /// Campaigns
    Campaigns,
    /// Ad groups
    AdGroups,
    /// The configured ad account
    Accounts,
}

impl TapStream {
    /// All streams, in discovery order
    pub const ALL: [TapStream; 5] = [
        TapStream::AdsReports,
        TapStream::Ads,
        TapStream::Campaigns,
        TapStream::AdGroups,
        TapStream::Accounts,
    ];

    /// Stream name (`tap_stream_id`)
    pub fn name(self) -> &'static str {
        match self {
            TapStream::AdsReports => "ads_reports",
            TapStream::Ads => "ads",
            TapStream::Campaigns => "campaigns",
            TapStream::AdGroups => "ad_groups",
            TapStream::Accounts => "accounts",
        }
    }

    /// Path below `/api/v2.0/accounts/{account_id}`
    pub fn endpoint(self) -> &'static str {
        match self {
            TapStream::AdsReports => "/reports",
            TapStream::Ads => "/ads",
            TapStream::Campaigns => "/campaigns",
            TapStream::AdGroups => "/ad_groups",
            TapStream::Accounts => "",
        }
    }

    /// Primary key columns
    pub fn key_properties(self) -> &'static [&'static str] {
        match self {
            TapStream::AdsReports => &["date", "account_id", "campaign_id", "ad_group_id", "ad_id"],
            _ => &["id"],
        }
    }

    /// Replication method forced on the stream
    pub fn replication_method(self) -> ReplicationMethod {
        match self {
            TapStream::AdsReports => ReplicationMethod::Incremental,
            _ => ReplicationMethod::FullTable,
        }
    }

    /// Replication key for incremental streams
    pub fn replication_key(self) -> Option<&'static str> {
        match self.replication_method() {
            ReplicationMethod::Incremental => Some(REPORT_REPLICATION_KEY),
            ReplicationMethod::FullTable => None,
        }
    }

    /// The account endpoint returns a single object without a cursor
    pub fn is_paginated(self) -> bool {
        !matches!(self, TapStream::Accounts)
    }

    fn raw_schema(self) -> &'static str {
        match self {
            TapStream::AdsReports => include_str!("schemas/ads_reports.json"),
            TapStream::Ads => include_str!("schemas/ads.json"),
            TapStream::Campaigns => include_str!("schemas/campaigns.json"),
            TapStream::AdGroups => include_str!("schemas/ad_groups.json"),
            TapStream::Accounts => include_str!("schemas/accounts.json"),
        }
    }

    /// Bundled schema for the stream
    pub fn schema(self) -> Result<JsonSchema> {
        JsonSchema::from_json_str(self.raw_schema())
    }
}

impl fmt::Display for TapStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TapStream {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|stream| stream.name() == s)
            .ok_or_else(|| Error::StreamNotFound {
                stream: s.to_string(),
            })
    }
}

//! Typed payloads for the public command surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Database-wide record counters returned by `dbstats`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DbStats {
    /// Registered users.
    pub users: u64,
    /// Forum threads.
    pub threads: u64,
    /// Forum posts.
    pub posts: u64,
    /// Visual novel entries.
    pub vn: u64,
    /// Release entries.
    pub releases: u64,
    /// Tag entries.
    pub tags: u64,
    /// Staff entries.
    pub staff: u64,
    /// Producer entries.
    pub producers: u64,
    /// Character entries.
    pub chars: u64,
    /// Trait entries.
    pub traits: u64,
}

/// One page of `get` results.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Results<T> {
    /// Whether more results exist beyond this page.
    pub more: bool,
    /// Number of items in this page.
    pub num: u64,
    /// The items themselves.
    pub items: Vec<T>,
}

/// Paging and sorting options for `get`, sent as the command's JSON
/// argument. Fields left `None` are omitted so the server applies its
/// defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GetOptions {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Results per page (server-capped).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<u32>,
    /// Field to sort on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Reverse the sort order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
}

impl GetOptions {
    /// Whether every option is unset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Entity categories addressable by `get` and `set`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityType {
    /// Visual novels.
    Vn,
    /// Releases.
    Release,
    /// Producers.
    Producer,
    /// Characters.
    Character,
    /// Staff members.
    Staff,
    /// User accounts.
    User,
    /// The authenticated user's list labels.
    UlistLabels,
    /// The authenticated user's list entries.
    Ulist,
}

impl EntityType {
    /// The wire name used in command strings.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vn => "vn",
            Self::Release => "release",
            Self::Producer => "producer",
            Self::Character => "character",
            Self::Staff => "staff",
            Self::User => "user",
            Self::UlistLabels => "ulist-labels",
            Self::Ulist => "ulist",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vn" => Ok(Self::Vn),
            "release" => Ok(Self::Release),
            "producer" => Ok(Self::Producer),
            "character" => Ok(Self::Character),
            "staff" => Ok(Self::Staff),
            "user" => Ok(Self::User),
            "ulist-labels" => Ok(Self::UlistLabels),
            "ulist" => Ok(Self::Ulist),
            other => Err(format!("unknown entity type `{other}`")),
        }
    }
}

/// Body of an `error` response.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerErrorBody {
    /// Machine-readable error identifier.
    pub id: String,
    /// Human-readable message.
    pub msg: String,
}

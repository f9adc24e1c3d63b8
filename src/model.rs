// Plain data types that live for the duration of one run.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Title shown when the media carries neither name.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Category tag sent with the list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Anime,
    #[default]
    Manga,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Anime => write!(f, "ANIME"),
            MediaType::Manga => write!(f, "MANGA"),
        }
    }
}

/// One item of a user's list, keyed by the remote list-entry id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub title: String,
}

impl Entry {
    /// Build an entry, picking the first available name.
    pub fn new(id: i64, primary: Option<String>, secondary: Option<String>) -> Self {
        Entry {
            id,
            title: display_title(primary, secondary),
        }
    }
}

/// A named grouping of entries such as "Watching" or "Completed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaList {
    pub name: String,
    pub entries: Vec<Entry>,
}

/// Counters accumulated by the deletion loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    pub succeeded: usize,
    pub failed: usize,
}

/// How a single delete request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// HTTP 429; carries the parsed `Retry-After` if the server sent one.
    RateLimited { retry_after: Option<Duration> },
    Failed(String),
}

fn display_title(primary: Option<String>, secondary: Option<String>) -> String {
    primary
        .filter(|s| !s.is_empty())
        .or(secondary.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// Concatenate all lists in order, dropping the grouping.
pub fn flatten(lists: Vec<MediaList>) -> Vec<Entry> {
    lists.into_iter().flat_map(|l| l.entries).collect()
}

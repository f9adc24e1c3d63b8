// The purge flow: fetch → confirm → delete each entry → summarize.
//
// Requests are strictly sequential. Between entries the loop pauses for a
// fixed interval, and a rate-limited delete is retried exactly once after
// waiting for the server's `Retry-After` (or a fallback).

use crate::api::MediaListApi;
use crate::model::{flatten, DeleteOutcome, Entry, MediaType, RunResult};
use crate::ui;
use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Timing knobs for the deletion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSettings {
    /// Pause between consecutive entries.
    pub request_delay: Duration,
    /// Wait used when a 429 carries no usable `Retry-After`.
    pub fallback_retry_after: Duration,
}

impl Default for PurgeSettings {
    fn default() -> Self {
        PurgeSettings {
            request_delay: Duration::from_secs(2),
            fallback_retry_after: Duration::from_secs(60),
        }
    }
}

/// What to purge.
#[derive(Debug, Clone)]
pub struct PurgeRequest {
    pub username: String,
    pub media_type: MediaType,
    pub dry_run: bool,
}

/// Suspends the loop. Production code sleeps the thread.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    NothingToDelete,
    DryRun(usize),
    Aborted,
    Completed(RunResult),
}

/// Run the whole flow. `confirm` receives the entry count and decides
/// whether deletion goes ahead; it is not called when there is nothing
/// to delete or on a dry run.
pub fn run<A, P, C>(
    api: &A,
    request: &PurgeRequest,
    settings: &PurgeSettings,
    pause: &mut P,
    confirm: C,
) -> Result<PurgeOutcome>
where
    A: MediaListApi,
    P: Pause,
    C: FnOnce(usize) -> Result<bool>,
{
    let spinner = ui::spinner(format!(
        "Fetching {} lists for {}...",
        request.media_type, request.username
    ));
    let lists = api.fetch_lists(&request.username, request.media_type);
    spinner.finish_and_clear();
    let lists = lists.with_context(|| {
        format!(
            "Failed to fetch {} lists for {}",
            request.media_type, request.username
        )
    })?;

    for list in &lists {
        ui::list_summary(&list.name, list.entries.len());
    }
    let entries = flatten(lists);
    info!(count = entries.len(), "fetched entries");

    if entries.is_empty() {
        ui::nothing_to_delete(request.media_type);
        return Ok(PurgeOutcome::NothingToDelete);
    }

    if request.dry_run {
        ui::dry_run(&entries);
        return Ok(PurgeOutcome::DryRun(entries.len()));
    }

    if !confirm(entries.len())? {
        ui::aborted();
        return Ok(PurgeOutcome::Aborted);
    }

    let result = delete_all(api, &entries, settings, pause);
    ui::summary(&result);
    Ok(PurgeOutcome::Completed(result))
}

/// Delete `entries` in order, one request at a time.
pub fn delete_all<A: MediaListApi, P: Pause>(
    api: &A,
    entries: &[Entry],
    settings: &PurgeSettings,
    pause: &mut P,
) -> RunResult {
    let mut result = RunResult::default();
    let total = entries.len();

    for (i, entry) in entries.iter().enumerate() {
        match delete_with_retry(api, entry, settings, pause) {
            Ok(()) => {
                result.succeeded += 1;
                ui::entry_deleted(i + 1, total, entry);
            }
            Err(reason) => {
                result.failed += 1;
                ui::entry_failed(i + 1, total, entry, &reason);
            }
        }

        if i + 1 < total {
            pause.pause(settings.request_delay);
        }
    }

    result
}

fn delete_with_retry<A: MediaListApi, P: Pause>(
    api: &A,
    entry: &Entry,
    settings: &PurgeSettings,
    pause: &mut P,
) -> Result<(), String> {
    match attempt(api, entry.id) {
        DeleteOutcome::Deleted => Ok(()),
        DeleteOutcome::Failed(reason) => Err(reason),
        DeleteOutcome::RateLimited { retry_after } => {
            let wait = retry_after.unwrap_or(settings.fallback_retry_after);
            warn!(id = entry.id, wait_secs = wait.as_secs(), "rate limited, retrying once");
            ui::rate_limited(wait);
            pause.pause(wait);

            match attempt(api, entry.id) {
                DeleteOutcome::Deleted => Ok(()),
                DeleteOutcome::Failed(reason) => Err(reason),
                DeleteOutcome::RateLimited { .. } => Err("still rate limited after retry".into()),
            }
        }
    }
}

fn attempt<A: MediaListApi>(api: &A, id: i64) -> DeleteOutcome {
    api.delete_entry(id)
        .unwrap_or_else(|e| DeleteOutcome::Failed(format!("{:#}", e)))
}

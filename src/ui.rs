// UI layer: colored console output, the fetch spinner and the
// confirmation prompt. Everything here writes to the terminal; the
// decisions are made in `purge`.

use crate::model::{Entry, MediaType, RunResult};
use anyhow::{Context, Result};
use crossterm::style::{StyledContent, Stylize};
use crossterm::tty::IsTty;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// The only answer that lets deletion proceed.
pub const AFFIRMATIVE: &str = "yes";

/// Styled text when stdout is a terminal, the plain content otherwise.
fn paint<D: Display>(content: StyledContent<D>) -> String {
    if io::stdout().is_tty() {
        content.to_string()
    } else {
        content.content().to_string()
    }
}

/// Spinner shown while a request is in flight.
pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn list_summary(name: &str, count: usize) {
    println!("  {}: {} entries", paint(name.bold()), count);
}

pub fn nothing_to_delete(media_type: MediaType) {
    println!(
        "{}",
        paint(format!("No {} entries found. Nothing to delete.", media_type).green())
    );
}

pub fn dry_run(entries: &[Entry]) {
    let total = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        println!("[{}/{}] {} ({})", i + 1, total, entry.title, entry.id);
    }
    println!(
        "{}",
        paint(format!("Dry run: {} entries would be deleted.", total).yellow())
    );
}

/// Ask the user to type `yes`. Any other answer, including an empty
/// line or end of input, declines. Piped stdin is read as a plain line.
pub fn confirm_deletion(count: usize) -> Result<bool> {
    println!(
        "{}",
        paint(
            format!("About to delete {} entries. This cannot be undone.", count)
                .red()
                .bold()
        )
    );
    let prompt = format!("Type '{}' to continue", AFFIRMATIVE);

    let stdin = io::stdin();
    if stdin.is_tty() {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        return Ok(is_affirmative(&answer));
    }

    print!("{}: ", prompt);
    io::stdout().flush()?;
    let confirmed = read_answer(stdin.lock())?;
    println!();
    Ok(confirmed)
}

/// Read one line and check it against [`AFFIRMATIVE`].
pub fn read_answer<R: BufRead>(mut reader: R) -> Result<bool> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    Ok(is_affirmative(&line))
}

pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(AFFIRMATIVE)
}

pub fn aborted() {
    println!("{}", paint("Aborted. Nothing was deleted.".yellow()));
}

pub fn entry_deleted(index: usize, total: usize, entry: &Entry) {
    println!(
        "[{}/{}] {} {} ({})",
        index,
        total,
        paint("Deleted".green()),
        entry.title,
        entry.id
    );
}

pub fn entry_failed(index: usize, total: usize, entry: &Entry, reason: &str) {
    println!(
        "[{}/{}] {} {} ({}): {}",
        index,
        total,
        paint("Failed".red()),
        entry.title,
        entry.id,
        reason
    );
}

pub fn rate_limited(wait: Duration) {
    println!(
        "{}",
        paint(format!("Rate limited. Waiting {}s before retrying...", wait.as_secs()).yellow())
    );
}

pub fn summary(result: &RunResult) {
    println!();
    println!(
        "Done. {} deleted, {} failed.",
        paint(result.succeeded.to_string().green().bold()),
        paint(result.failed.to_string().red().bold())
    );
}

/// Fatal errors go to stderr.
pub fn fatal(err: &anyhow::Error) {
    let label = if io::stderr().is_tty() {
        "Error:".red().bold().to_string()
    } else {
        "Error:".to_string()
    };
    eprintln!("{} {:#}", label, err);
}

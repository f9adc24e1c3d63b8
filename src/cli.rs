// Command-line surface: positional credentials with environment fallback.

use crate::model::MediaType;
use clap::{CommandFactory, Parser};
use thiserror::Error;

pub const TOKEN_ENV: &str = "ANILIST_TOKEN";
pub const USERNAME_ENV: &str = "ANILIST_USERNAME";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Delete every entry from an AniList media list, one request at a time",
    long_about = None
)]
pub struct Args {
    /// AniList access token (falls back to ANILIST_TOKEN)
    #[arg(env = "ANILIST_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// AniList username whose lists are purged (falls back to ANILIST_USERNAME)
    #[arg(env = "ANILIST_USERNAME")]
    pub username: Option<String>,

    /// Which lists to purge
    #[arg(long = "type", value_enum, default_value = "manga")]
    pub media_type: MediaType,

    /// Print the entries that would be deleted, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Token and username after argument/environment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing {0}")]
pub struct MissingCredential(pub &'static str);

impl Args {
    /// Resolve both credentials. Blank values count as missing.
    pub fn credentials(&self) -> Result<Credentials, MissingCredential> {
        let token = non_blank(&self.access_token).ok_or(MissingCredential("access token"))?;
        let username = non_blank(&self.username).ok_or(MissingCredential("username"))?;
        Ok(Credentials { token, username })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Usage text shown when credentials cannot be resolved.
pub fn usage() -> String {
    let usage = Args::command().render_usage();
    format!(
        "{}\n\nProvide the access token and username as arguments, or set {} and {}.\nRun with --help for all options.",
        usage, TOKEN_ENV, USERNAME_ENV
    )
}

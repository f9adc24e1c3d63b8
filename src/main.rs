// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, resolve credentials, build the
//   API client and hand everything to `purge::run`.
// - Fatal errors, including bad arguments, are printed once and mapped
//   to exit code 1.

use anilist_purge::api::ApiClient;
use anilist_purge::cli::{self, Args};
use anilist_purge::purge::{self, PurgeRequest, PurgeSettings, ThreadSleep};
use anilist_purge::ui;
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    let creds = match args.credentials() {
        Ok(creds) => creds,
        Err(missing) => {
            eprintln!("Error: {}\n\n{}", missing, cli::usage());
            return ExitCode::FAILURE;
        }
    };

    let request = PurgeRequest {
        username: creds.username.clone(),
        media_type: args.media_type,
        dry_run: args.dry_run,
    };

    let result = ApiClient::from_env(&creds.token).and_then(|api| {
        tracing::debug!(endpoint = api.endpoint(), "using API endpoint");
        purge::run(
            &api,
            &request,
            &PurgeSettings::default(),
            &mut ThreadSleep,
            ui::confirm_deletion,
        )
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            ui::fatal(&err);
            ExitCode::FAILURE
        }
    }
}

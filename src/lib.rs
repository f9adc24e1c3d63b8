// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) wires these modules together.
//
// Module responsibilities:
// - `cli`: argument parsing and credential resolution.
// - `model`: the in-memory entries, lists and run counters.
// - `api`: HTTP/GraphQL interactions with AniList.
// - `purge`: the fetch → confirm → delete flow and its rate-limit handling.
// - `ui`: console output and the confirmation prompt.
pub mod api;
pub mod cli;
pub mod model;
pub mod purge;
pub mod ui;

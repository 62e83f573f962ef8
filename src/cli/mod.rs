//! # CLI
//!
//! `clap`-derive argument definitions (`args`), command dispatch
//! (`commands`), and output rendering (`output`) for the `suve` binary.
//! Mirrors the teacher's `cli.rs`/`main.rs` split: everything here returns
//! `anyhow::Result`, the boundary below (resolver/staging/apply) returns
//! `Result<T, SuveError>`.

pub mod args;
pub mod commands;
pub mod output;

pub use args::Cli;

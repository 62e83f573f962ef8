//! # suve
//!
//! Core library for the `suve` CLI: a git-like tool for addressing,
//! inspecting, and staging changes to cloud secrets and parameters before
//! applying them. The binary (`src/main.rs`) is a thin `clap`/`tokio`
//! wrapper around the modules below.

pub mod apply;
pub mod cli;
pub mod config;
pub mod constants;
pub mod diff_args;
pub mod error;
pub mod model;
pub mod observability;
pub mod provider;
pub mod resolver;
pub mod spec;
pub mod staging;

//! pipedash (Pipeline Dashboards) - terminal reports over a sales pipeline
//!
//! This library provides:
//! - Read-only access to the `client`, `employee` and
//!   `client_stage_progression` tables
//! - In-memory report transforms: the wide per-client stage pivot, terminal
//!   stage duration classification, trailing-window progression reports and
//!   latest-stage frequency tables
//! - The CLI that renders them as text tables or JSON
//!
//! # Example
//!
//! ```no_run
//! use pipedash::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repo;
pub mod report;
pub mod cli;
pub mod utils;

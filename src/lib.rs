//! covtree: COVID-19 figures aggregated along a World, continent and country tree
//!
//! Layers:
//! - `domain`: generic tree, region values, tree building and queries
//! - `application`: dataset service and report types
//! - `infrastructure`: record sources (CSV, in-memory) and service wiring
//! - `cli`: argument parsing, command dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

//! `scenario-shocks` library crate.
//!
//! Turns published CCAR/FRB scenario tables into shock statistics and the
//! tables and Markdown pages built from them. The binary (`shocks`) is a thin
//! wrapper around this library so that:
//!
//! - the shock calculator and template renderer are testable without files
//! - every pipeline stage can be driven from tests on a temp directory

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod shock;
pub mod template;

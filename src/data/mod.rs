//! Data preparation between ingest and shock calculation.

pub mod derive;
pub mod select;

pub use derive::{derive_path, derive_t0};
pub use select::{select_path, select_t0};

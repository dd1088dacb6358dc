//! Input/output helpers.
//!
//! - scenario CSV ingest + t0 extraction (`ingest`)
//! - CSV/text exports (`export`)
//! - JSON read/write (`json`)

pub mod export;
pub mod ingest;
pub mod json;

pub use export::*;
pub use ingest::*;
pub use json::*;

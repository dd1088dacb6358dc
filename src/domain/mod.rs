//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - scenario inputs (`Period`, `ScenarioTable`, `BaselineSnapshot`)
//! - calculation policy (`ExtremePolicy`, `ShockMethod`, `FactorConfig`, `OutputFormat`)
//! - calculation outputs (`ShockValue`, `ShockResult`, `ShockData`)

pub mod types;

pub use types::*;

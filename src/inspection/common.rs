//! Common utilities module
//!
//! This module contains shared utilities used across the inspection pipeline.

pub mod error;

pub use error::{InspectionError, Result};

//! # plotmerge Core
//!
//! Core types and utilities for plotmerge.
//! Provides the shared error taxonomy and the numeric helpers used when
//! comparing and printing tool heights.

pub mod error;
pub mod units;

pub use error::{ConfigError, Error, InputError, Result};
pub use units::{approx_eq, format_value, FLOAT_EPS};

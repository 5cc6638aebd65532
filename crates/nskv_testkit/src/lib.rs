//! # NSKV Testkit
//!
//! Test utilities for NSKV.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A reference-model harness for differential testing
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use nskv_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.set("builds", "u1:active", b"{}").unwrap();
//!     assert!(store.exists("builds", "u1:active").unwrap());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;

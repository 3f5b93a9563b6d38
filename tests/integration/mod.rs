//! Integration test suite for the prefab loader
//!
//! These tests drive the public API end to end: loading document graphs from
//! an in-memory store or a temporary project directory, saving them back, and
//! checking the registry afterwards.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **config**: Configuration files and filesystem-backed loaders
//! - **cycles**: Documents that nest themselves, directly or indirectly
//! - **errors**: Top-level failures and partial loads
//! - **loading**: Nested loads, diamonds, overrides
//! - **registry**: Observers, eviction, invariants after loads
//! - **saving**: Thin output, round trips, bulk saves

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod config;
mod cycles;
mod errors;
mod loading;
mod registry;
mod saving;

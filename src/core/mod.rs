//! Core types for the prefab loader
//!
//! This module holds the error surface shared by every component. Components keep
//! their own narrow error types for their internal contracts; [`PrefabError`] is
//! what crosses the public load/save boundary.
//!
//! # Modules
//!
//! ## `error` - Tagged error values
//!
//! - [`PrefabError`] - Every failure the loader and saver can report
//! - [`PrefabErrorKind`] - Plain discriminant for matching
//! - [`Result`] - Alias defaulting the error type to [`PrefabError`]

pub mod error;

pub use error::{PrefabError, PrefabErrorKind, Result};

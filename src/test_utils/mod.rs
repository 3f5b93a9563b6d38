//! Test utilities for the prefab loader
//!
//! This module provides helpers for writing tests: logging setup, temporary
//! project directories, and canned prefab document graphs.
//!
//! # Test Isolation
//!
//! Every [`TestProject`] lives in its own temporary directory that is removed
//! when the project is dropped, so tests never see each other's documents.
//!
//! # Example
//!
//! ```rust,no_run
//! use prefab_loader::registry::TemplateRegistry;
//! use prefab_loader::test_utils::{PrefabFixture, TestProject};
//!
//! # fn example() -> anyhow::Result<()> {
//! let project = TestProject::new()?;
//! PrefabFixture::nested().write_to(&project.project_dir)?;
//!
//! let loader = project.loader();
//! let mut registry = TemplateRegistry::new();
//! loader.load_from_path(&mut registry, "parent.prefab")?;
//! assert_eq!(registry.template_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod fixtures;

pub use environment::TestProject;
pub use fixtures::PrefabFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// This function initializes the tracing subscriber for tests, but only once
/// regardless of how many times it's called. It respects the `RUST_LOG` environment
/// variable if set, or uses the provided log level.
///
/// # Arguments
///
/// * `level` - Optional log level to use. If None, uses `RUST_LOG` environment variable
///
/// # Example
///
/// ```rust,no_run
/// use tracing::Level;
///
/// fn my_test() {
///     // Use environment variable
///     prefab_loader::test_utils::init_test_logging(None);
///
///     // Or set level programmatically
///     prefab_loader::test_utils::init_test_logging(Some(Level::DEBUG));
/// }
/// ```
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=prefab_loader=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            // No logging if neither is provided
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

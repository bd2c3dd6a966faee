//! Logging setup built on `tracing-subscriber`.
//!
//! Every crate in the workspace logs through the `tracing` macros. Binaries,
//! build scripts and tests pick a subscriber with [`init`] or [`try_init`].

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,sparkle=debug,sparkle_assets=debug,sparkle_render=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global fmt subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Install the global fmt subscriber, returning an error instead of panicking
/// when one is already installed. Output goes through the test writer so it is
/// captured by `cargo test`.
pub fn try_init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
}

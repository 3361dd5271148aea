pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;

use tracing::Level;

/// Install the stderr log subscriber. Debug output with `verbose`, warnings only otherwise.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // A subscriber may already be set when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

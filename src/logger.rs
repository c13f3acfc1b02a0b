use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging system.
///
/// The level is controlled through the RUST_LOG environment variable,
/// default level: info
///
/// Examples:
/// - RUST_LOG=debug cargo run
/// - RUST_LOG=carbonpost=trace cargo run
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("Logger initialized");
}

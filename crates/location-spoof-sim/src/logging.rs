//! Logging setup for the simulator binary

/// Install the global `tracing` subscriber
///
/// If RUST_LOG is not set, a default is chosen that keeps the engine chatty in
/// debug builds and quiet otherwise.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let defaulted = std::env::var("RUST_LOG").is_err();
    if defaulted {
        // Safety: single-threaded at startup, before the runtime is built
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var("RUST_LOG", "debug,location_spoof_lib::scheduler=info");
            } else {
                std::env::set_var("RUST_LOG", "info");
            }
        }
    }

    let result = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
        return;
    }

    if defaulted && let Ok(filter) = std::env::var("RUST_LOG") {
        tracing::info!("RUST_LOG set to default: {}", filter);
    }
}

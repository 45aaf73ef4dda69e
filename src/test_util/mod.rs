use tracing_subscriber::EnvFilter;

pub mod env;
pub mod feedback;
pub mod rtp;
pub mod transport;

pub fn setup_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

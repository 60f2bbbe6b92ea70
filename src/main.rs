//! gencheck CLI entry point

fn main() {
    // Initialize structured logging with env-based filter, defaulting to warn
    // so harness output stays clean in CI pipelines.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    gencheck::cli::run();
}

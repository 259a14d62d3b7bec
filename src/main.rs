//! Testator CLI entry point

fn main() {
    // Diagnostics go to stderr; the console summary and the transcript stay clean.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    testator::cli::run();
}

use tracing_subscriber::EnvFilter;

const CRATE_NAMES: &[&str] = &["ledgerbench_driver", "ledgerbench_test"];

/// Initialize the logger for testing.
///
/// This logs to the stdout registered by the Rust test runner. Events from the ledgerbench crates
/// are captured down to `TRACE`, so driver lifecycle and operation events show up together with
/// the `worker`, `round` and `adapter` fields of their `workload` span. Everything else, such as
/// the HTTP client and the test gateway's server stack, is limited to `ERROR`.
///
/// Calling this more than once is harmless; only the first call installs the logger.
///
/// # Example
///
/// ```
/// ledgerbench_test::tracing::init();
/// ```
pub fn init() {
    let mut env_filter = EnvFilter::new("ERROR");

    // Add all internal modules with maximum log-level.
    for name in CRATE_NAMES {
        env_filter = env_filter.add_directive(format!("{name}=TRACE").parse().unwrap());
    }

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

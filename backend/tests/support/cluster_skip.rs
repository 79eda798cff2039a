//! `SKIP_TEST_CLUSTER` policy for suites that need embedded PostgreSQL.

/// True when `SKIP_TEST_CLUSTER` is "1", "true", or "yes" (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Turn a cluster bootstrap failure into a skip or a panic.
///
/// With `SKIP_TEST_CLUSTER` set the reason is printed and `None` returned;
/// otherwise the test fails so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

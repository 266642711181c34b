// ============================================================================
// Utilities Module
// Tracing bootstrap for binaries and demos
// ============================================================================

/// Install a formatting subscriber that prints events at `level` and above.
///
/// Returns false if a global subscriber was already set (for example by a
/// test harness), in which case the existing one stays in place.
#[cfg(feature = "logging")]
pub fn init_tracing(level: tracing::Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init_tracing(tracing::Level::DEBUG);
        assert!(!init_tracing(tracing::Level::INFO));
    }
}

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default directive when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "expense_tracker=info";

/// Install the global fmt subscriber (stderr, `RUST_LOG` aware). Runs once.
///
/// `quiet` lowers the default to warnings, for the full-screen dashboard
/// where info lines would scribble over the alternate screen.
pub fn init_tracing(quiet: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let directive = if quiet { "expense_tracker=warn" } else { DEFAULT_DIRECTIVE };
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(directive),
        };

        // try_init: a test harness may already have installed a subscriber
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

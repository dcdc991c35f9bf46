use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. Safe to call once per process;
/// the UI shell calls this before touching the data layer.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accountd=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

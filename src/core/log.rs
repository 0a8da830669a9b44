use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    registry::LookupSpan, util::SubscriberInitExt,
};

/// Installs the global subscriber. A service logs at info by default, verbose adds
/// debug, and a `RUST_LOG` value replaces both.
pub fn init_logging(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|d| !d.trim().is_empty());

    tracing_subscriber::registry()
        .with(filter_layer(verbose, directives))
        .with(fmt::layer().pretty().without_time())
        .init();
}

/// Chooses the event filter: valid `directives` win, otherwise the crate and its
/// HTTP tracing are enabled at the level picked by `verbose`.
pub fn filter_layer<S>(
    verbose: bool,
    directives: Option<String>,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(env_filter) = directives.and_then(|d| EnvFilter::try_new(d).ok()) {
        return env_filter.boxed();
    }

    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    Targets::new()
        .with_target("xrate", level_filter)
        .with_target("tower_http", level_filter)
        .boxed()
}

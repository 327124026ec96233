use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "tbbr=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "tbbr=debug" } else { DEFAULT_FILTER })
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);
    // A second init (tests, replay inside a running process) keeps the first.
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

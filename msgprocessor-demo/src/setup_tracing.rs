use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::PanicHookInfo;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, filter::EnvFilter, fmt};

const ENV_DEBUG: &str = "MSGPROCESSOR_DEBUG";

/// Routes panics to `tracing` so they end up on a single log line in the configured format
/// instead of the default stderr output.
fn report_panic(panic_info: &PanicHookInfo<'_>) {
    // noop unless RUST_BACKTRACE or RUST_LIB_BACKTRACE is set
    let backtrace = Backtrace::capture();
    let backtrace_captured = backtrace.status() == BacktraceStatus::Captured;
    let payload = panic_info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<String>()
                .map(String::as_str)
        });

    match (panic_info.location(), payload, backtrace_captured) {
        (Some(location), Some(payload), false) => {
            tracing::error!(
                "{}:{}:{}: {}",
                location.file(),
                location.line(),
                location.column(),
                payload,
            );
        }
        _ => {
            tracing::error!("{}\n{}", panic_info, backtrace);
        }
    }
}

fn debug_mode() -> bool {
    std::env::var(ENV_DEBUG).is_ok_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Installs the global subscriber. RUST_LOG overrides the default level, which is `info`, or
/// `debug` when MSGPROCESSOR_DEBUG is `true`. Debug mode also switches from flattened JSON to
/// plain text.
pub(crate) fn register() {
    let debug_mode = debug_mode();
    let default_level = if debug_mode { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let layer = if debug_mode {
        fmt::layer().with_writer(std::io::stderr).boxed()
    } else {
        // JSON format, flattened
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .flatten_event(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .init();

    std::panic::set_hook(Box::new(report_panic));
}

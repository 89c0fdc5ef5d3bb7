use core::fmt;
use core::fmt::Write as _;
use std::fs::OpenOptions;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

#[macro_export]
macro_rules! unimplemented_log {
    ( $($arg:tt)* ) => {{
        tracing::warn!(
            "unimplemented: {}",
            format_args!($($arg)*),
        );
    }};
}

/// if `cond` is false, logs a warning with your message.
#[macro_export]
macro_rules! assert_warn {
    ($cond:expr, $($arg:tt)+) => {{
        if !$cond {
            tracing::warn!(
                target: module_path!(),
                "assertion warning: `{}` failed: {} at {}:{}",
                stringify!($cond),
                format_args!($($arg)+),
                file!(),
                line!(),
            );
        }
    }};
}

/// Log line layout: level, uptime second, module, message. The uptime second
/// comes from a `ts` field; events without one show a dash.
///
/// ```text
/// DEBUG     90 l4::timeout      cdid:1: no activity since 0, disconnecting
/// ```
struct UptimeFormatter {
    ansi: bool,
}

/// Splits the fields of an event into the uptime second, the message and
/// everything else
#[derive(Default)]
struct FieldCollector {
    ts: Option<String>,
    message: String,
    rest: String,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "ts" => self.ts = Some(format!("{:?}", value)),
            "message" => {
                let _ = write!(self.message, "{:?}", value);
            }
            name => {
                let _ = write!(self.rest, " {}={:?}", name, value);
            }
        }
    }
}

/// "i4b_l4::timeout" becomes "l4::timeout", "i4b_sim::drivers" becomes "sim::drivers"
fn short_target(target: &str) -> &str {
    target.strip_prefix("i4b_").unwrap_or(target)
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[34m",
        Level::TRACE => "\x1b[35m",
    }
}

impl<S, N> FormatEvent<S, N> for UptimeFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let level = meta.level();
        let ts = fields.ts.as_deref().unwrap_or("-");
        if self.ansi {
            write!(writer, "{}{:<5}\x1b[0m", level_color(level), level)?;
        } else {
            write!(writer, "{:<5}", level)?;
        }
        writeln!(
            writer,
            " {:>6} {:<16} {}{}",
            ts,
            short_target(meta.target()),
            fields.message,
            fields.rest
        )
    }
}

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    install(EnvFilter::new("trace"), None);
}

/// Sets up default logging to stdout and optionally, a verbose log file
/// Returns a guard, that needs to be kept alive for logging to file to work
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    install(get_default_stdout_filter(), verbose_logfile)
}

pub fn get_default_stdout_filter() -> EnvFilter {
    EnvFilter::new("info")
        // Callouts fire every half second for simple idle checks
        .add_directive("i4b_l4::callout=info".parse().unwrap())
        // Shorthold transitions
        .add_directive("i4b_l4::timeout=debug".parse().unwrap())
        // Linkage and registries
        .add_directive("i4b_l4::linkage=debug".parse().unwrap())
        .add_directive("i4b_l4::registry=debug".parse().unwrap())
        // Messages to the daemon
        .add_directive("i4b_l4::notify=debug".parse().unwrap())
}

/// Installs the global subscriber once; later calls are ignored. A log file
/// that cannot be opened is reported and skipped.
fn install(stdout_filter: EnvFilter, logfile: Option<String>) -> Option<WorkerGuard> {
    let file = logfile.and_then(|path| match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", path, e);
            None
        }
    });
    let (file_layer, guard) = match file {
        Some(f) => {
            let (writer, guard) = tracing_appender::non_blocking(f);
            let layer = tracing_subscriber::fmt::layer()
                .event_format(UptimeFormatter { ansi: false })
                .with_writer(writer)
                .with_filter(EnvFilter::new("trace"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(UptimeFormatter { ansi: true })
        .with_filter(stdout_filter);

    // Fails if a subscriber is already installed, e.g. by an earlier test
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init();
    guard
}

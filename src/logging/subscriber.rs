//! Tracing subscriber setup: the `dmake: ` console formatter and
//! initialisation.
use std::io::IsTerminal as _;

use tracing_subscriber::filter::LevelFilter;

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that prefixes every line with
/// the program name, the way command-line build tools report.
pub(super) struct DmakeFormatter {
    pub(super) ansi: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for DmakeFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        let (tag, color) = match level {
            tracing::Level::ERROR => ("error: ", "\x1b[31m"),
            tracing::Level::WARN => ("warning: ", "\x1b[33m"),
            tracing::Level::INFO if target == "dmake::stage" => ("", "\x1b[1m"),
            tracing::Level::INFO => ("", ""),
            _ => ("DEBUG: ", "\x1b[2m"),
        };

        if self.ansi && !color.is_empty() {
            writeln!(writer, "dmake: {color}{tag}{msg}\x1b[0m")
        } else {
            writeln!(writer, "dmake: {tag}{msg}")
        }
    }
}

/// Console level for the command-line verbosity flags.
///
/// `WARN` by default, `INFO` when verbose, `DEBUG` when debugging.
#[must_use]
pub const fn level_for(verbose: bool, debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Events go to stderr at `level` and above; `RUST_LOG` overrides the level
/// when set. Colour is used only when stderr is a terminal. Must be called
/// once at program startup, before any logging.
pub fn init_subscriber(level: LevelFilter) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let console_layer = fmt::layer()
        .event_format(DmakeFormatter {
            ansi: std::io::stderr().is_terminal(),
        })
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}

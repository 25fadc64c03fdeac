use anyhow::{Result, anyhow, bail};
use chrono::Local;
use std::{
    fmt::Display,
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

/// Level used when neither `RUST_LOG` nor the configuration names one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

// --- Formatter ---

/// `LEVEL origin fields`, prefixed with a local timestamp when `timestamps`
/// is set. Stderr output is short; the log file keeps the time.
struct EventFormat {
    timestamps: bool,
}

impl<S, N> FormatEvent<S, N> for EventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        if self.timestamps {
            let now = Local::now().format(TIMESTAMP_FORMAT);
            write!(writer, "{} ", paint(ansi, "2", now))?;
        }

        let level = format!("{:>5}", meta.level());
        write!(writer, "{} ", paint(ansi, level_style(*meta.level()), level))?;

        let origin = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => format!("{}:{line}", short_path(file)),
            _ => meta.target().to_string(),
        };
        write!(writer, "{} ", paint(ansi, "36", origin))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Wraps `text` in an SGR escape when colours are on.
fn paint(
    ansi: bool,
    style: &str,
    text: impl Display,
) -> String {
    if ansi {
        format!("\x1b[{style}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn level_style(level: Level) -> &'static str {
    match level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

/// Source path relative to its crate's `src` directory.
fn short_path(file: &str) -> &str {
    file.rfind("src/")
        .or_else(|| file.rfind("src\\"))
        .map_or(file, |i| &file[i + 4..])
}

// --- Late-bound log file ---

type SharedFile = Arc<Mutex<Option<File>>>;

/// Writer target that can be pointed at a file after the subscriber is
/// installed. Records are dropped while no file is open.
#[derive(Clone)]
struct LogFile(SharedFile);

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(lock(&self.0))
    }
}

fn lock(file: &SharedFile) -> MutexGuard<'_, Option<File>> {
    file.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- Statics ---

type ReloadFn = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;

static RELOAD_LEVEL: OnceLock<ReloadFn> = OnceLock::new();
static LOG_FILE: OnceLock<SharedFile> = OnceLock::new();

/// `RUST_LOG` when set and valid; `level` otherwise.
fn initial_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

fn keep_reload_handle<S>(handle: reload::Handle<EnvFilter, S>)
where
    S: Subscriber + Send + Sync + 'static,
{
    let _ = RELOAD_LEVEL.set(Box::new(move |level: &str| {
        let filter =
            EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;
        handle
            .reload(filter)
            .map_err(|e| anyhow!("cannot apply log level '{level}': {e}"))
    }));
}

// --- Public API ---

/// Whether `RUST_LOG` is set, in which case it wins over configured levels.
pub fn env_filter_present() -> bool {
    std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
}

/// Replaces the active filter. Takes a bare level such as `debug` or a full
/// directive such as `info,solar_core=trace`.
pub fn set_log_level(level: &str) -> Result<()> {
    let Some(apply) = RELOAD_LEVEL.get() else {
        bail!("logging not yet initialized");
    };
    apply(level)
}

/// Appends every following record to `path`, replacing any open log file.
/// The parent directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let Some(slot) = LOG_FILE.get() else {
        bail!("logging not yet initialized");
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;

    *lock(slot) = Some(file);
    Ok(())
}

/// Closes the log file, if any.
pub fn disable_file_logging() {
    if let Some(slot) = LOG_FILE.get() {
        *lock(slot) = None;
    }
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Records go to stderr, coloured on a terminal, so command output on stdout
/// stays clean; a log file can be added with [`enable_file_logging`]. One
/// reloadable filter, seeded from `RUST_LOG` or `level`, governs both.
pub fn init_logging(level: &str) {
    let file: SharedFile = Arc::new(Mutex::new(None));
    let _ = LOG_FILE.set(file.clone());

    let (filter, handle) = reload::Layer::new(initial_filter(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(EventFormat { timestamps: false })
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(EventFormat { timestamps: true })
        .with_ansi(false)
        .with_writer(LogFile(file));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    if installed.is_ok() {
        keep_reload_handle(handle);
    }
}

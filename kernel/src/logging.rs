use core::fmt::{self, Write};
use log::{Level, LevelFilter, Log, SetLoggerError};
use spin::{Mutex, Once};

static LOG_LOCK: Mutex<()> = Mutex::new(());
static CONSOLE: Once<&'static dyn Console> = Once::new();

/// Where log lines end up. The host kernel provides its early console here.
pub trait Console: Sync {
    fn write_str(&self, s: &str);
}

/// Install the driver logger on top of `console`.
///
/// Only the first call takes effect; later calls report the logger that is
/// already installed.
pub fn init(console: &'static dyn Console) -> Result<(), SetLoggerError> {
    static LOGGER: SimpleLogger = SimpleLogger;
    CONSOLE.call_once(|| console);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level_filter(option_env!("LOG")));
    Ok(())
}

fn level_filter(level: Option<&str>) -> LevelFilter {
    match level {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

struct ConsoleWriter<'a>(&'a dyn Console);

impl Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    if let Some(console) = CONSOLE.get() {
        let _guard = LOG_LOCK.lock();
        ConsoleWriter(*console).write_fmt(args).ok();
    }
}

/// Add escape sequence to print with color in Linux console
macro_rules! with_color {
    ($args: ident, $color_code: ident) => {{
        format_args!("\u{1B}[{}m{}\u{1B}[0m", $color_code as u8, $args)
    }};
}

fn print_with_color(args: fmt::Arguments, color_code: u8) {
    _print(with_color!(args, color_code));
}

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        print_with_color(
            format_args!(
                "[{:>5}][{}]: {}\n",
                record.level(),
                record.target(),
                record.args()
            ),
            level_to_color_code(record.level()),
        );
    }

    fn flush(&self) {}
}

fn level_to_color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}

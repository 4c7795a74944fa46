use colored::{ColoredString, Colorize};
use indicatif::ProgressBar;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the per-run log written under the config directory.
pub const LOG_FILE_NAME: &str = "plugforge.log";

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Get the current verbosity level
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Set the verbosity level without touching the log file
/// 0 = warnings and results only, 1 = info/debug (-v), 2 = trace (-vv)
pub fn set_verbosity(verbosity: u8) {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }
}

/// Initialize the logger with a verbosity level.
///
/// When `log_to_file` is false nothing is written to disk and only the
/// console receives messages.
pub fn init_with_verbosity(verbosity: u8, log_to_file: bool) -> Result<(), String> {
    set_verbosity(verbosity);

    if !log_to_file {
        return Ok(());
    }

    let config_dir = get_config_dir()?;
    init_in_dir(&config_dir)
}

/// Point the run log at `<dir>/plugforge.log`, truncating any previous run.
pub fn init_in_dir(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;

    let log_file = dir.join(LOG_FILE_NAME);

    // One log per run
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }

    let mut log_file_guard = LOG_FILE
        .lock()
        .map_err(|_| "Log file lock poisoned".to_string())?;
    *log_file_guard = Some(log_file);

    Ok(())
}

/// Get the config directory path
fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let config_dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("plugforge");

    #[cfg(target_os = "windows")]
    let config_dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("plugforge");

    Ok(config_dir)
}

fn write_to_log(message: &str) {
    // The lock is held for the whole write so concurrent workers never
    // interleave within a line
    let Ok(log_file_guard) = LOG_FILE.lock() else {
        return;
    };
    let Some(log_path) = log_file_guard.as_ref() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{}] {}", timestamp, message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Step,
    Debug,
    Info,
    Warn,
    Error,
    Success,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Step => "STEP",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Success => "SUCCESS",
        }
    }

    /// Verbosity at which the message also reaches the console
    fn console_threshold(self) -> u8 {
        match self {
            Level::Step => 2,
            Level::Debug | Level::Info => 1,
            Level::Warn | Level::Error | Level::Success => 0,
        }
    }

    fn console_label(self) -> Option<ColoredString> {
        match self {
            Level::Step => Some("TRACE:".dimmed()),
            Level::Debug => Some("DEBUG:".blue().bold()),
            Level::Info => None,
            Level::Warn => Some("warning:".yellow().bold()),
            Level::Error => Some("Error:".red().bold()),
            Level::Success => Some("\u{2714}".green().bold()),
        }
    }
}

fn emit(level: Level, message: &str) {
    write_to_log(&format!("{} {}", level.tag(), message));
    if get_verbosity() < level.console_threshold() {
        return;
    }
    match level.console_label() {
        Some(label) => eprintln!("{} {}", label, message),
        None => eprintln!("{}", message),
    }
}

/// Progress detail: console at -v, always to file
pub fn info(message: &str) {
    emit(Level::Info, message);
}

pub fn debug(message: &str) {
    emit(Level::Debug, message);
}

pub fn warn(message: &str) {
    emit(Level::Warn, message);
}

/// Always shown; used for the fatal message before exit
pub fn error(message: &str) {
    emit(Level::Error, message);
}

pub fn success(message: &str) {
    emit(Level::Success, message);
}

/// Fine-grained trace, console only at -vv
pub fn step(message: &str) {
    emit(Level::Step, message);
}

/// Record a finished subprocess and its combined output in the run log
pub fn capture_output(command: &str, exit_code: Option<i32>, output: &str) {
    write_to_log(&format!("COMMAND: {} (exit code: {:?})", command, exit_code));

    if !output.is_empty() {
        write_to_log(&format!("  OUTPUT:\n{}", output));
    }
}

/// Get the log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

/// Print the log file path to the user
pub fn show_log_path() {
    if let Some(path) = get_log_path() {
        eprintln!("Log file: {}", path.display());
    }
}

/// Start a spinner with the given message (only if not verbose)
pub fn spinner_start(message: &str) {
    // Verbose output would interleave with the spinner line
    if get_verbosity() > 0 {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());

    if let Ok(mut spinner_guard) = SPINNER.lock() {
        *spinner_guard = Some(spinner);
    }
}

/// Complete the spinner with a success message
pub fn spinner_success(message: &str) {
    spinner_stop();
    success(message);
}

/// Stop the spinner with an error message
pub fn spinner_error(message: &str) {
    spinner_stop();
    write_to_log(&format!("ERROR {}", message));
    eprintln!("  {} {}", "✗".red().bold(), message);
}

/// Stop the spinner without any message
pub fn spinner_stop() {
    if let Ok(mut spinner_guard) = SPINNER.lock() {
        if let Some(spinner) = spinner_guard.take() {
            spinner.finish_and_clear();
        }
    }
}

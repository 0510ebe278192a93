use chrono::Local;
use log::{LevelFilter, info};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::PathBuf;

/// `debug|info|warn|error|off` to a level filter.
pub fn parse_loglevel(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" | "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Name of the timestamped log file, `log_<date>_<time>.txt`.
pub fn log_file_name() -> PathBuf {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from(format!("log_{}.txt", date_and_time))
}

/// Terminal logger on stderr plus, when `to_file` is set, a copy in a timestamped file.
///
/// Returns the log file path when one was opened. A second call (a logger is already
/// installed) leaves the first one in place.
pub fn init_logger(level: LevelFilter, to_file: bool) -> Option<PathBuf> {
    if level == LevelFilter::Off {
        return None;
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));
    let mut log_path = None;
    if to_file {
        let name = log_file_name();
        match File::create(&name) {
            Ok(file) => {
                loggers.push(WriteLogger::new(level, Config::default(), file));
                log_path = Some(name);
            }
            Err(e) => eprintln!("could not create log file {}: {}", name.display(), e),
        }
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            if let Some(path) = &log_path {
                info!("logging to {}", path.display());
            }
            log_path
        }
        Err(_) => None,
    }
}

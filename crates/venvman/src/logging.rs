use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Log files larger than this are cut in half before logging starts.
pub const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Appends to a log file, reopening it if it is deleted while venvman runs.
struct ResilientFileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

fn open_for_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl ResilientFileWriter {
    fn new(path: PathBuf) -> io::Result<Self> {
        let file = open_for_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn file(&self) -> MutexGuard<'_, Option<File>> {
        self.file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Write for ResilientFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.file();
        if guard.is_none() || !self.path.exists() {
            *guard = Some(open_for_append(&self.path)?);
        }
        match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::other("Log file not available")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file().as_mut().map_or(Ok(()), Write::flush)
    }
}

fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

/// Terminal level for the number of `-v` flags given.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log to stderr at the level chosen by `verbosity` and, when `log_file` is
/// given, everything from debug upwards to that file as well.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("venvman")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    loggers.push(TermLogger::new(
        level_for_verbosity(verbosity),
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(log_path) = log_file {
        trim_log_file_if_oversized(log_path, MAX_LOG_SIZE);
        match ResilientFileWriter::new(log_path.to_path_buf()) {
            Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
            Err(error) => eprintln!("Cannot open log file {}: {error}", log_path.display()),
        }
    }

    let _ = CombinedLogger::init(loggers);

    if let Some(log_path) = log_file {
        log::debug!("Logging initialized, log file: {}", log_path.display());
    }
}

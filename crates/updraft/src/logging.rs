#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct ResilientFileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ResilientFileWriter {
    fn new(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn ensure_file(&self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }

        Ok(())
    }
}

impl Write for ResilientFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_file()?;
        let mut guard = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(ref mut file) = *guard {
            file.write(buf)
        } else {
            Err(io::Error::other("File not available"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(ref mut file) = *guard {
            file.flush()
        } else {
            Ok(())
        }
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

/// Install the file logger (plus a terminal logger in debug builds).
///
/// Returns `false` when no logger could be installed, e.g. because one is
/// already set.
pub fn init_logging(log_path: &Path, verbose: bool, max_log_size: u64) -> bool {
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    trim_log_file_if_oversized(log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("updraft")
        .build();

    let file_logger = ResilientFileWriter::new(log_path.to_path_buf())
        .ok()
        .map(|writer| WriteLogger::new(LevelFilter::Debug, config.clone(), writer));

    #[cfg(debug_assertions)]
    let installed = {
        let term_logger = TermLogger::new(
            LevelFilter::Debug,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        );

        if let Some(file_logger) = file_logger {
            CombinedLogger::init(vec![term_logger, file_logger]).is_ok()
        } else {
            CombinedLogger::init(vec![term_logger]).is_ok()
        }
    };

    #[cfg(not(debug_assertions))]
    let installed = match file_logger {
        Some(file_logger) => CombinedLogger::init(vec![file_logger]).is_ok(),
        None => false,
    };

    set_verbose(verbose);
    log::debug!("Logging initialized, log file: {}", log_path.display());
    installed
}

pub fn set_verbose(verbose: bool) {
    if verbose {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }
}

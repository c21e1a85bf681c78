//! File exporter with optional size-based rotation
//!
//! Backups are named `<file>.1` (newest) through `<file>.<max_files>`
//! (oldest). With the `file` feature the file is exclusively locked for the
//! duration of each export, so several processes can share one log file.

use crate::core::{
    Export, LoggerError, Message, OutputFormat, Result, TimestampFormat,
};
#[cfg(feature = "file")]
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of backups kept when rotation is enabled
pub const DEFAULT_MAX_FILES: usize = 5;

pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    max_file_size: Option<u64>,
    max_files: usize,
    lock: bool,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
}

impl FileSink {
    /// Open (or create) `path` for appending
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (file, current_size) = open_append(&path)?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            current_size,
            max_file_size: None,
            max_files: DEFAULT_MAX_FILES,
            lock: true,
            output_format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
        })
    }

    /// Rotate before a write would grow the file past `max_bytes`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use log_dispatcher::sinks::FileSink;
    ///
    /// let sink = FileSink::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_rotation(10 * 1024 * 1024, 3);
    /// ```
    #[must_use]
    pub fn with_rotation(mut self, max_bytes: u64, max_files: usize) -> Self {
        self.max_file_size = Some(max_bytes);
        self.max_files = max_files;
        self
    }

    #[must_use]
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let (file, size) = open_append(&self.path)?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }
        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))
    }

    #[cfg(feature = "file")]
    fn acquire_lock(&mut self) -> Result<()> {
        if !self.lock {
            return Ok(());
        }
        let path = self.path.display().to_string();
        let writer = self.writer()?;
        FileExt::lock_exclusive(writer.get_ref()).map_err(|_| LoggerError::file_lock(path))
    }

    #[cfg(not(feature = "file"))]
    fn acquire_lock(&mut self) -> Result<()> {
        Ok(())
    }

    fn release_lock(&mut self) {
        #[cfg(feature = "file")]
        if self.lock {
            if let Some(ref writer) = self.writer {
                let _ = FileExt::unlock(writer.get_ref());
            }
        }
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        match self.max_file_size {
            Some(max) => self.current_size > 0 && self.current_size + incoming > max,
            None => false,
        }
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "app.log".into());
        name.push(format!(".{}", index));
        self.path.with_file_name(name)
    }

    fn rotate(&mut self) -> Result<()> {
        let display = self.path.display().to_string();

        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(&display, format!("Failed to flush before rotation: {}", e))
            })?;
        }

        if self.max_files == 0 {
            fs::remove_file(&self.path).map_err(|e| {
                LoggerError::file_rotation(&display, format!("Failed to truncate log file: {}", e))
            })?;
        } else {
            let oldest = self.backup_path(self.max_files);
            if oldest.exists() {
                if let Err(e) = fs::remove_file(&oldest) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove oldest backup {}: {}",
                        oldest.display(),
                        e
                    );
                }
            }

            for index in (1..self.max_files).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    let to = self.backup_path(index + 1);
                    fs::rename(&from, &to).map_err(|e| {
                        LoggerError::file_rotation(
                            from.display().to_string(),
                            format!("Failed to shift backup: {}", e),
                        )
                    })?;
                }
            }

            fs::rename(&self.path, self.backup_path(1)).map_err(|e| {
                LoggerError::file_rotation(&display, format!("Failed to rotate current log file: {}", e))
            })?;
        }

        let (file, size) = open_append(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        Ok(())
    }

    fn write_batch(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        for message in messages {
            let mut line = self.output_format.format(message, &self.timestamp_format);
            line.push('\n');
            let len = line.len() as u64;

            if self.should_rotate(len) {
                self.release_lock();
                self.rotate()?;
                self.acquire_lock()?;
            }

            self.writer()?.write_all(line.as_bytes())?;
            self.current_size += len;
        }
        self.writer()?.flush()?;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
        })?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

impl Export for FileSink {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        self.acquire_lock()?;
        let result = self.write_batch(messages);
        self.release_lock();

        if result.is_err() {
            // Reopen on the next export
            self.writer = None;
        }
        result
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = Export::flush(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use tempfile::tempdir;

    fn batch(texts: &[&str]) -> Vec<Arc<Message>> {
        texts
            .iter()
            .map(|t| Message::new(*t, LogLevel::Info, "app").into_shared())
            .collect()
    }

    #[test]
    fn test_appends_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.log");

        let mut sink = FileSink::new(&path)?;
        sink.export(&batch(&["first", "second"]))?;
        sink.export(&batch(&["third"]))?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[info][app] first"));
        assert!(lines[2].ends_with("[info][app] third"));
        Ok(())
    }

    #[test]
    fn test_size_rotation_keeps_max_files() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.log");

        let mut sink = FileSink::new(&path)?.with_rotation(64, 2);
        for i in 0..10 {
            let text = format!("message number {}", i);
            sink.export(&batch(&[text.as_str()]))?;
        }

        assert!(path.exists());
        assert!(dir.path().join("app.log.1").exists());
        assert!(dir.path().join("app.log.2").exists());
        assert!(!dir.path().join("app.log.3").exists());

        let newest = fs::read_to_string(&path)?;
        assert!(newest.contains("message number 9"));
        Ok(())
    }

    #[test]
    fn test_unlocked_mode() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("plain.log");
        let mut sink = FileSink::new(&path)?.with_lock(false);
        sink.export(&batch(&["x"]))?;
        sink.flush()?;
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 1);
        Ok(())
    }

    #[test]
    fn test_open_failure() {
        let dir = tempdir().unwrap();
        let result = FileSink::new(dir.path().join("missing").join("app.log"));
        assert!(matches!(result, Err(LoggerError::FileSinkError { .. })));
    }
}

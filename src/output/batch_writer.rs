//! Atomic batch file writer with automatic cleanup on failure.
//!
//! Writes to a temporary file in the same directory as the destination,
//! then atomically replaces the destination on `finish()`. If dropped
//! before finishing, the temporary file is automatically cleaned up.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use time::macros::format_description;
use time::Date;

use crate::error::AppError;

/// An atomic writer for one exported batch.
pub struct AtomicBatchWriter {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl AtomicBatchWriter {
    /// Creates a writer targeting `final_path`.
    ///
    /// The temporary file lives next to `final_path` so the final rename
    /// stays on one filesystem.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the parent directory cannot be determined or
    /// the temporary file cannot be created.
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = final_path.parent().ok_or_else(|| {
            AppError::Io(format!(
                "Cannot determine parent directory for: {}",
                final_path.display()
            ))
        })?;

        let temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|e| AppError::Io(format!("Failed to create temporary file: {}", e)))?;

        Ok(Self {
            writer: BufWriter::new(temp_file),
            final_path,
        })
    }

    /// Appends CSV text.
    pub fn write_csv(&mut self, csv: &str) -> Result<(), AppError> {
        self.writer
            .write_all(csv.as_bytes())
            .map_err(|e| AppError::Io(format!("Failed to write batch: {}", e)))
    }

    /// Flushes and atomically persists the file, returning the final path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if flushing or persisting fails. On error the
    /// temporary file is cleaned up automatically.
    pub fn finish(self) -> Result<PathBuf, AppError> {
        let named_temp = self
            .writer
            .into_inner()
            .map_err(|e| AppError::Io(format!("Failed to flush buffer: {}", e.error())))?;

        named_temp.persist(&self.final_path).map_err(|e| {
            AppError::Io(format!(
                "Failed to persist file to {}: {}",
                self.final_path.display(),
                e.error
            ))
        })?;

        Ok(self.final_path)
    }
}

/// File name for a batch: `candidates-YYYY-MM-DD-pNNN.csv`.
pub fn batch_file_name(date: Date, batch: usize) -> String {
    let day = date
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string());
    format!("candidates-{}-p{:03}.csv", day, batch)
}

/// Writes one batch into `dir` and returns its path.
pub fn write_batch(dir: &Path, date: Date, batch: usize, csv: &str) -> Result<PathBuf, AppError> {
    let mut writer = AtomicBatchWriter::new(dir.join(batch_file_name(date, batch)))?;
    writer.write_csv(csv)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use time::macros::date;

    const SAMPLE: &str = "primary_id,first_name,last_name,email,related_id,related_created_at\n\
                          1,Amos,Marvin,applicant1@example.com,101,2020-11-01T09:00:00.000+01:00\n";

    #[test]
    fn test_successful_write() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("output.csv");

        let mut writer = AtomicBatchWriter::new(&final_path).expect("Failed to create writer");
        writer.write_csv(SAMPLE).expect("Failed to write");
        let result_path = writer.finish().expect("Failed to finish");

        assert_eq!(result_path, final_path);
        assert_eq!(fs::read_to_string(&final_path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_drop_cleanup() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("output.csv");

        {
            let mut writer = AtomicBatchWriter::new(&final_path).expect("Failed to create writer");
            writer.write_csv(SAMPLE).expect("Failed to write");
            // Dropped without finish()
        }

        let entries_after: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("Failed to read dir")
            .collect();
        assert!(entries_after.is_empty(), "Temp file should be cleaned up on drop");
        assert!(!final_path.exists());
    }

    #[test]
    fn test_overwrite_behavior() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("output.csv");
        fs::write(&final_path, "OLD_CONTENT").expect("Failed to write dummy file");

        let mut writer = AtomicBatchWriter::new(&final_path).expect("Failed to create writer");
        writer.write_csv(SAMPLE).expect("Failed to write");
        writer.finish().expect("Failed to finish");

        let content = fs::read_to_string(&final_path).expect("Failed to read file");
        assert!(!content.contains("OLD_CONTENT"));
        assert_eq!(content, SAMPLE);
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_parent_directory() {
        assert!(matches!(AtomicBatchWriter::new("/"), Err(AppError::Io(_))));
    }

    #[test]
    fn batch_names_are_dated_and_padded() {
        assert_eq!(batch_file_name(date!(2026 - 01 - 02), 1), "candidates-2026-01-02-p001.csv");
        assert_eq!(batch_file_name(date!(2026 - 10 - 15), 42), "candidates-2026-10-15-p042.csv");
    }

    #[test]
    fn write_batch_lands_in_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let path = write_batch(temp_dir.path(), date!(2026 - 01 - 02), 3, SAMPLE).unwrap();

        assert_eq!(path, temp_dir.path().join("candidates-2026-01-02-p003.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), SAMPLE);
    }
}

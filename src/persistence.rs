use crate::window::Sample;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::{
    fs::{create_dir_all, File, OpenOptions},
    io::AsyncWriteExt,
};

pub const CSV_HEADER: &str = "Time (s),Raw,Scaled,PWM (%)";

/// Append-only CSV log of every accepted sample. Each row is flushed before
/// `append_row` returns.
pub struct Persistence {
    path: PathBuf,
    file: Option<File>,
}

impl Persistence {
    /// Creates `log_<YYYYMMDD>_<HHMMSS>.csv` in `base_dir` and writes the header row.
    pub async fn create<Tz>(base_dir: impl AsRef<Path>, started_at: DateTime<Tz>) -> Result<Self>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let base = base_dir.as_ref();
        create_dir_all(base)
            .await
            .with_context(|| format!("failed to create log directory {}", base.display()))?;
        let path = base.join(log_file_name(&started_at));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_line(&mut file, CSV_HEADER)
            .await
            .with_context(|| format!("failed to write header to {}", path.display()))?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub async fn append_row(&mut self, sample: &Sample) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| anyhow!("sample log {} is already closed", self.path.display()))?;
        write_line(file, &format_row(sample))
            .await
            .with_context(|| format!("failed to append sample to {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes and releases the file. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .with_context(|| format!("failed to flush {}", self.path.display()))?;
        }
        Ok(())
    }
}

pub fn log_file_name<Tz>(started_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("log_{}.csv", started_at.format("%Y%m%d_%H%M%S"))
}

pub fn format_row(sample: &Sample) -> String {
    format!(
        "{:.2},{},{},{}",
        sample.elapsed_seconds, sample.raw, sample.scaled, sample.duty_cycle_percent
    )
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn names_file_after_start_time() {
        let started = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(log_file_name(&started), "log_20250307_090502.csv");
    }

    #[test]
    fn rows_use_two_decimal_elapsed() {
        let sample = Sample {
            elapsed_seconds: 1.23456,
            raw: 100,
            scaled: 55,
            duty_cycle_percent: 40,
        };
        assert_eq!(format_row(&sample), "1.23,100,55,40");
    }

    #[tokio::test]
    async fn writes_header_then_rows() {
        let tmp = tempdir().expect("temp dir");
        let started = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 2).unwrap();
        let mut sink = Persistence::create(tmp.path(), started)
            .await
            .expect("create sink");
        let sample = Sample {
            elapsed_seconds: 0.5,
            raw: 7,
            scaled: 3,
            duty_cycle_percent: 0,
        };
        sink.append_row(&sample).await.expect("append");

        // Readable before close: every row is flushed as it is written.
        let content = std::fs::read_to_string(sink.path()).expect("read log");
        assert_eq!(content, "Time (s),Raw,Scaled,PWM (%)\n0.50,7,3,0\n");

        sink.close().await.expect("close");
        sink.close().await.expect("second close is a no-op");
        assert!(sink.append_row(&sample).await.is_err());
    }

    #[tokio::test]
    async fn refuses_to_overwrite_an_existing_log() {
        let tmp = tempdir().expect("temp dir");
        let started = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 2).unwrap();
        let _first = Persistence::create(tmp.path(), started)
            .await
            .expect("create sink");
        assert!(Persistence::create(tmp.path(), started).await.is_err());
    }
}

//! Render timing capture for `--cpuprofile`.
//!
//! The output file is created when the session starts and the report is
//! written when the session is dropped, so it is flushed on every exit path
//! that unwinds normally.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[error("could not start profile {path}: {source}")]
pub struct ProfileError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// Timing of one document rendered `passes` times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSample {
    pub source: String,
    pub passes: usize,
    pub total: Duration,
}

impl RenderSample {
    pub fn mean(&self) -> Duration {
        self.total / u32::try_from(self.passes.max(1)).unwrap_or(u32::MAX)
    }
}

pub struct ProfileSession {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    started: Instant,
    samples: Vec<RenderSample>,
}

impl ProfileSession {
    pub fn start(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| ProfileError {
            path: path.clone(),
            source,
        })?;
        Ok(ProfileSession {
            path,
            writer: Some(BufWriter::new(file)),
            started: Instant::now(),
            samples: Vec::new(),
        })
    }

    pub fn record(&mut self, sample: RenderSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[RenderSample] {
        &self.samples
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_report(&mut self) -> io::Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        writeln!(writer, "# markdown-convert render profile")?;
        writeln!(writer, "# elapsed {:?}", self.started.elapsed())?;
        writeln!(writer, "source\tpasses\ttotal\tmean")?;
        for sample in &self.samples {
            writeln!(
                writer,
                "{}\t{}\t{:?}\t{:?}",
                sample.source,
                sample.passes,
                sample.total,
                sample.mean()
            )?;
        }
        writer.flush()
    }
}

impl Drop for ProfileSession {
    fn drop(&mut self) {
        if let Err(err) = self.write_report() {
            warn!(path = %self.path.display(), error = %err, "failed to write profile");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn report_is_written_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.prof");

        let mut session = ProfileSession::start(&path).unwrap();
        session.record(RenderSample {
            source: "docs/a.md".into(),
            passes: 4,
            total: Duration::from_millis(8),
        });
        assert_eq!(session.samples().len(), 1);
        drop(session);

        let report = fs::read_to_string(&path).unwrap();
        assert!(report.starts_with("# markdown-convert render profile\n"));
        assert!(report.contains("docs/a.md\t4\t8ms\t2ms\n"));
    }

    #[test]
    fn mean_handles_zero_and_huge_pass_counts() {
        let sample = |passes| RenderSample {
            source: "a.md".into(),
            passes,
            total: Duration::from_secs(8),
        };
        assert_eq!(sample(0).mean(), Duration::from_secs(8));
        assert_eq!(sample(4).mean(), Duration::from_secs(2));
        let huge = usize::try_from(u64::from(u32::MAX) + 1).unwrap_or(usize::MAX);
        assert!(sample(huge).mean() < Duration::from_millis(1));
    }

    #[test]
    fn session_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.prof");
        let session = ProfileSession::start(&path).unwrap();
        assert_eq!(session.path(), path.as_path());
    }

    #[test]
    fn start_fails_for_unwritable_path() {
        let dir = tempdir().unwrap();
        let err = ProfileSession::start(dir.path().join("missing/render.prof")).err();
        assert!(err.is_some());
    }
}

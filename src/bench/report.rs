//! Human-readable progress and result lines

use super::{PayloadSize, SizeSummary, TrialResult};
use crate::cos::{ResponseMeta, StorageError};
use std::io::{self, Write};

/// Writes benchmark progress lines to any [`Write`] sink (stdout in the binary)
pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the report and return the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, region: &str, bucket: &str) -> io::Result<()> {
        writeln!(self.out, "Region:{}, Bucket:{}", region, bucket)
    }

    pub fn size_header(&mut self, size: PayloadSize) -> io::Result<()> {
        writeln!(
            self.out,
            "============test upload {} file===============",
            size.tag()
        )
    }

    pub fn trial_success(&mut self, trial: &TrialResult, meta: &ResponseMeta) -> io::Result<()> {
        writeln!(
            self.out,
            "succeed to upload {}, requestId: {}, httpCode: {}, consumeTime: {}ms, speed: {:.2} MB/s",
            trial.key,
            meta.request_id.as_deref().unwrap_or(""),
            meta.status_text(),
            trial.elapsed_ms,
            trial.speed()
        )
    }

    pub fn upload_failed(&mut self, key: &str, error: &StorageError) -> io::Result<()> {
        writeln!(self.out, "upload failed {}", key)?;
        self.error_status(error)
    }

    pub fn delete_failed(&mut self, key: &str, error: &StorageError) -> io::Result<()> {
        writeln!(self.out, "failed to delete {}", key)?;
        self.error_status(error)
    }

    pub fn gave_up(&mut self, size: PayloadSize, attempts: u32) -> io::Result<()> {
        writeln!(
            self.out,
            "giving up on {} after {} failed attempts",
            size.tag(),
            attempts
        )
    }

    pub fn size_summary(&mut self, summary: &SizeSummary) -> io::Result<()> {
        writeln!(self.out)?;
        match summary.average_speed {
            Some(speed) => writeln!(self.out, "average speed {:.2} MB/s", speed),
            None => writeln!(
                self.out,
                "no successful trials for {}",
                summary.size.tag()
            ),
        }
    }

    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text.trim_end())
    }

    fn error_status(&mut self, error: &StorageError) -> io::Result<()> {
        match error {
            StorageError::NotFound { .. } => writeln!(self.out, "WARN: Resource is not existed"),
            StorageError::Service(e) => {
                writeln!(self.out, "ERROR: Code: {}", e.code)?;
                writeln!(self.out, "ERROR: Message: {}", e.message)?;
                writeln!(self.out, "ERROR: Resource: {}", e.resource)?;
                writeln!(self.out, "ERROR: RequestId: {}", e.request_id)
            }
            StorageError::Transport(message) => writeln!(self.out, "ERROR: {}", message),
        }
    }
}

//! Download progress reporting.
//!
//! Two modes: one mark per whole unit transferred when the total is unknown
//! (or percent mode is off), and one mark per 5 % boundary otherwise.

use std::io::{self, Read};

use crate::info_log;

/// Default reporting granularity in unit mode.
pub const DEFAULT_UNIT: u64 = 1024 * 1024;

const PERCENT_STEP: u64 = 5;

/// Receives byte counts as a download advances.
pub trait ProgressSink {
    /// `transferred` is cumulative; `total` is the announced length, if any.
    fn report(&mut self, transferred: u64, total: Option<u64>);
}

/// One emitted progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMark {
    Units { units: u64 },
    Percent { percent: u64 },
}

#[derive(Debug)]
pub struct DownloadProgress {
    label: String,
    unit_size: u64,
    unit_name: &'static str,
    use_percent_mode: bool,
    bytes_transferred: u64,
    total_bytes: Option<u64>,
    last_units: u64,
    last_percent: u64,
    marks: Vec<ProgressMark>,
}

impl DownloadProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit_size: DEFAULT_UNIT,
            unit_name: "MiB",
            use_percent_mode: true,
            bytes_transferred: 0,
            total_bytes: None,
            last_units: 0,
            last_percent: 0,
            marks: Vec::new(),
        }
    }

    /// Report in units of `size` bytes, labelled `name`. A zero size is bumped to 1.
    pub fn with_unit(mut self, size: u64, name: &'static str) -> Self {
        self.unit_size = size.max(1);
        self.unit_name = name;
        self
    }

    pub fn with_percent_mode(mut self, enabled: bool) -> Self {
        self.use_percent_mode = enabled;
        self
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Marks emitted so far, oldest first.
    pub fn marks(&self) -> &[ProgressMark] {
        &self.marks
    }

    fn emit(&mut self, mark: ProgressMark) {
        match mark {
            ProgressMark::Units { units } => {
                info_log!("{}: {} {} downloaded", self.label, units, self.unit_name)
            }
            ProgressMark::Percent { percent } => {
                info_log!("{}: {}% downloaded", self.label, percent)
            }
        }
        self.marks.push(mark);
    }
}

impl ProgressSink for DownloadProgress {
    fn report(&mut self, transferred: u64, total: Option<u64>) {
        self.bytes_transferred = transferred;
        self.total_bytes = total;

        match total {
            Some(total) if total > 0 && self.use_percent_mode => {
                let percent = (u128::from(transferred.min(total)) * 100 / u128::from(total)) as u64;
                let boundary = percent / PERCENT_STEP * PERCENT_STEP;
                while self.last_percent + PERCENT_STEP <= boundary {
                    self.last_percent += PERCENT_STEP;
                    let percent = self.last_percent;
                    self.emit(ProgressMark::Percent { percent });
                }
            }
            _ => {
                let units = transferred / self.unit_size;
                while self.last_units < units {
                    self.last_units += 1;
                    let units = self.last_units;
                    self.emit(ProgressMark::Units { units });
                }
            }
        }
    }
}

/// Reader adapter feeding a [`ProgressSink`] as bytes are read through it.
pub struct ProgressReader<'a, R> {
    inner: R,
    sink: &'a mut dyn ProgressSink,
    transferred: u64,
    total: Option<u64>,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    pub fn new(inner: R, total: Option<u64>, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            inner,
            sink,
            transferred: 0,
            total,
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.transferred += n as u64;
            self.sink.report(self.transferred, self.total);
        }
        Ok(n)
    }
}

//! Mono WAV input.
//!
//! Only the header is read on open so both inputs can be checked and the
//! transform size decided before any samples are loaded.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use rustfft::num_complex::Complex32;

/// An opened mono WAV file whose samples have not been read yet.
pub struct WavInput {
    path: PathBuf,
    reader: WavReader<BufReader<File>>,
}

impl WavInput {
    /// Open `path` and check it is a non-empty mono file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = WavReader::open(&path)
            .with_context(|| format!("cannot read WAV file {}", path.display()))?;

        let spec = reader.spec();
        if spec.channels != 1 {
            bail!(
                "{} has {} channels, only mono input is supported",
                path.display(),
                spec.channels
            );
        }
        if reader.duration() == 0 {
            bail!("{} contains no samples", path.display());
        }

        Ok(Self { path, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.reader.duration() as usize
    }

    /// Read every sample into a complex buffer zero-padded to `len`.
    ///
    /// Integer samples keep their raw magnitude; the correlation score is
    /// scale invariant.
    pub fn read_padded(self, len: usize) -> Result<Vec<Complex32>> {
        let count = self.sample_count();
        if len < count {
            bail!(
                "buffer of {} samples cannot hold {} ({} samples)",
                len,
                self.path.display(),
                count
            );
        }

        let mut buffer = Vec::with_capacity(len);
        let path = self.path;
        let mut reader = self.reader;

        match reader.spec().sample_format {
            SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    let sample = sample
                        .with_context(|| format!("corrupt sample in {}", path.display()))?;
                    buffer.push(Complex32::new(sample, 0.0));
                }
            }
            SampleFormat::Int => {
                for sample in reader.samples::<i32>() {
                    let sample = sample
                        .with_context(|| format!("corrupt sample in {}", path.display()))?;
                    buffer.push(Complex32::new(sample as f32, 0.0));
                }
            }
        }

        buffer.resize(len, Complex32::new(0.0, 0.0));
        Ok(buffer)
    }
}

/// Open both inputs and require a shared sample rate.
pub fn open_pair(haystack: &Path, needle: &Path) -> Result<(WavInput, WavInput)> {
    let haystack = WavInput::open(haystack)?;
    let needle = WavInput::open(needle)?;

    if haystack.sample_rate() != needle.sample_rate() {
        bail!(
            "sample rates differ: {} is {} Hz, {} is {} Hz",
            haystack.path().display(),
            haystack.sample_rate(),
            needle.path().display(),
            needle.sample_rate()
        );
    }

    Ok((haystack, needle))
}

//! FFT cross-correlation and the start-locating heuristic.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

/// Transform size for a haystack of `haystack_len` and a needle of
/// `needle_len` samples: the next power of two that holds the full
/// correlation.
pub fn padded_len(haystack_len: usize, needle_len: usize) -> usize {
    (haystack_len + needle_len).saturating_sub(1).max(1).next_power_of_two()
}

/// Number of meaningful correlation samples.
pub fn correlation_len(haystack_len: usize, needle_len: usize) -> usize {
    (haystack_len + needle_len).saturating_sub(1)
}

/// In-place forward transform.
pub fn forward(buffer: &mut [Complex32]) {
    FftPlanner::<f32>::new()
        .plan_fft_forward(buffer.len())
        .process(buffer);
}

/// In-place inverse transform (unnormalized).
pub fn inverse(buffer: &mut [Complex32]) {
    FftPlanner::<f32>::new()
        .plan_fft_inverse(buffer.len())
        .process(buffer);
}

/// Reverse the first `needle_len` samples of a padded needle buffer so the
/// product of spectra becomes a correlation rather than a convolution.
pub fn reverse_needle(buffer: &mut [Complex32], needle_len: usize) {
    let end = needle_len.min(buffer.len());
    buffer[..end].reverse();
}

/// Multiply two spectra, invert, and keep the real part of the first
/// `len` samples.
pub fn correlate_spectra(
    mut haystack: Vec<Complex32>,
    needle: &[Complex32],
    len: usize,
) -> Vec<f32> {
    let n = haystack.len() as f32;
    for (h, k) in haystack.iter_mut().zip(needle) {
        *h = *h * *k / n;
    }

    inverse(&mut haystack);

    haystack.truncate(len);
    haystack.into_iter().map(|c| c.re).collect()
}

/// Write a spectrum to an anonymous temporary file.
///
/// The file is removed by the OS once the returned handle is dropped.
pub fn spill(spectrum: Vec<Complex32>) -> io::Result<File> {
    let mut out = BufWriter::new(tempfile::tempfile()?);

    out.write_all(&(spectrum.len() as u64).to_le_bytes())?;
    for value in spectrum {
        out.write_all(&value.re.to_le_bytes())?;
        out.write_all(&value.im.to_le_bytes())?;
    }

    let mut file = out.into_inner().map_err(|e| e.into_error())?;
    file.rewind()?;
    Ok(file)
}

/// Read back a spectrum written by [`spill`].
pub fn restore(file: File) -> io::Result<Vec<Complex32>> {
    let mut input = BufReader::new(file);

    let mut len_bytes = [0u8; 8];
    input.read_exact(&mut len_bytes)?;
    let len = usize::try_from(u64::from_le_bytes(len_bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut spectrum = Vec::with_capacity(len);
    let mut word = [0u8; 4];
    for _ in 0..len {
        input.read_exact(&mut word)?;
        let re = f32::from_le_bytes(word);
        input.read_exact(&mut word)?;
        let im = f32::from_le_bytes(word);
        spectrum.push(Complex32::new(re, im));
    }

    Ok(spectrum)
}

/// Where the needle starts in the haystack, and how sure we are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub start_sample: usize,
    pub score: f64,
}

impl Located {
    /// No usable position.
    pub const NONE: Located = Located {
        start_sample: 0,
        score: 0.0,
    };
}

/// Pick the needle start from a correlation.
///
/// The global minimum is taken as the anchor and the strongest value within
/// the next tenth of a second as the peak. The score is the z-score of the
/// global maximum. Starts outside the haystack yield [`Located::NONE`].
pub fn locate_start(
    correlation: &[f32],
    needle_len: usize,
    haystack_len: usize,
    sample_rate: u32,
) -> Located {
    let Some((min_idx, _)) = correlation
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
    else {
        return Located::NONE;
    };

    let window = (sample_rate as usize / 10).max(1);
    let window_end = (min_idx + window).min(correlation.len());
    let peak_offset = correlation[min_idx..window_end]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let start = (min_idx + peak_offset) as i64 - needle_len as i64 + 1;
    if start < 0 || start as usize >= haystack_len {
        return Located::NONE;
    }

    Located {
        start_sample: start as usize,
        score: peak_z_score(correlation),
    }
}

/// `(max - mean) / stddev` over the correlation, or 0 when it is flat.
pub fn peak_z_score(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let count = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / count;
    let stddev = variance.sqrt();

    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;

    if stddev == 0.0 || !stddev.is_finite() {
        return 0.0;
    }
    (max - mean) / stddev
}

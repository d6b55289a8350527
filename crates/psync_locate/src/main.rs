//! locate_audio - find where one recording plays inside another
//!
//! Receives two mono WAV files, the haystack and the needle, and prints
//! where the needle starts in the haystack as JSON on stdout:
//!
//! ```text
//! {"offset":12.5,"score":17.3,"needle_duration":4.2}
//! ```
//!
//! The haystack spectrum is kept in a temporary file while the needle
//! spectrum is computed, so only one full spectrum is in memory at a time.
//! Two three-minute 44.1 kHz inputs stay well under 512 MiB.

mod correlate;
mod wav;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::correlate::{
    correlate_spectra, correlation_len, forward, locate_start, padded_len, restore,
    reverse_needle, spill,
};

/// Printed on stdout.
#[derive(Debug, Serialize)]
struct Report {
    /// Seconds from the haystack start to the needle start.
    offset: f64,
    score: f64,
    /// Needle length in seconds.
    needle_duration: f64,
}

fn main() -> ExitCode {
    // stdout carries the report; diagnostics go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("locate_audio: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let (haystack, needle) = parse_args(std::env::args_os().skip(1).map(PathBuf::from))?;
    let report = locate(&haystack, &needle)?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = PathBuf>) -> Result<(PathBuf, PathBuf)> {
    match (args.next(), args.next(), args.next()) {
        (Some(haystack), Some(needle), None) => Ok((haystack, needle)),
        _ => bail!("usage: locate_audio <haystack.wav> <needle.wav>"),
    }
}

fn locate(haystack_path: &Path, needle_path: &Path) -> Result<Report> {
    let (haystack, needle) = wav::open_pair(haystack_path, needle_path)?;

    let sample_rate = haystack.sample_rate();
    let haystack_len = haystack.sample_count();
    let needle_len = needle.sample_count();
    let size = padded_len(haystack_len, needle_len);

    tracing::debug!(
        "haystack {} samples, needle {} samples, transform size {}",
        haystack_len,
        needle_len,
        size
    );

    let mut haystack_spectrum = haystack.read_padded(size)?;
    forward(&mut haystack_spectrum);
    let spilled = spill(haystack_spectrum).context("cannot spill haystack spectrum")?;

    let mut needle_spectrum = needle.read_padded(size)?;
    reverse_needle(&mut needle_spectrum, needle_len);
    forward(&mut needle_spectrum);

    let haystack_spectrum = restore(spilled).context("cannot restore haystack spectrum")?;
    let correlation = correlate_spectra(
        haystack_spectrum,
        &needle_spectrum,
        correlation_len(haystack_len, needle_len),
    );
    drop(needle_spectrum);

    let located = locate_start(&correlation, needle_len, haystack_len, sample_rate);
    tracing::debug!(
        "start sample {}, score {:.3}",
        located.start_sample,
        located.score
    );

    let rate = sample_rate as f64;
    Ok(Report {
        offset: located.start_sample as f64 / rate,
        score: located.score,
        needle_duration: needle_len as f64 / rate,
    })
}

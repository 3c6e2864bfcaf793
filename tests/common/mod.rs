use std::f32::consts::PI;
use std::time::Duration;

use spectral_resynth::{SpectralEngine, FFT_SIZE};

pub const FS: f64 = 44100.0;

/// Frequency of FFT bin `k` at the test sampling rate.
pub fn bin_freq(bin: usize) -> f64 {
    bin as f64 * FS / FFT_SIZE as f64
}

/// Sinusoid locked to FFT bin `k`: period `FFT_SIZE / k` samples, so the
/// analysis ring always holds a coherent copy regardless of where the
/// cursor sits.
pub fn gen_bin_sine(bin: usize, amp: f32, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin())
        .collect()
}

pub fn gen_two_tone(bin_a: usize, amp_a: f32, bin_b: usize, amp_b: f32, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / FFT_SIZE as f32;
            amp_a * (phase * bin_a as f32).sin() + amp_b * (phase * bin_b as f32).sin()
        })
        .collect()
}

pub fn windowed_rms(signal: &[f32], start: usize, len: usize) -> f64 {
    if signal.is_empty() || len == 0 {
        return 0.0;
    }
    let start = start.min(signal.len());
    let end = (start + len).min(signal.len());
    if end <= start {
        return 0.0;
    }
    let sum_sq: f64 = signal[start..end]
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / (end - start) as f64).sqrt()
}

/// Goertzel-style single-bin energy probe.
pub fn energy_at_freq(signal: &[f32], freq_hz: f64) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz * i as f64 / FS;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}

/// Feeds `input` through the engine in host-sized chunks and returns the
/// in-place-processed output.
pub fn drive(engine: &mut SpectralEngine, input: &[f32], chunk_size: usize) -> Vec<f32> {
    let mut output = input.to_vec();
    for chunk in output.chunks_mut(chunk_size.max(1)) {
        engine.process_chunk(chunk);
    }
    output
}

/// Feeds `input`, then waits for the analysis and retune workers to finish
/// the resulting frame.
pub fn drive_and_settle(engine: &mut SpectralEngine, input: &[f32], chunk_size: usize) -> Vec<f32> {
    let output = drive(engine, input, chunk_size);
    assert!(
        engine.settle(Duration::from_secs(2)),
        "analysis workers did not settle"
    );
    output
}

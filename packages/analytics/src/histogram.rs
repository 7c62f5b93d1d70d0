//! Four-bin histograms with readable bin edges.
//!
//! The raw width `(max - min) / 4` is rounded to the nearest multiple of
//! its power of ten (437 becomes 400, 1250 becomes 1000) so bin labels
//! stay round. Values past the last edge are clamped into the last bin,
//! so every finite input value is counted exactly once.

use epi_map_analytics_models::{Histogram, HistogramBin};

/// Number of bins in every histogram.
pub const HISTOGRAM_BINS: usize = 4;

/// Builds a histogram of the finite values in `values`.
///
/// Returns a histogram with no bins when there are no finite values.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn histogram(values: &[f64]) -> Histogram {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let Some(min) = finite.iter().copied().reduce(f64::min) else {
        return Histogram::default();
    };
    let max = finite.iter().copied().fold(min, f64::max);

    let start = min.floor();
    let width = nice_width((max - min) / HISTOGRAM_BINS as f64);

    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| {
            let lower = (i as f64).mul_add(width, start);
            HistogramBin {
                lower,
                upper: lower + width,
                label: bin_label(lower, width),
                count: 0,
            }
        })
        .collect();

    let mut hist = Histogram { start, width, bins: Vec::new() };
    for value in &finite {
        if let Some(idx) = bin_index(&hist, *value) {
            bins[idx].count += 1;
        }
    }
    hist.bins = bins;

    hist
}

/// Index of the bin `value` falls into.
///
/// Values below the first edge land in bin 0 and values past the last
/// edge land in the last bin. `None` for a non-finite value or a
/// histogram without bins.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bin_index(hist: &Histogram, value: f64) -> Option<usize> {
    if !value.is_finite() || hist.width <= 0.0 {
        return None;
    }
    let last = HISTOGRAM_BINS.checked_sub(1)?;

    let position = ((value - hist.start) / hist.width).floor();
    Some(if position <= 0.0 {
        0
    } else {
        (position as usize).min(last)
    })
}

/// Rounds a raw bin width to the nearest multiple of its power of ten.
///
/// A non-positive or non-finite width becomes `1.0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn nice_width(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }

    let mut exponent = raw.log10().floor() as i32;
    // log10 can land one ulp short of an exact power of ten.
    if 10f64.powi(exponent + 1) <= raw {
        exponent += 1;
    } else if 10f64.powi(exponent) > raw {
        exponent -= 1;
    }
    let magnitude = 10f64.powi(exponent);

    let width = (raw / magnitude).round() * magnitude;
    if width > 0.0 { width } else { magnitude }
}

fn bin_label(lower: f64, width: f64) -> String {
    if width >= 1.0 {
        format!("{lower:.0}–{:.0}", lower + width - 1.0)
    } else {
        format!("{lower:.2}–{:.2}", lower + width)
    }
}

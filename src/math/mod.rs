// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.


use hifitime::Epoch;
use marlu::c32;

/// The amplitude of a visibility, promoted to `f64` before any arithmetic.
#[inline]
pub(crate) fn amplitude(v: c32) -> f64 {
    amplitude_squared(v).sqrt()
}

/// The squared amplitude of a visibility. Accumulating these in `f64` avoids
/// the precision loss of `norm_sqr` on single-precision data.
#[inline]
pub(crate) fn amplitude_squared(v: c32) -> f64 {
    let re = f64::from(v.re);
    let im = f64::from(v.im);
    re * re + im * im
}

/// The Rayleigh cumulative distribution function with the given scale
/// parameter. Zero for non-positive arguments.
///
/// `exp_m1` keeps the small-x tail accurate.
#[inline]
pub(crate) fn rayleigh_cdf(x: f64, scale: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    -f64::exp_m1(-(x * x) / (2.0 * scale * scale))
}

/// The timestamp halfway between two timestamps.
#[inline]
pub(crate) fn epoch_midpoint(a: Epoch, b: Epoch) -> Epoch {
    a + (b - a) / 2
}

/// A total-ordering key for a timestamp. Two timestamps compare equal iff
/// their GPS-seconds representations are bit-identical; usable in ordered
/// sets and maps where `Epoch` itself can't be.
#[inline]
pub(crate) fn time_key(e: Epoch) -> u64 {
    e.to_gpst_seconds().to_bits()
}

/// Type 2 quantile (inverse empirical CDF with averaging, Hyndman & Fan
/// 1996) of an ascendingly-sorted, non-empty slice.
pub(crate) fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = n as f64 * p + 0.5;
    let floor_index = (h.floor() as usize).saturating_sub(1).min(n - 1);
    let ceil_index = (h.ceil() as usize).saturating_sub(1).min(n - 1);
    0.5 * (sorted[floor_index] + sorted[ceil_index])
}

/// Equal-width histogram bin edges for an ascendingly-sorted, non-empty
/// sample. The bin width is the smaller of the Freedman-Diaconis width
/// (2 IQR n^(-1/3)) and the Sturges width (range / (log2(n) + 1)), with
/// Sturges alone when the IQR is zero. The edges span [min, max] in
/// `ceil(range / width)` equal bins.
pub(crate) fn auto_bin_edges(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    if n == 1 || max == min {
        // A zero-width range gets padded by half a unit either side.
        return vec![min - 0.5, max + 0.5];
    }

    let range = max - min;
    let sturges = range / ((n as f64).log2() + 1.0);
    let iqr = quantile(sorted, 0.75) - quantile(sorted, 0.25);
    let fd = 2.0 * iqr / (n as f64).cbrt();
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

    let num_bins = ((range / width).ceil() as usize).max(1);
    (0..=num_bins)
        .map(|i| min + range * i as f64 / num_bins as f64)
        .collect()
}

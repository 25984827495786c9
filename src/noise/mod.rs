// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Per-channel Rayleigh noise modelling of sky-subtracted residuals.

The real and imaginary parts of a noise-dominated residual are zero-mean
Gaussian, so its amplitude is Rayleigh distributed. Each fine channel gets
its own maximum-likelihood scale; a cross-channel mixture then gives the
probability of an unflagged amplitude landing in each bin of a histogram,
which is what empirical bin counts are tested against.
 */

mod error;

pub use error::NoiseError;

use marlu::c32;
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::flagging::{apply_flags, FlagChoice, MissingCustom};
use crate::math::{amplitude, amplitude_squared, auto_bin_edges, rayleigh_cdf};
use crate::vis::VisData;

/// Bin edges for [`mixture_prob`].
pub enum Bins<'a> {
    /// Derive edges from the unflagged amplitudes: equal-width bins spanning
    /// the sample range, with the width the smaller of the Freedman-Diaconis
    /// and Sturges widths.
    Auto,

    /// Explicit ascending edges; `edges[k]..edges[k + 1]` is bin `k`.
    Edges(&'a [f64]),
}

/// The per-channel maximum-likelihood Rayleigh scale of the unflagged
/// amplitudes, pooled over rows, spectral windows and polarizations.
///
/// For channel c this is `sqrt(0.5 * mean(|amplitude|^2))`. A channel with
/// no unflagged samples gets 0.0 — a "no data" sentinel, not a valid scale;
/// consumers skip such channels. The result is cached on the dataset until
/// the mask next changes.
pub fn estimate_mle(vis: &mut VisData) -> ArrayView1<f64> {
    if vis.mle.is_none() {
        vis.mle = Some(mle_over_channels(&vis.data, &vis.mask));
    }
    vis.mle.as_ref().unwrap().view()
}

fn mle_over_channels(data: &Array4<c32>, mask: &Array4<bool>) -> Array1<f64> {
    let num_chans = data.dim().2;
    // Channels are independent; estimate them in parallel.
    let scales: Vec<f64> = (0..num_chans)
        .into_par_iter()
        .map(|chan| {
            let chan_data = data.index_axis(Axis(2), chan);
            let chan_mask = mask.index_axis(Axis(2), chan);
            let mut sum = 0.0;
            let mut count = 0_usize;
            for (&v, &excluded) in chan_data.iter().zip(chan_mask.iter()) {
                if !excluded {
                    sum += amplitude_squared(v);
                    count += 1;
                }
            }
            if count == 0 {
                0.0
            } else {
                (0.5 * sum / count as f64).sqrt()
            }
        })
        .collect();
    Array1::from(scales)
}

fn unflagged_counts(mask: &Array4<bool>) -> Vec<usize> {
    let num_chans = mask.dim().2;
    (0..num_chans)
        .map(|chan| {
            mask.index_axis(Axis(2), chan)
                .iter()
                .filter(|&&excluded| !excluded)
                .count()
        })
        .collect()
}

/// The probability of an unflagged residual amplitude landing in each bin,
/// under the per-channel Rayleigh models combined in proportion to each
/// channel's share of the unflagged samples.
///
/// If no flagging policy has been applied yet, the unflagged policy is
/// applied first so the statistics have a defined mask. Channels carrying
/// the no-data sentinel contribute nothing, so the probabilities sum to at
/// most 1: exactly 1 (to float tolerance) when the edges span (0, ∞-ish)
/// and no channel is fully flagged.
pub fn mixture_prob(vis: &mut VisData, bins: Bins) -> Result<Array1<f64>, NoiseError> {
    if vis.flag_choice().is_none() {
        apply_flags(vis, FlagChoice::Unflagged, MissingCustom::Unflag)?;
    }
    let mle = estimate_mle(vis).to_owned();

    let edges: Vec<f64> = match bins {
        Bins::Edges(edges) => {
            if edges.len() < 2 {
                return Err(NoiseError::TooFewBinEdges {
                    num_edges: edges.len(),
                });
            }
            edges.to_vec()
        }
        Bins::Auto => {
            let mut amps: Vec<f64> = vis
                .data
                .iter()
                .zip(vis.mask.iter())
                .filter(|&(_, &excluded)| !excluded)
                .map(|(&v, _)| amplitude(v))
                .collect();
            if amps.is_empty() {
                return Err(NoiseError::NoUnflaggedData);
            }
            amps.sort_unstable_by(f64::total_cmp);
            auto_bin_edges(&amps)
        }
    };

    let counts = unflagged_counts(&vis.mask);
    let total: usize = counts.iter().sum();

    let mut prob = Array1::zeros(edges.len() - 1);
    if total == 0 {
        // Every channel is fully flagged; the model has no mass anywhere.
        return Ok(prob);
    }

    for (&scale, &count) in mle.iter().zip(counts.iter()) {
        if scale <= 0.0 {
            continue;
        }
        let share = count as f64 / total as f64;
        let cdf: Vec<f64> = edges.iter().map(|&e| rayleigh_cdf(e, scale)).collect();
        for (k, p) in prob.iter_mut().enumerate() {
            *p += share * (cdf[k + 1] - cdf[k]);
        }
    }

    Ok(prob)
}

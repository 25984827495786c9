// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Sky subtraction: differencing consecutive visibilities in time.

The sky varies slowly compared to one integration, so the difference of two
consecutive visibilities on a baseline is (to good approximation) free of
sky signal and dominated by noise. Each baseline is differenced
independently, so baselines need not share a common time grid.
 */

mod error;

pub use error::SubtractError;

use marlu::UVW;
use ndarray::prelude::*;

use crate::math::epoch_midpoint;
use crate::vis::VisData;

/// Consume a dataset and return its per-baseline consecutive time
/// difference.
///
/// Within each baseline's row block, output row `i` is input row `i + 1`
/// minus input row `i`. The working mask and the stored flags are both the
/// OR of the two contributing rows (a flagged contributor taints the
/// difference), the timestamp and UVW are midpoints, the sample counts are
/// averaged (a difference is one derived observable, not an accumulation)
/// and the integration times are summed (the difference spans both
/// integrations). Baseline ids, antenna pairs and the spectral axes are
/// unchanged. Each baseline therefore loses exactly one time.
pub fn difference(mut vis: VisData) -> Result<VisData, SubtractError> {
    vis.reorder_to_baseline_major();
    let blocks = vis.baseline_blocks();

    // All baselines are checked before anything is built, so a failure
    // can't leave a half-differenced dataset behind.
    for (baseline, range) in &blocks {
        if range.len() < 2 {
            return Err(SubtractError::InsufficientTimes {
                baseline: *baseline,
                num_times: range.len(),
            });
        }
    }

    let (num_rows, num_spws, num_chans, num_pols) = vis.data.dim();
    let out_rows = num_rows - blocks.len();
    let out_dim = (out_rows, num_spws, num_chans, num_pols);

    let mut data = Array4::zeros(out_dim);
    let mut mask = Array4::from_elem(out_dim, false);
    let mut flags = Array4::from_elem(out_dim, false);
    let mut nsamples = Array4::zeros(out_dim);
    let mut baselines = Vec::with_capacity(out_rows);
    let mut ant1 = Vec::with_capacity(out_rows);
    let mut ant2 = Vec::with_capacity(out_rows);
    let mut times = Vec::with_capacity(out_rows);
    let mut integration_times = Vec::with_capacity(out_rows);
    let mut uvws = Vec::with_capacity(out_rows);

    let mut out = 0;
    for (baseline, range) in blocks {
        for i in range.start..range.end - 1 {
            let residual =
                &vis.data.slice(s![i + 1, .., .., ..]) - &vis.data.slice(s![i, .., .., ..]);
            data.slice_mut(s![out, .., .., ..]).assign(&residual);

            let or_mask = &vis.mask.slice(s![i, .., .., ..]) | &vis.mask.slice(s![i + 1, .., .., ..]);
            mask.slice_mut(s![out, .., .., ..]).assign(&or_mask);

            let or_flags =
                &vis.flags.slice(s![i, .., .., ..]) | &vis.flags.slice(s![i + 1, .., .., ..]);
            flags.slice_mut(s![out, .., .., ..]).assign(&or_flags);

            let mean_nsamples = (&vis.nsamples.slice(s![i, .., .., ..])
                + &vis.nsamples.slice(s![i + 1, .., .., ..]))
                * 0.5;
            nsamples.slice_mut(s![out, .., .., ..]).assign(&mean_nsamples);

            baselines.push(baseline);
            ant1.push(vis.ant1[i]);
            ant2.push(vis.ant2[i]);
            times.push(epoch_midpoint(vis.times[i], vis.times[i + 1]));
            integration_times.push(vis.integration_times[i] + vis.integration_times[i + 1]);
            let (a, b) = (vis.uvws[i], vis.uvws[i + 1]);
            uvws.push(UVW {
                u: 0.5 * (a.u + b.u),
                v: 0.5 * (a.v + b.v),
                w: 0.5 * (a.w + b.w),
            });

            out += 1;
        }
    }
    debug_assert_eq!(out, out_rows);

    Ok(VisData {
        data,
        mask,
        flags,
        nsamples,
        baselines,
        ant1,
        ant2,
        times,
        integration_times,
        uvws,
        freqs: vis.freqs,
        pols: vis.pols,
        // The OR'd mask still has the provenance of the input's policy, but
        // the cached noise scales describe data that no longer exists.
        flag_choice: vis.flag_choice,
        mle: None,
    })
}

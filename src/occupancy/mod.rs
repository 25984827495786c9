// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Amplitude-band occupancy waterfalls.

Reverse-indexing for residual amplitudes: given a band, count how many
baselines sit inside it at each time, channel and polarization. A band like
(1e3, 1e4) turns "which samples are suspiciously bright?" into a waterfall
that can be eyeballed or thresholded.
 */

mod error;

pub use error::OccupancyError;

use ndarray::prelude::*;

use crate::flagging::{apply_flags, FlagChoice, MissingCustom};
use crate::math::amplitude;
use crate::vis::VisData;

/// Count, over baselines and spectral windows, the unflagged samples whose
/// amplitude lies strictly inside the band, per (time, channel,
/// polarization).
///
/// The band bounds may be given in either order. The dataset must form a
/// regular baseline × time grid — every baseline covering every time — so
/// each count is bounded by `num_baselines * num_spws`. If no flagging
/// policy has been applied yet, the unflagged policy is applied first.
pub fn band_occupancy(
    vis: &mut VisData,
    low: f64,
    high: f64,
) -> Result<Array3<u32>, OccupancyError> {
    let (band_low, band_high) = if low <= high { (low, high) } else { (high, low) };

    vis.reorder_to_baseline_major();

    let num_baselines = vis.num_baselines();
    let num_times = vis.num_times();
    let num_rows = vis.num_rows();
    let blocks = vis.baseline_blocks();
    // A row count that factorises can still hide ragged per-baseline time
    // coverage, so the blocks are checked too.
    if num_rows != num_baselines * num_times
        || blocks.iter().any(|(_, range)| range.len() != num_times)
    {
        return Err(OccupancyError::IrregularGrid {
            num_rows,
            num_baselines,
            num_times,
        });
    }

    if vis.flag_choice().is_none() {
        apply_flags(vis, FlagChoice::Unflagged, MissingCustom::Unflag)?;
    }

    let (_, _, num_chans, num_pols) = vis.data().dim();
    let mut waterfall = Array3::zeros((num_times, num_chans, num_pols));
    for (_, range) in blocks {
        for (time, row) in range.enumerate() {
            let row_data = vis.data.index_axis(Axis(0), row);
            let row_mask = vis.mask.index_axis(Axis(0), row);
            for ((spw, chan, pol), &v) in row_data.indexed_iter() {
                if row_mask[(spw, chan, pol)] {
                    continue;
                }
                let amp = amplitude(v);
                if amp > band_low && amp < band_high {
                    waterfall[(time, chan, pol)] += 1;
                }
            }
        }
    }

    Ok(waterfall)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
The in-memory visibility dataset.

A [`VisData`] owns the complex visibilities and everything indexed alongside
them: the working exclusion mask, the stored flag array destined for
persistence, sample weights and the per-row metadata. Rows are (baseline,
time) pairs; the statistics code in this crate requires rows to be grouped
contiguously by baseline ("baseline-major order"), and every operation that
needs that invariant establishes it itself via
[`VisData::reorder_to_baseline_major`] rather than trusting the caller.
 */

mod error;
mod pol;

pub use error::VisError;
pub use pol::Pol;

use std::collections::BTreeSet;
use std::ops::Range;

use hifitime::{Duration, Epoch};
use itertools::izip;
use log::warn;
use marlu::{c32, UVW};
use ndarray::prelude::*;
use vec1::Vec1;

use crate::flagging::FlagChoiceKind;
use crate::math::time_key;

/// A visibility dataset, either at the loader's native time resolution or
/// after differencing.
///
/// All array members share the shape (row, spectral window, channel,
/// polarization); all vector members have one element per row. The loader
/// collaborator builds one of these with [`VisData::new`], which refuses
/// mismatched shapes.
#[derive(Clone)]
pub struct VisData {
    /// Complex visibilities.
    pub(crate) data: Array4<c32>,

    /// The working mask; `true` excludes a sample from all statistics. This
    /// is rewritten wholesale by [`crate::flagging::apply_flags`] and starts
    /// out all-`false`.
    pub(crate) mask: Array4<bool>,

    /// The stored flag array, as read from (and destined for) persistence.
    /// Distinct from the working mask: flag application copies it onto the
    /// mask on request, and write-back mutates it on a *target* dataset.
    pub(crate) flags: Array4<bool>,

    /// Sample counts/weights. Non-negative.
    pub(crate) nsamples: Array4<f32>,

    /// The baseline id of each row.
    pub(crate) baselines: Vec<u32>,

    /// The first antenna of each row's baseline.
    pub(crate) ant1: Vec<u32>,

    /// The second antenna of each row's baseline.
    pub(crate) ant2: Vec<u32>,

    /// The centroid timestamp of each row.
    pub(crate) times: Vec<Epoch>,

    /// The integration duration of each row.
    pub(crate) integration_times: Vec<Duration>,

    /// The UVW coordinates of each row \[metres\].
    pub(crate) uvws: Vec<UVW>,

    /// The centre frequency of each (spectral window, channel) \[Hz\].
    pub(crate) freqs: Array2<f64>,

    /// The polarizations along the last data axis, in order.
    pub(crate) pols: Vec1<Pol>,

    /// Which flagging policy produced the current mask. `None` until a
    /// policy has been applied; consumers that need a mask treat `None` as
    /// "apply the unflagged policy first".
    pub(crate) flag_choice: Option<FlagChoiceKind>,

    /// Cached per-channel maximum-likelihood Rayleigh scales. Invalidated
    /// whenever the mask changes.
    pub(crate) mle: Option<Array1<f64>>,
}

impl VisData {
    /// Construct a dataset from loader-supplied arrays, validating that
    /// every member agrees with the shape of `data`. The working mask
    /// starts out all-`false` with no policy applied.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: Array4<c32>,
        flags: Array4<bool>,
        nsamples: Array4<f32>,
        baselines: Vec<u32>,
        ant1: Vec<u32>,
        ant2: Vec<u32>,
        times: Vec<Epoch>,
        integration_times: Vec<Duration>,
        uvws: Vec<UVW>,
        freqs: Array2<f64>,
        pols: Vec1<Pol>,
    ) -> Result<VisData, VisError> {
        let dim = data.dim();
        let (num_rows, num_spws, num_chans, num_pols) = dim;

        for (array, got) in [("flags", flags.dim()), ("nsamples", nsamples.dim())] {
            if got != dim {
                return Err(VisError::ShapeMismatch {
                    array,
                    expected: dim,
                    got,
                });
            }
        }
        for (vector, got) in [
            ("baselines", baselines.len()),
            ("ant1", ant1.len()),
            ("ant2", ant2.len()),
            ("times", times.len()),
            ("integration_times", integration_times.len()),
            ("uvws", uvws.len()),
        ] {
            if got != num_rows {
                return Err(VisError::RowCountMismatch {
                    vector,
                    expected: num_rows,
                    got,
                });
            }
        }
        if freqs.dim() != (num_spws, num_chans) {
            return Err(VisError::FreqShapeMismatch {
                expected: (num_spws, num_chans),
                got: freqs.dim(),
            });
        }
        if pols.len() != num_pols {
            return Err(VisError::PolCountMismatch {
                expected: num_pols,
                got: pols.len(),
            });
        }

        let mask = Array4::from_elem(dim, false);
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
            freqs,
            pols,
            flag_choice: None,
            mle: None,
        })
    }

    pub fn data(&self) -> ArrayView4<c32> {
        self.data.view()
    }

    pub fn mask(&self) -> ArrayView4<bool> {
        self.mask.view()
    }

    pub fn flags(&self) -> ArrayView4<bool> {
        self.flags.view()
    }

    pub fn nsamples(&self) -> ArrayView4<f32> {
        self.nsamples.view()
    }

    pub fn baselines(&self) -> &[u32] {
        &self.baselines
    }

    pub fn ant1(&self) -> &[u32] {
        &self.ant1
    }

    pub fn ant2(&self) -> &[u32] {
        &self.ant2
    }

    pub fn times(&self) -> &[Epoch] {
        &self.times
    }

    pub fn integration_times(&self) -> &[Duration] {
        &self.integration_times
    }

    pub fn uvws(&self) -> &[UVW] {
        &self.uvws
    }

    pub fn freqs(&self) -> ArrayView2<f64> {
        self.freqs.view()
    }

    pub fn pols(&self) -> &Vec1<Pol> {
        &self.pols
    }

    /// Which flagging policy produced the current mask, if any has been
    /// applied.
    pub fn flag_choice(&self) -> Option<FlagChoiceKind> {
        self.flag_choice
    }

    /// The cached per-channel maximum-likelihood Rayleigh scales, if
    /// [`crate::noise::estimate_mle`] has run since the mask last changed.
    pub fn mle(&self) -> Option<ArrayView1<f64>> {
        self.mle.as_ref().map(Array1::view)
    }

    pub fn num_rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn num_spws(&self) -> usize {
        self.data.dim().1
    }

    pub fn num_chans(&self) -> usize {
        self.data.dim().2
    }

    pub fn num_pols(&self) -> usize {
        self.data.dim().3
    }

    /// The number of distinct baselines present in the rows.
    pub fn num_baselines(&self) -> usize {
        self.baselines.iter().collect::<BTreeSet<_>>().len()
    }

    /// The number of distinct timestamps present in the rows. Only on a
    /// regular grid does `num_rows == num_baselines * num_times`.
    pub fn num_times(&self) -> usize {
        self.time_set().len()
    }

    /// The distinct timestamps as total-ordering keys, for order-independent
    /// comparison against another time axis.
    pub(crate) fn time_set(&self) -> BTreeSet<u64> {
        self.times.iter().map(|&t| time_key(t)).collect()
    }

    /// Sort rows so that each baseline's rows are contiguous and ascending
    /// in time, permuting every row-indexed member identically. Idempotent;
    /// returns whether a permutation was actually applied (and warns when it
    /// was, since it means the caller's data wasn't in the documented
    /// order).
    pub fn reorder_to_baseline_major(&mut self) -> bool {
        // An exact, total sort key: baseline id, then time as a Duration
        // from a fixed reference.
        let reference = Epoch::from_gpst_seconds(0.0);
        let keys: Vec<(u32, Duration)> = izip!(&self.baselines, &self.times)
            .map(|(&bl, &t)| (bl, t - reference))
            .collect();

        if keys.windows(2).all(|w| w[0] <= w[1]) {
            return false;
        }
        warn!("Reordering rows to baseline-major order");

        let mut perm: Vec<usize> = (0..keys.len()).collect();
        perm.sort_by_key(|&r| keys[r]);

        self.data = self.data.select(Axis(0), &perm);
        self.mask = self.mask.select(Axis(0), &perm);
        self.flags = self.flags.select(Axis(0), &perm);
        self.nsamples = self.nsamples.select(Axis(0), &perm);
        self.baselines = perm.iter().map(|&r| self.baselines[r]).collect();
        self.ant1 = perm.iter().map(|&r| self.ant1[r]).collect();
        self.ant2 = perm.iter().map(|&r| self.ant2[r]).collect();
        self.times = perm.iter().map(|&r| self.times[r]).collect();
        self.integration_times = perm.iter().map(|&r| self.integration_times[r]).collect();
        self.uvws = perm.iter().map(|&r| self.uvws[r]).collect();
        true
    }

    /// The contiguous row block of each baseline, in row order. Only
    /// meaningful on a baseline-major dataset; callers reorder first.
    pub fn baseline_blocks(&self) -> Vec<(u32, Range<usize>)> {
        let mut blocks = vec![];
        let num_rows = self.baselines.len();
        let mut start = 0;
        for row in 1..=num_rows {
            if row == num_rows || self.baselines[row] != self.baselines[start] {
                blocks.push((self.baselines[start], start..row));
                start = row;
            }
        }
        blocks
    }
}

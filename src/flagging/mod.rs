// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Flagging policies and flag propagation.

A dataset's working mask is always rewritten wholesale under one of a
closed set of policies ([`FlagChoice`]); partial edits aren't offered, so
the mask's provenance is always exactly one policy. Flags derived on
differenced data are pushed back out to original-resolution data with
[`propagate_flags`].
 */

mod error;
#[cfg(test)]
mod tests;

pub use error::FlagError;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::str::FromStr;

use hifitime::Epoch;
use log::warn;
use ndarray::prelude::*;

use crate::math::{epoch_midpoint, time_key};
use crate::vis::VisData;

/// A flagging policy together with its inputs. Policies are mutually
/// exclusive; applying one replaces the mask entirely.
pub enum FlagChoice<'a> {
    /// Clear the mask: nothing is excluded.
    Unflagged,

    /// Copy the dataset's stored flag array onto the mask.
    Original,

    /// Broadcast an aggregated noise spectrum's per-(time, channel, pol)
    /// flags across all baselines sharing each flagged time.
    Spectrum(&'a SpectrumFlags),

    /// A caller-supplied mask of the same shape as the data. `None` is
    /// tolerated or rejected according to [`MissingCustom`].
    Custom(Option<ArrayView4<'a, bool>>),
}

/// The payload-free tag of a [`FlagChoice`]. Recorded on the dataset as the
/// provenance of its mask, and returned by [`apply_flags`] as the policy
/// actually applied (which differs from the requested one only on the
/// missing-custom degrade path).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChoiceKind {
    Unflagged,
    Original,
    Spectrum,
    Custom,
}

impl FromStr for FlagChoiceKind {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<FlagChoiceKind, FlagError> {
        match s.to_lowercase().as_str() {
            "none" | "unflagged" => Ok(FlagChoiceKind::Unflagged),
            "original" => Ok(FlagChoiceKind::Original),
            "spectrum" => Ok(FlagChoiceKind::Spectrum),
            "custom" => Ok(FlagChoiceKind::Custom),
            _ => Err(FlagError::UnknownChoice(s.to_string())),
        }
    }
}

impl std::fmt::Display for FlagChoiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FlagChoiceKind::Unflagged => "unflagged",
                FlagChoiceKind::Original => "original",
                FlagChoiceKind::Spectrum => "spectrum",
                FlagChoiceKind::Custom => "custom",
            }
        )
    }
}

/// What to do when [`FlagChoice::Custom`] is selected without any custom
/// flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCustom {
    /// Degrade to [`FlagChoice::Unflagged`] with a warning.
    Unflag,

    /// Refuse with [`FlagError::MissingCustomFlags`].
    Fail,
}

/// The flag mask of an aggregated (baseline-collapsed) noise spectrum: one
/// boolean per (time, channel, polarization). This is the only part of such
/// a spectrum this crate consumes; building one is a collaborator's job.
pub struct SpectrumFlags {
    times: Vec<Epoch>,
    mask: Array3<bool>,
}

impl SpectrumFlags {
    /// `times` must have one entry per time slice of `mask`, and should be
    /// the spectrum's distinct timestamps.
    pub fn new(times: Vec<Epoch>, mask: Array3<bool>) -> Result<SpectrumFlags, FlagError> {
        if times.len() != mask.dim().0 {
            return Err(FlagError::SpectrumTimeCount {
                expected: times.len(),
                got: mask.dim().0,
            });
        }
        Ok(SpectrumFlags { times, mask })
    }

    pub fn times(&self) -> &[Epoch] {
        &self.times
    }

    pub fn mask(&self) -> ArrayView3<bool> {
        self.mask.view()
    }

    pub(crate) fn time_set(&self) -> BTreeSet<u64> {
        self.times.iter().map(|&t| time_key(t)).collect()
    }
}

/// Rewrite a dataset's working mask under the given policy.
///
/// All validation happens before the mask is touched, the new mask never
/// aliases the old one, and the cached noise scales are invalidated. The
/// returned value is the policy actually applied. Idempotent for identical
/// inputs.
pub fn apply_flags(
    vis: &mut VisData,
    choice: FlagChoice,
    missing_custom: MissingCustom,
) -> Result<FlagChoiceKind, FlagError> {
    let dim = vis.data().dim();
    let (_, num_spws, num_chans, num_pols) = dim;

    let (new_mask, kind) = match choice {
        FlagChoice::Unflagged => (
            Array4::from_elem(vis.data().raw_dim(), false),
            FlagChoiceKind::Unflagged,
        ),

        FlagChoice::Original => (vis.flags().to_owned(), FlagChoiceKind::Original),

        FlagChoice::Spectrum(spectrum) => {
            let (_, spectrum_chans, spectrum_pols) = spectrum.mask.dim();
            if (spectrum_chans, spectrum_pols) != (num_chans, num_pols) {
                return Err(FlagError::SpectrumAxisMismatch {
                    expected: (num_chans, num_pols),
                    got: (spectrum_chans, spectrum_pols),
                });
            }
            if spectrum.time_set() != vis.time_set() {
                return Err(FlagError::IncompatibleTimeAxis {
                    details: "the noise spectrum's distinct times do not match the dataset's"
                        .to_string(),
                });
            }

            let mut rows_by_time: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
            for (row, &t) in vis.times().iter().enumerate() {
                rows_by_time.entry(time_key(t)).or_default().push(row);
            }

            let mut mask = Array4::from_elem(vis.data().raw_dim(), false);
            for ((time, chan, pol), &flagged) in spectrum.mask.indexed_iter() {
                if !flagged {
                    continue;
                }
                // The set equality above guarantees this lookup succeeds.
                if let Some(rows) = rows_by_time.get(&time_key(spectrum.times[time])) {
                    for &row in rows {
                        for spw in 0..num_spws {
                            mask[(row, spw, chan, pol)] = true;
                        }
                    }
                }
            }
            (mask, FlagChoiceKind::Spectrum)
        }

        FlagChoice::Custom(Some(custom)) => {
            if custom.dim() != dim {
                return Err(FlagError::ShapeMismatch {
                    expected: dim,
                    got: custom.dim(),
                });
            }
            (custom.to_owned(), FlagChoiceKind::Custom)
        }

        FlagChoice::Custom(None) => match missing_custom {
            MissingCustom::Unflag => {
                warn!("Custom flags were chosen but none were supplied; unflagging instead");
                (
                    Array4::from_elem(vis.data().raw_dim(), false),
                    FlagChoiceKind::Unflagged,
                )
            }
            MissingCustom::Fail => return Err(FlagError::MissingCustomFlags),
        },
    };

    vis.mask = new_mask;
    vis.flag_choice = Some(kind);
    vis.mle = None;
    Ok(kind)
}

/// Expand the working mask of a differenced dataset onto the stored flag
/// array of the original-resolution dataset it was differenced from.
///
/// A differenced row was built from two consecutive original rows, so one
/// masked differenced sample fans out to both contributors. With `combine`
/// the propagation is OR'd onto the target's existing flags; without it the
/// target's flags are replaced. Only the target's flag array is written;
/// the source is not modified beyond reordering.
///
/// Both datasets are reordered to baseline-major order, then every
/// baseline's time axes are checked — the source's times must be exactly
/// the running midpoints of the target's — before any flag is written, so a
/// failure leaves the target untouched.
pub fn propagate_flags(
    source: &mut VisData,
    target: &mut VisData,
    combine: bool,
) -> Result<(), FlagError> {
    source.reorder_to_baseline_major();
    target.reorder_to_baseline_major();

    let source_blocks: BTreeMap<u32, Range<usize>> =
        source.baseline_blocks().into_iter().collect();
    let target_blocks: BTreeMap<u32, Range<usize>> =
        target.baseline_blocks().into_iter().collect();

    if !source_blocks.keys().eq(target_blocks.keys()) {
        return Err(FlagError::IncompatibleTimeAxis {
            details: "source and target do not contain the same baselines".to_string(),
        });
    }

    for (baseline, source_range) in &source_blocks {
        let target_range = &target_blocks[baseline];
        if source_range.len() + 1 != target_range.len() {
            return Err(FlagError::IncompatibleTimeAxis {
                details: format!(
                    "baseline {baseline} has {} differenced times for {} original times",
                    source_range.len(),
                    target_range.len()
                ),
            });
        }
        for i in 0..source_range.len() {
            let midpoint = epoch_midpoint(
                target.times()[target_range.start + i],
                target.times()[target_range.start + i + 1],
            );
            if time_key(midpoint) != time_key(source.times()[source_range.start + i]) {
                return Err(FlagError::IncompatibleTimeAxis {
                    details: format!(
                        "baseline {baseline}: source times are not the running midpoints of the target times"
                    ),
                });
            }
        }
    }

    if !combine {
        target.flags.fill(false);
    }

    for (baseline, source_range) in &source_blocks {
        let target_range = &target_blocks[baseline];
        for i in 0..source_range.len() {
            let source_row = source.mask.slice(s![source_range.start + i, .., .., ..]);
            for target_row in [target_range.start + i, target_range.start + i + 1] {
                let mut target_flags = target.flags.slice_mut(s![target_row, .., .., ..]);
                target_flags.zip_mut_with(&source_row, |f, &m| *f = *f || m);
            }
        }
    }

    Ok(())
}

/// Rewrite zero sample counts to `default`, returning how many were
/// rewritten.
///
/// Serialisers that fold sample counts and flags into one weight lose flag
/// information wherever the count is zero; writer collaborators call this
/// before serialising a flag-propagated dataset.
pub fn default_zero_nsamples(vis: &mut VisData, default: f32) -> usize {
    let mut num_defaulted = 0;
    vis.nsamples.map_inplace(|n| {
        if *n == 0.0 {
            *n = default;
            num_defaulted += 1;
        }
    });
    if num_defaulted > 0 {
        warn!("{num_defaulted} zero sample counts were set to {default} so that new flags survive weight folding");
    }
    num_defaulted
}

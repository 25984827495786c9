// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Sky-subtraction statistics and flagging for radio-interferometric
visibilities.

Raw visibilities are differenced in time per baseline, which removes the
(slowly-varying) sky signal and leaves noise-like residuals. Those residuals
are then characterised: a Rayleigh noise scale is fitted per fine channel by
maximum likelihood, a cross-channel mixture model gives the probability of a
residual amplitude landing in a given bin, and amplitude-band occupancy
waterfalls count how many baselines sit inside a band at each time, channel
and polarization. Flags derived from the differenced data can be expanded
back onto the original-resolution data for writing out.

Reading and writing visibility files is deliberately not handled here; a
loader populates a [`VisData`](vis::VisData) and a writer serialises its
flag array after [`propagate_flags`](flagging::propagate_flags) has run.
 */

pub mod error;
pub mod flagging;
pub(crate) mod math;
pub mod noise;
pub mod occupancy;
pub mod subtract;
pub mod vis;


// Re-exports.
pub use error::SkySubtractError;
pub use flagging::{
    apply_flags, propagate_flags, FlagChoice, FlagChoiceKind, MissingCustom, SpectrumFlags,
};
pub use noise::{estimate_mle, mixture_prob, Bins};
pub use occupancy::band_occupancy;
pub use subtract::difference;
pub use vis::{Pol, VisData};

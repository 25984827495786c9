// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all sky_subtract-related errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkySubtractError {
    #[error("{0}")]
    Vis(#[from] crate::vis::VisError),

    #[error("{0}")]
    Subtract(#[from] crate::subtract::SubtractError),

    #[error("{0}")]
    Flag(#[from] crate::flagging::FlagError),

    #[error("{0}")]
    Noise(#[from] crate::noise::NoiseError),

    #[error("{0}")]
    Occupancy(#[from] crate::occupancy::OccupancyError),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlagError {
    #[error("The custom mask has shape {got:?}, but the visibility data has shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize, usize),
        got: (usize, usize, usize, usize),
    },

    #[error("The spectrum mask covers (channels, polarizations) {got:?}, but the dataset has {expected:?}")]
    SpectrumAxisMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("The spectrum mask has {got} time slices for {expected} timestamps")]
    SpectrumTimeCount { expected: usize, got: usize },

    #[error("Time axes cannot be aligned: {details}")]
    IncompatibleTimeAxis { details: String },

    #[error("'{0}' is not a recognised flag choice; expected none, original, spectrum or custom")]
    UnknownChoice(String),

    #[error("Custom flags were chosen, but none were supplied")]
    MissingCustomFlags,
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisError {
    #[error("The {array} array has shape {got:?}, but the visibility data has shape {expected:?}")]
    ShapeMismatch {
        array: &'static str,
        expected: (usize, usize, usize, usize),
        got: (usize, usize, usize, usize),
    },

    #[error("The {vector} vector has {got} elements for {expected} baseline-time rows")]
    RowCountMismatch {
        vector: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("The frequency array has shape {got:?}, but the data implies {expected:?} (spectral windows, channels)")]
    FreqShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("{got} polarization codes were supplied for a polarization axis of size {expected}")]
    PolCountMismatch { expected: usize, got: usize },
}

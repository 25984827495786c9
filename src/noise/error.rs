// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoiseError {
    #[error("Cannot derive bin edges automatically: every sample is flagged")]
    NoUnflaggedData,

    #[error("{num_edges} bin edge(s) cannot define any bins; at least 2 are needed")]
    TooFewBinEdges { num_edges: usize },

    #[error("{0}")]
    Flag(#[from] crate::flagging::FlagError),
}

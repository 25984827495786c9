// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OccupancyError {
    #[error("Rows do not form a regular baselines × times grid ({num_rows} rows, {num_baselines} baselines, {num_times} distinct times)")]
    IrregularGrid {
        num_rows: usize,
        num_baselines: usize,
        num_times: usize,
    },

    #[error("{0}")]
    Flag(#[from] crate::flagging::FlagError),
}

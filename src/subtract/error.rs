// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtractError {
    #[error("Baseline {baseline} has {num_times} time sample(s); differencing needs at least 2 per baseline")]
    InsufficientTimes { baseline: u32, num_times: usize },
}

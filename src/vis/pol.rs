// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polarization codes.

/// A polarization, following the AIPS integer convention: positive codes are
/// Stokes parameters, -1 to -4 are circular products, -5 to -8 are linear
/// products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pol {
    I,
    Q,
    U,
    V,
    RR,
    LL,
    RL,
    LR,
    XX,
    YY,
    XY,
    YX,
}

impl Pol {
    /// The polarization for an AIPS integer code, if the code is valid.
    pub fn from_code(code: i8) -> Option<Pol> {
        match code {
            1 => Some(Pol::I),
            2 => Some(Pol::Q),
            3 => Some(Pol::U),
            4 => Some(Pol::V),
            -1 => Some(Pol::RR),
            -2 => Some(Pol::LL),
            -3 => Some(Pol::RL),
            -4 => Some(Pol::LR),
            -5 => Some(Pol::XX),
            -6 => Some(Pol::YY),
            -7 => Some(Pol::XY),
            -8 => Some(Pol::YX),
            _ => None,
        }
    }

    /// The AIPS integer code.
    pub fn code(self) -> i8 {
        match self {
            Pol::I => 1,
            Pol::Q => 2,
            Pol::U => 3,
            Pol::V => 4,
            Pol::RR => -1,
            Pol::LL => -2,
            Pol::RL => -3,
            Pol::LR => -4,
            Pol::XX => -5,
            Pol::YY => -6,
            Pol::XY => -7,
            Pol::YX => -8,
        }
    }
}

impl std::fmt::Display for Pol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Pol::I => "I",
                Pol::Q => "Q",
                Pol::U => "U",
                Pol::V => "V",
                Pol::RR => "RR",
                Pol::LL => "LL",
                Pol::RL => "RL",
                Pol::LR => "LR",
                Pol::XX => "XX",
                Pol::YY => "YY",
                Pol::XY => "XY",
                Pol::YX => "YX",
            }
        )
    }
}

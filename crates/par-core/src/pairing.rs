// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runway identifier normalization and end-to-end pairing.
//!
//! Reference data lists runway ends individually. The plan view draws a runway
//! as the segment between an end and its reciprocal, so ends are matched by
//! designator: `09L` pairs with `27R`, `09C` with `27C`, `09` with `27`.

use std::fmt;

use crate::reference::RunwayEnd;

/// Parallel-runway side designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Center,
}

impl Side {
    /// Side of the same pavement seen from the opposite end.
    #[must_use]
    pub fn reciprocal(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Center => Self::Center,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Center => 'C',
        }
    }
}

/// Normalized runway designator: a number 1–36 and an optional side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunwayIdent {
    pub number: u8,
    pub side: Option<Side>,
}

impl RunwayIdent {
    /// Parse an identifier such as `"09"`, `"9L"`, `" 27r "` or `"36C"`.
    ///
    /// Returns `None` for anything that is not `{1–36}{L|R|C}?`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let ident = raw.trim().to_ascii_uppercase();
        let digits_end = ident
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(ident.len());
        let (digits, suffix) = ident.split_at(digits_end);

        if digits.is_empty() || digits.len() > 2 {
            return None;
        }
        let number: u8 = digits.parse().ok()?;
        if !(1..=36).contains(&number) {
            return None;
        }

        let side = match suffix {
            "" => None,
            "L" => Some(Side::Left),
            "R" => Some(Side::Right),
            "C" => Some(Side::Center),
            _ => return None,
        };

        Some(Self { number, side })
    }

    /// Designator of the opposite end of the same runway.
    #[must_use]
    pub fn reciprocal(self) -> Self {
        Self {
            number: (self.number + 17) % 36 + 1,
            side: self.side.map(Side::reciprocal),
        }
    }
}

impl fmt::Display for RunwayIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(side) = self.side {
            write!(f, "{}", side.letter())?;
        }
        Ok(())
    }
}

/// Pair each runway end with its reciprocal.
///
/// Returns index pairs into `ends`. Every exact designator match is taken
/// first; only ends still unpaired afterwards fall back to the first unpaired
/// end whose number matches regardless of side. Ends that are unparseable or
/// have no partner are left out.
#[must_use]
pub fn pair_runway_ends(ends: &[RunwayEnd]) -> Vec<(usize, usize)> {
    let idents: Vec<Option<RunwayIdent>> = ends
        .iter()
        .map(|end| RunwayIdent::parse(&end.runway_id))
        .collect();
    let mut paired = vec![false; ends.len()];
    let mut pairs = Vec::new();

    for exact_pass in [true, false] {
        for i in 0..ends.len() {
            if paired[i] {
                continue;
            }
            let Some(ident) = idents[i] else {
                continue;
            };
            let wanted = ident.reciprocal();

            let partner = (0..ends.len()).find(|&j| {
                j != i
                    && !paired[j]
                    && idents[j].is_some_and(|other| {
                        if exact_pass {
                            other == wanted
                        } else {
                            other.number == wanted.number
                        }
                    })
            });
            if let Some(j) = partner {
                paired[i] = true;
                paired[j] = true;
                pairs.push((i, j));
            }
        }
    }

    pairs
}

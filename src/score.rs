/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use uci_parser::UciScore;

/// A numerical representation of the evaluation of a position / move, in units of ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Every material value is a multiple of 100, so halving a material score is always exact.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(pub i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(i32::MAX);

    /// Score of a materially balanced position.
    pub const EVEN: Self = Self(0);

    /// Converts this [`Score`] into a [`UciScore`].
    ///
    /// Used when sending the `info score` message.
    #[inline(always)]
    pub fn into_uci(self) -> UciScore {
        UciScore::cp(self.0)
    }

    /// "Normalizes" a score so that it can be printed as a float, in units of pawns.
    #[inline(always)]
    pub fn normalize(&self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Half of this score, as used when weighting opponent replies.
    #[inline(always)]
    pub const fn halved(self) -> Self {
        Self(self.0 / 2)
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl PartialEq<i32> for Score {
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cp", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halved_is_exact_for_material() {
        assert_eq!(Score(900).halved(), 450);
        assert_eq!(Score(-300).halved(), -150);
        assert_eq!(Score(10_000).halved(), Score(5_000));
    }

    #[test]
    fn test_arithmetic_and_neg() {
        let mut total = Score(100) - Score(300);
        total += 500;
        assert_eq!(total, 300);
        assert_eq!(-total, Score(-300));
        assert!(-Score::INF < Score::EVEN);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Score(250).normalize(), 2.5);
        assert_eq!(Score(-100).normalize(), -1.0);
    }
}

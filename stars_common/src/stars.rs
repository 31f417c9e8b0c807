use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The currency code the chat transport uses for in-app stars.
pub const STARS_CURRENCY_CODE: &str = "XTR";

//--------------------------------------        Stars         ---------------------------------------------------------
/// An amount of the in-app virtual currency. Balances are never negative, but intermediate values (deltas) may be.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Stars(i64);

op!(binary Stars, Add, add);
op!(binary Stars, Sub, sub);
op!(inplace Stars, AddAssign, add_assign);
op!(inplace Stars, SubAssign, sub_assign);

impl Sum for Stars {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in stars: {0}")]
pub struct StarsConversionError(String);

impl From<i64> for Stars {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Stars {
    type Error = StarsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| StarsConversionError(format!("Value {value} is too large to convert to Stars")))
    }
}

impl FromStr for Stars {
    type Err = StarsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| StarsConversionError(format!("{s}: {e}")))
    }
}

impl Display for Stars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}⭐", self.0)
    }
}

impl Stars {
    /// Constructor for constants.
    pub const fn from_const(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

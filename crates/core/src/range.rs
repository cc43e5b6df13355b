//! Inclusive integer ranges (`3`, `1..5`, `..0`, `10..`).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an [`IntRange`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    /// `..` with neither bound.
    #[error("range must have at least one bound")]
    Unbounded,
    /// A bound was not an integer.
    #[error("invalid integer '{0}' in range")]
    InvalidBound(String),
    /// Minimum exceeded maximum.
    #[error("range minimum {min} is greater than maximum {max}")]
    Inverted {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
}

/// Inclusive range with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    /// Lower bound, if any.
    pub min: Option<i32>,
    /// Upper bound, if any.
    pub max: Option<i32>,
}

impl IntRange {
    /// A range matching exactly one value.
    pub const fn exactly(value: i32) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    /// Whether `value` falls inside the range.
    pub fn matches(&self, value: i32) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Parse range syntax.
    pub fn parse(input: &str) -> Result<Self, RangeParseError> {
        let input = input.trim();
        let bound = |s: &str| -> Result<Option<i32>, RangeParseError> {
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i32>()
                .map(Some)
                .map_err(|_| RangeParseError::InvalidBound(s.to_string()))
        };
        let range = match input.split_once("..") {
            Some((lo, hi)) => Self {
                min: bound(lo)?,
                max: bound(hi)?,
            },
            None => {
                let value = bound(input)?.ok_or(RangeParseError::Unbounded)?;
                Self::exactly(value)
            }
        };
        match (range.min, range.max) {
            (None, None) => Err(RangeParseError::Unbounded),
            (Some(min), Some(max)) if min > max => Err(RangeParseError::Inverted { min, max }),
            _ => Ok(range),
        }
    }
}

impl FromStr for IntRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => write!(f, "{min}"),
            (min, max) => {
                if let Some(min) = min {
                    write!(f, "{min}")?;
                }
                write!(f, "..")?;
                if let Some(max) = max {
                    write!(f, "{max}")?;
                }
                Ok(())
            }
        }
    }
}

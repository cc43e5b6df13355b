//! Dimension identifiers.
//!
//! Every execution frame is dimension-scoped: block reads, `at` forks and the
//! `in` redirect all carry a [`DimensionId`] alongside the position.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::ResourceKey;

/// Stable identifier for a world dimension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DimensionId {
    /// The Overworld dimension.
    #[default]
    Overworld = 0,
    /// The Nether dimension.
    Nether = 1,
    /// The End dimension.
    End = 2,
}

impl DimensionId {
    /// All known dimensions, in id order.
    pub const ALL: [Self; 3] = [Self::Overworld, Self::Nether, Self::End];

    /// Try to convert from the stable numeric representation.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Overworld),
            1 => Some(Self::Nether),
            2 => Some(Self::End),
            _ => None,
        }
    }

    /// Canonical path of the dimension key (`minecraft:<path>`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Nether => "the_nether",
            Self::End => "the_end",
        }
    }

    /// Horizontal coordinate scale relative to the Overworld.
    pub const fn coordinate_scale(self) -> f64 {
        match self {
            Self::Nether => 8.0,
            Self::Overworld | Self::End => 1.0,
        }
    }

    /// Factor applied to x/z when moving a position from `self` into `to`.
    pub fn scale_to(self, to: Self) -> f64 {
        self.coordinate_scale() / to.coordinate_scale()
    }

    /// Resolve a dimension from its resource key.
    ///
    /// The short aliases `nether` and `end` are accepted as well.
    pub fn from_key(key: &ResourceKey) -> Option<Self> {
        if key.namespace() != crate::registry::DEFAULT_NAMESPACE {
            return None;
        }
        match key.path() {
            "overworld" => Some(Self::Overworld),
            "the_nether" | "nether" => Some(Self::Nether),
            "the_end" | "end" => Some(Self::End),
            _ => None,
        }
    }

    /// Resource key naming this dimension.
    pub fn key(self) -> ResourceKey {
        ResourceKey::minecraft(self.as_str())
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "minecraft:{}", self.as_str())
    }
}

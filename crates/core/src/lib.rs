#![warn(missing_docs)]
//! Value types shared by the command engine: dimensions, keys, positions,
//! block states, ranges and structured data documents.

pub mod block;
pub mod dimension;
pub mod nbt;
pub mod path;
pub mod pos;
pub mod range;
pub mod registry;

pub use block::{BlockParseError, BlockPredicate, BlockState};
pub use dimension::DimensionId;
pub use glam::DVec3;
pub use nbt::{Compound, Tag};
pub use path::{DataPath, DataPathError, PathNode};
pub use pos::{wrap_degrees, BlockBox, BlockPos, Rotation};
pub use range::{IntRange, RangeParseError};
pub use registry::{ResourceKey, ResourceKeyError, DEFAULT_NAMESPACE};

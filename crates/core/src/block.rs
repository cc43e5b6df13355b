//! Block states and block predicates.
//!
//! Both share the textual form `namespace:name[key=value,...]`. A state lists
//! its full property set; a predicate lists only the properties it constrains.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::registry::{ResourceKey, ResourceKeyError};

/// Error returned when parsing a block state or predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockParseError {
    /// Block name was not a valid resource key.
    #[error(transparent)]
    Key(#[from] ResourceKeyError),
    /// Property list was not closed with `]`.
    #[error("unclosed property list in '{0}'")]
    Unclosed(String),
    /// A property entry lacked `=` or had an empty side.
    #[error("malformed property '{0}'")]
    MalformedProperty(String),
    /// The same property appeared twice.
    #[error("duplicate property '{0}'")]
    DuplicateProperty(String),
}

/// A concrete block with its properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockState {
    /// Block name.
    pub name: ResourceKey,
    /// Property values, sorted by key.
    pub properties: BTreeMap<String, String>,
}

impl BlockState {
    /// A block with no properties.
    pub fn simple(name: ResourceKey) -> Self {
        Self {
            name,
            properties: BTreeMap::new(),
        }
    }

    /// The air block.
    pub fn air() -> Self {
        Self::simple(ResourceKey::minecraft("air"))
    }

    /// Whether this is any kind of air.
    pub fn is_air(&self) -> bool {
        self.name.namespace() == crate::registry::DEFAULT_NAMESPACE
            && matches!(self.name.path(), "air" | "cave_air" | "void_air")
    }

    /// Parse `name[key=value,...]`.
    pub fn parse(input: &str) -> Result<Self, BlockParseError> {
        let (name, properties) = parse_block_syntax(input)?;
        Ok(Self { name, properties })
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block_syntax(f, &self.name, &self.properties)
    }
}

impl FromStr for BlockState {
    type Err = BlockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlockState {
    type Error = BlockParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlockState> for String {
    fn from(state: BlockState) -> Self {
        state.to_string()
    }
}

/// Matches block states by name and a subset of properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockPredicate {
    /// Required block name.
    pub name: ResourceKey,
    /// Properties that must be present with exactly these values.
    pub properties: BTreeMap<String, String>,
}

impl BlockPredicate {
    /// Parse `name[key=value,...]`.
    pub fn parse(input: &str) -> Result<Self, BlockParseError> {
        let (name, properties) = parse_block_syntax(input)?;
        Ok(Self { name, properties })
    }

    /// Whether `state` satisfies this predicate.
    pub fn matches(&self, state: &BlockState) -> bool {
        state.name == self.name
            && self
                .properties
                .iter()
                .all(|(key, value)| state.properties.get(key) == Some(value))
    }
}

impl fmt::Display for BlockPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block_syntax(f, &self.name, &self.properties)
    }
}

fn parse_block_syntax(
    input: &str,
) -> Result<(ResourceKey, BTreeMap<String, String>), BlockParseError> {
    let input = input.trim();
    let Some(open) = input.find('[') else {
        return Ok((ResourceKey::parse(input)?, BTreeMap::new()));
    };
    let name = ResourceKey::parse(&input[..open])?;
    let body = input[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| BlockParseError::Unclosed(input.to_string()))?;

    let mut properties = BTreeMap::new();
    for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .ok_or_else(|| BlockParseError::MalformedProperty(entry.to_string()))?;
        if properties
            .insert(key.to_string(), value.to_string())
            .is_some()
        {
            return Err(BlockParseError::DuplicateProperty(key.to_string()));
        }
    }
    Ok((name, properties))
}

fn write_block_syntax(
    f: &mut fmt::Formatter<'_>,
    name: &ResourceKey,
    properties: &BTreeMap<String, String>,
) -> fmt::Result {
    write!(f, "{name}")?;
    if properties.is_empty() {
        return Ok(());
    }
    write!(f, "[")?;
    for (i, (key, value)) in properties.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{key}={value}")?;
    }
    write!(f, "]")
}

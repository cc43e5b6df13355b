//! Paths into [`Tag`] documents (`Inventory[0].Count`, `Tags[]`, `"odd key".x`).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::nbt::Tag;

/// Errors produced while parsing or applying a [`DataPath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataPathError {
    /// Path text was malformed.
    #[error("invalid data path '{path}': {reason}")]
    Invalid {
        /// Offending input.
        path: String,
        /// What was wrong.
        reason: &'static str,
    },
    /// The path resolved to no elements.
    #[error("found no elements matching {0}")]
    NothingFound(String),
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathNode {
    /// Compound member.
    Key(String),
    /// List element; negative indices count from the end.
    Index(i32),
    /// Every list element.
    AllElements,
}

impl PathNode {
    fn children<'a>(&self, tag: &'a Tag) -> Vec<&'a Tag> {
        match (self, tag) {
            (Self::Key(key), Tag::Compound(map)) => map.get(key).into_iter().collect(),
            (Self::Index(index), Tag::List(items)) => resolve_index(*index, items.len())
                .and_then(|i| items.get(i))
                .into_iter()
                .collect(),
            (Self::AllElements, Tag::List(items)) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn children_or_create<'a>(&self, tag: &'a mut Tag, next: &PathNode) -> Vec<&'a mut Tag> {
        match (self, tag) {
            (Self::Key(key), Tag::Compound(map)) => {
                vec![map.entry(key.clone()).or_insert_with(|| next.empty_parent())]
            }
            (Self::Index(index), Tag::List(items)) => match resolve_index(*index, items.len()) {
                Some(i) => items.get_mut(i).into_iter().collect(),
                None => Vec::new(),
            },
            (Self::AllElements, Tag::List(items)) => items.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    fn empty_parent(&self) -> Tag {
        match self {
            Self::Key(_) => Tag::compound(),
            Self::Index(_) | Self::AllElements => Tag::List(Vec::new()),
        }
    }

    fn set(&self, tag: &mut Tag, value: &Tag) -> usize {
        match (self, tag) {
            (Self::Key(key), Tag::Compound(map)) => {
                map.insert(key.clone(), value.clone());
                1
            }
            (Self::Index(index), Tag::List(items)) => {
                match resolve_index(*index, items.len()).and_then(|i| items.get_mut(i)) {
                    Some(slot) => {
                        *slot = value.clone();
                        1
                    }
                    None => 0,
                }
            }
            (Self::AllElements, Tag::List(items)) => {
                for slot in items.iter_mut() {
                    *slot = value.clone();
                }
                items.len()
            }
            _ => 0,
        }
    }
}

fn resolve_index(index: i32, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = i64::from(index);
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// A parsed path into a structured document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    nodes: Vec<PathNode>,
}

impl DataPath {
    /// Parse path text.
    pub fn parse(input: &str) -> Result<Self, DataPathError> {
        let invalid = |reason| DataPathError::Invalid {
            path: input.to_string(),
            reason,
        };
        let chars: Vec<char> = input.trim().chars().collect();
        if chars.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut nodes = Vec::new();
        let mut i = 0;
        loop {
            let key = if chars[i] == '"' {
                let mut key = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(invalid("unterminated quoted key")),
                        Some('"') => break,
                        Some('\\') => {
                            let escaped = chars.get(i + 1).ok_or_else(|| invalid("dangling escape"))?;
                            key.push(*escaped);
                            i += 2;
                        }
                        Some(c) => {
                            key.push(*c);
                            i += 1;
                        }
                    }
                }
                i += 1;
                key
            } else {
                let start = i;
                while i < chars.len() && !matches!(chars[i], '.' | '[' | ']' | '"' | ' ') {
                    i += 1;
                }
                chars[start..i].iter().collect()
            };
            if key.is_empty() {
                return Err(invalid("empty key"));
            }
            nodes.push(PathNode::Key(key));

            while chars.get(i) == Some(&'[') {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| invalid("unclosed index"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                let node = if inner.trim().is_empty() {
                    PathNode::AllElements
                } else {
                    PathNode::Index(
                        inner
                            .trim()
                            .parse::<i32>()
                            .map_err(|_| invalid("index is not an integer"))?,
                    )
                };
                nodes.push(node);
                i = close + 1;
            }

            match chars.get(i) {
                None => break,
                Some('.') if i + 1 < chars.len() => i += 1,
                Some('.') => return Err(invalid("trailing '.'")),
                Some(_) => return Err(invalid("unexpected character")),
            }
        }
        Ok(Self { nodes })
    }

    /// Path steps.
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Every tag the path resolves to.
    pub fn get<'a>(&self, root: &'a Tag) -> Vec<&'a Tag> {
        self.nodes.iter().fold(vec![root], |current, node| {
            current
                .into_iter()
                .flat_map(|tag| node.children(tag))
                .collect()
        })
    }

    /// Number of tags the path resolves to.
    pub fn count_matching(&self, root: &Tag) -> usize {
        self.get(root).len()
    }

    /// Write `value` at every location the path resolves to, creating missing
    /// compound members along the way. Returns the number of slots written.
    pub fn set(&self, root: &mut Tag, value: Tag) -> Result<usize, DataPathError> {
        let written = set_in(root, &self.nodes, &value);
        if written == 0 {
            return Err(DataPathError::NothingFound(self.to_string()));
        }
        Ok(written)
    }
}

fn set_in(tag: &mut Tag, nodes: &[PathNode], value: &Tag) -> usize {
    match nodes {
        [] => 0,
        [last] => last.set(tag, value),
        [node, rest @ ..] => node
            .children_or_create(tag, &rest[0])
            .into_iter()
            .map(|child| set_in(child, rest, value))
            .sum(),
    }
}

impl FromStr for DataPath {
    type Err = DataPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                PathNode::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    if key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
                        write!(f, "{key}")?;
                    } else {
                        write!(f, "{key:?}")?;
                    }
                }
                PathNode::Index(index) => write!(f, "[{index}]")?,
                PathNode::AllElements => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

//! Target selectors (`@s`, `@e[type=zombie,tag=!boss,limit=2]`, `Steve`) and
//! score holders.

use mdcommand_core::ResourceKey;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::context::ExecutionContext;
use crate::entity::EntityRef;
use crate::error::{CommandError, CommandResult};
use crate::reader::StringReader;
use crate::server::CommandServer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorKind {
    /// `@s`: the context's entity as the server currently sees it, falling
    /// back to the context's copy when the server no longer lists it.
    Sender,
    /// `@e`
    AllEntities,
    /// `@a`
    AllPlayers,
    /// `@p`
    NearestPlayer,
    /// `@r`
    RandomPlayer,
    /// A player name.
    Named(String),
}

/// A parsed selector. Filters are ANDed; `(value, false)` means the filter is
/// negated with `!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySelector {
    pub kind: SelectorKind,
    pub entity_type: Option<(ResourceKey, bool)>,
    pub tags: Vec<(String, bool)>,
    pub name: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl EntitySelector {
    pub fn new(kind: SelectorKind) -> Self {
        Self {
            kind,
            entity_type: None,
            tags: Vec::new(),
            name: None,
            limit: None,
        }
    }

    pub fn sender() -> Self {
        Self::new(SelectorKind::Sender)
    }

    pub fn parse(reader: &mut StringReader<'_>) -> CommandResult<Self> {
        let start = reader.cursor();
        if reader.peek() != Some('@') {
            let name = reader.read_unquoted();
            if name.is_empty() {
                return Err(CommandError::syntax("expected a selector or name", start));
            }
            return Ok(Self::new(SelectorKind::Named(name.to_string())));
        }
        reader.skip();
        let kind = match reader.peek() {
            Some('s') => SelectorKind::Sender,
            Some('e') => SelectorKind::AllEntities,
            Some('a') => SelectorKind::AllPlayers,
            Some('p') => SelectorKind::NearestPlayer,
            Some('r') => SelectorKind::RandomPlayer,
            _ => return Err(CommandError::syntax("unknown selector type", start)),
        };
        reader.skip();
        let mut selector = Self::new(kind);
        if reader.peek() == Some('[') {
            reader.skip();
            selector.parse_options(reader)?;
        }
        if !reader.at_boundary() {
            return Err(reader.error("unexpected characters after selector"));
        }
        Ok(selector)
    }

    fn parse_options(&mut self, reader: &mut StringReader<'_>) -> CommandResult<()> {
        let body_start = reader.cursor();
        let rest = reader.remaining();
        let Some(close) = rest.find(']') else {
            return Err(CommandError::syntax("unclosed selector options", body_start));
        };
        let body = &rest[..close];
        reader.set_cursor(body_start + close + 1);
        for option in body.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            let Some((key, value)) = option.split_once('=') else {
                return Err(CommandError::syntax(
                    format!("expected '=' in selector option '{option}'"),
                    body_start,
                ));
            };
            let (value, inverted) = match value.trim().strip_prefix('!') {
                Some(rest) => (rest, true),
                None => (value.trim(), false),
            };
            match key.trim() {
                "type" => {
                    let key = ResourceKey::parse(value).map_err(|err| {
                        CommandError::syntax(format!("invalid entity type: {err}"), body_start)
                    })?;
                    self.entity_type = Some((key, !inverted));
                }
                "tag" => self.tags.push((value.to_string(), !inverted)),
                "name" => self.name = Some((value.to_string(), !inverted)),
                "limit" => {
                    let limit = value.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                        CommandError::syntax("limit must be at least 1", body_start)
                    })?;
                    self.limit = Some(limit);
                }
                other => {
                    return Err(CommandError::syntax(
                        format!("unknown selector option '{other}'"),
                        body_start,
                    ))
                }
            }
        }
        Ok(())
    }

    /// Upper bound on how many entities this selector can produce.
    pub fn max_results(&self) -> usize {
        let default = match self.kind {
            SelectorKind::AllEntities | SelectorKind::AllPlayers => usize::MAX,
            _ => 1,
        };
        self.limit.map_or(default, |limit| limit.min(default))
    }

    fn players_only(&self) -> bool {
        !matches!(self.kind, SelectorKind::AllEntities | SelectorKind::Sender)
    }

    fn accepts(&self, entity: &EntityRef) -> bool {
        if self.players_only() && !entity.is_player() {
            return false;
        }
        if let Some((kind, wanted)) = &self.entity_type {
            if (&entity.kind == kind) != *wanted {
                return false;
            }
        }
        if let Some((name, wanted)) = &self.name {
            if (&entity.name == name) != *wanted {
                return false;
            }
        }
        self.tags.iter().all(|(tag, wanted)| {
            let present = if tag.is_empty() {
                !entity.tags.is_empty()
            } else {
                entity.tags.contains(tag)
            };
            present != (*wanted == tag.is_empty())
        })
    }

    /// Pick matching entities out of `candidates` (server order) in
    /// selector-defined order.
    pub fn select<R: Rng + ?Sized>(
        &self,
        ctx: &ExecutionContext,
        candidates: Vec<EntityRef>,
        rng: &mut R,
    ) -> Vec<EntityRef> {
        let mut matched: Vec<EntityRef> = match &self.kind {
            SelectorKind::Sender => match ctx.entity() {
                Some(me) => candidates
                    .into_iter()
                    .find(|entity| entity.id == me.id)
                    .or_else(|| Some(me.clone()))
                    .into_iter()
                    .collect(),
                None => Vec::new(),
            },
            SelectorKind::Named(name) => candidates
                .into_iter()
                .filter(|entity| &entity.name == name)
                .collect(),
            _ => candidates,
        };
        matched.retain(|entity| self.accepts(entity));
        match self.kind {
            SelectorKind::NearestPlayer => {
                let origin = ctx.position();
                matched.retain(|entity| entity.dimension == ctx.dimension());
                matched.sort_by(|a, b| {
                    a.position
                        .distance_squared(origin)
                        .total_cmp(&b.position.distance_squared(origin))
                });
            }
            SelectorKind::RandomPlayer => matched.shuffle(rng),
            _ => {}
        }
        matched.truncate(self.max_results());
        matched
    }
}

/// Owner of scores named in a scoreboard argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreHolder {
    /// `*`: every holder currently tracked.
    Wildcard,
    /// Literal holder name that need not be an entity.
    Name(String),
    Selector(EntitySelector),
}

impl ScoreHolder {
    pub fn parse(reader: &mut StringReader<'_>) -> CommandResult<Self> {
        match reader.peek() {
            Some('*') => {
                reader.skip();
                Ok(Self::Wildcard)
            }
            Some('@') => EntitySelector::parse(reader).map(Self::Selector),
            _ => {
                let start = reader.cursor();
                let name = reader.read_token();
                if name.is_empty() {
                    return Err(CommandError::syntax("expected a score holder", start));
                }
                Ok(Self::Name(name.to_string()))
            }
        }
    }

    pub fn max_results(&self) -> usize {
        match self {
            Self::Wildcard => usize::MAX,
            Self::Name(_) => 1,
            Self::Selector(selector) => selector.max_results(),
        }
    }

    /// Holder names; never empty.
    pub fn resolve(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
    ) -> CommandResult<Vec<String>> {
        let holders = match self {
            Self::Wildcard => server.score_holders(),
            Self::Name(name) => vec![name.clone()],
            Self::Selector(selector) => server
                .select_entities(ctx, selector)?
                .iter()
                .map(|entity| entity.score_holder().to_string())
                .collect(),
        };
        if holders.is_empty() {
            return Err(CommandError::EntityNotFound);
        }
        Ok(holders)
    }

    pub fn resolve_single(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
    ) -> CommandResult<String> {
        let mut holders = self.resolve(server, ctx)?;
        if holders.len() > 1 {
            return Err(CommandError::TooManyEntities {
                count: holders.len(),
            });
        }
        holders.pop().ok_or(CommandError::EntityNotFound)
    }
}

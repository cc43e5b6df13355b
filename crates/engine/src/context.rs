//! The execution frame a command runs under.
//!
//! An [`ExecutionContext`] is a value: every `with_*` derivation borrows the
//! original and returns a fresh copy, so a stage can never disturb the context
//! it was handed, and forked branches never share mutable state.

use mdcommand_core::{wrap_degrees, DVec3, DimensionId, Rotation};

use crate::callback::{CallbackChain, ResultCallback};
use crate::entity::EntityRef;
use crate::message::Message;
use crate::server::CommandServer;

/// Reference point used for `facing` and local (`^`) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Feet,
    Eyes,
}

impl Anchor {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "feet" => Some(Self::Feet),
            "eyes" => Some(Self::Eyes),
            _ => None,
        }
    }

    /// Anchored point of `entity`.
    pub fn apply_to_entity(self, entity: &EntityRef) -> DVec3 {
        match self {
            Self::Feet => entity.position,
            Self::Eyes => entity.eye_position(),
        }
    }
}

/// Where feedback for a context goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Silent,
    Console,
    Player { name: String },
}

/// How [`ExecutionContext::with_callback`] combines with the existing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Drop the existing chain.
    Replace,
    /// Append after the existing chain.
    Chain,
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    name: String,
    position: DVec3,
    rotation: Rotation,
    anchor: Anchor,
    dimension: DimensionId,
    entity: Option<EntityRef>,
    permission_level: u8,
    output: OutputSink,
    callbacks: CallbackChain,
}

impl ExecutionContext {
    /// Server console at `spawn`, full permissions.
    pub fn console(dimension: DimensionId, spawn: DVec3) -> Self {
        Self {
            name: "Server".to_string(),
            position: spawn,
            rotation: Rotation::default(),
            anchor: Anchor::Feet,
            dimension,
            entity: None,
            permission_level: 4,
            output: OutputSink::Console,
            callbacks: CallbackChain::default(),
        }
    }

    /// A player or other entity issuing a command itself.
    pub fn for_entity(entity: EntityRef, permission_level: u8) -> Self {
        Self {
            name: entity.name.clone(),
            position: entity.position,
            rotation: entity.rotation,
            anchor: Anchor::Feet,
            dimension: entity.dimension,
            output: OutputSink::Player {
                name: entity.name.clone(),
            },
            entity: Some(entity),
            permission_level,
            callbacks: CallbackChain::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn dimension(&self) -> DimensionId {
        self.dimension
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        self.entity.as_ref()
    }

    pub fn permission_level(&self) -> u8 {
        self.permission_level
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    pub fn callbacks(&self) -> &CallbackChain {
        &self.callbacks
    }

    pub fn has_permission(&self, level: u8) -> bool {
        self.permission_level >= level
    }

    pub fn with_position(&self, position: DVec3) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub fn with_rotation(&self, rotation: Rotation) -> Self {
        Self {
            rotation,
            ..self.clone()
        }
    }

    pub fn with_anchor(&self, anchor: Anchor) -> Self {
        Self {
            anchor,
            ..self.clone()
        }
    }

    pub fn with_dimension(&self, dimension: DimensionId) -> Self {
        Self {
            dimension,
            ..self.clone()
        }
    }

    /// Acting entity; the display name follows the entity.
    pub fn with_entity(&self, entity: EntityRef) -> Self {
        Self {
            name: entity.name.clone(),
            entity: Some(entity),
            ..self.clone()
        }
    }

    pub fn with_permission_level(&self, permission_level: u8) -> Self {
        Self {
            permission_level,
            ..self.clone()
        }
    }

    pub fn with_callback(&self, callback: ResultCallback, combine: Combine) -> Self {
        let callbacks = match combine {
            Combine::Replace => CallbackChain::single(callback),
            Combine::Chain => self.callbacks.clone().then(callback),
        };
        Self {
            callbacks,
            ..self.clone()
        }
    }

    pub fn with_suppressed_output(&self) -> Self {
        Self {
            output: OutputSink::Silent,
            ..self.clone()
        }
    }

    /// Position the context looks from: feet, or feet plus the acting
    /// entity's eye height.
    pub fn anchored_position(&self) -> DVec3 {
        match (self.anchor, &self.entity) {
            (Anchor::Eyes, Some(entity)) => self.position + DVec3::new(0.0, entity.eye_height, 0.0),
            _ => self.position,
        }
    }

    /// Rotation pointing from the anchored position toward `target`.
    pub fn facing(&self, target: DVec3) -> Self {
        self.with_rotation(rotation_towards(self.anchored_position(), target))
    }

    /// Rotation pointing toward `entity`'s anchored point.
    pub fn facing_entity(&self, entity: &EntityRef, anchor: Anchor) -> Self {
        self.facing(anchor.apply_to_entity(entity))
    }

    /// Report a completion through this context's callback chain.
    pub fn on_command_complete(&self, server: &mut dyn CommandServer, success: bool, result: i32) {
        self.callbacks.invoke(server, self, success, result);
    }

    pub fn send_success(
        &self,
        server: &mut dyn CommandServer,
        message: Message,
        broadcast_to_ops: bool,
    ) {
        if self.output != OutputSink::Silent {
            server.send_feedback(&self.output, &message, broadcast_to_ops);
        }
    }

    pub fn send_failure(&self, server: &mut dyn CommandServer, message: Message) {
        if self.output != OutputSink::Silent {
            server.send_failure(&self.output, &message);
        }
    }
}

/// Yaw/pitch looking from `from` to `to`.
pub fn rotation_towards(from: DVec3, to: DVec3) -> Rotation {
    let delta = to - from;
    let horizontal = (delta.x * delta.x + delta.z * delta.z).sqrt();
    let pitch = wrap_degrees(-(delta.y.atan2(horizontal).to_degrees()) as f32);
    let yaw = wrap_degrees(delta.z.atan2(delta.x).to_degrees() as f32 - 90.0);
    Rotation::new(yaw, pitch)
}

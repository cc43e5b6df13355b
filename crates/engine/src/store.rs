//! `store result|success` targets.

use mdcommand_core::{DataPath, ResourceKey, Tag};
use tracing::debug;

use crate::args::Arguments;
use crate::context::ExecutionContext;
use crate::data::{DataAccessor, DataSourceKind};
use crate::error::{CommandError, CommandResult};
use crate::server::CommandServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// The command's raw result.
    Result,
    /// 1 on success, 0 otherwise.
    Success,
}

impl StoreMode {
    pub const ALL: [Self; 2] = [Self::Result, Self::Success];

    pub fn literal(self) -> &'static str {
        match self {
            Self::Result => "result",
            Self::Success => "success",
        }
    }

    pub fn value(self, success: bool, result: i32) -> i32 {
        match self {
            Self::Result => result,
            Self::Success => i32::from(success),
        }
    }
}

/// Numeric leaf type written by a data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl NumericType {
    pub const ALL: [Self; 6] = [
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
    ];

    pub fn literal(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Tag holding `value * scale`, truncated toward zero for integer types.
    /// Narrow integers wrap through `i32` first.
    pub fn to_tag(self, value: i32, scale: f64) -> Tag {
        let scaled = f64::from(value) * scale;
        match self {
            Self::Byte => Tag::Byte(scaled as i32 as i8),
            Self::Short => Tag::Short(scaled as i32 as i16),
            Self::Int => Tag::Int(scaled as i32),
            Self::Long => Tag::Long(scaled as i64),
            Self::Float => Tag::Float(scaled as f32),
            Self::Double => Tag::Double(scaled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossBarField {
    Value,
    Max,
}

impl BossBarField {
    pub fn literal(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Max => "max",
        }
    }
}

/// A resolved destination.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreTarget {
    Score {
        holders: Vec<String>,
        objective: String,
    },
    BossBar {
        id: ResourceKey,
        field: BossBarField,
    },
    Data {
        accessor: DataAccessor,
        path: DataPath,
        numeric: NumericType,
        scale: f64,
    },
}

/// Writes every completion it observes into its target.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCallback {
    pub mode: StoreMode,
    pub target: StoreTarget,
}

impl StoreCallback {
    pub fn apply(&self, server: &mut dyn CommandServer, success: bool, result: i32) {
        let value = self.mode.value(success, result);
        match &self.target {
            StoreTarget::Score { holders, objective } => {
                for holder in holders {
                    server.set_score(holder, objective, value);
                }
            }
            StoreTarget::BossBar { id, field } => match field {
                BossBarField::Value => server.set_boss_bar_value(id, value),
                BossBarField::Max => server.set_boss_bar_max(id, value),
            },
            StoreTarget::Data {
                accessor,
                path,
                numeric,
                scale,
            } => {
                // A vanished holder or an unwritable path leaves the chain running.
                if let Err(err) = write_data(server, accessor, path, numeric.to_tag(value, *scale)) {
                    debug!(%err, %path, "store into data skipped");
                }
            }
        }
    }
}

fn write_data(
    server: &mut dyn CommandServer,
    accessor: &DataAccessor,
    path: &DataPath,
    value: Tag,
) -> CommandResult<()> {
    let mut data = accessor.get_data(server)?;
    path.set(&mut data, value)?;
    accessor.set_data(server, data)
}

/// Which destination a graph branch binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTargetKind {
    Score,
    BossBar(BossBarField),
    Data {
        source: DataSourceKind,
        numeric: NumericType,
    },
}

impl StoreTargetKind {
    /// Resolve holders and accessors now; only the write waits for the
    /// completion.
    pub fn bind(
        self,
        mode: StoreMode,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        args: &Arguments,
    ) -> CommandResult<StoreCallback> {
        let target = match self {
            Self::Score => {
                let holders = args.score_holder("targets")?.resolve(server, ctx)?;
                let objective = args.string("objective")?.clone();
                if !server.has_objective(&objective) {
                    return Err(CommandError::UnknownObjective(objective));
                }
                StoreTarget::Score { holders, objective }
            }
            Self::BossBar(field) => {
                let id = args.resource_key("id")?.clone();
                if !server.has_boss_bar(&id) {
                    return Err(CommandError::UnknownBossBar(id));
                }
                StoreTarget::BossBar { id, field }
            }
            Self::Data { source, numeric } => StoreTarget::Data {
                accessor: source.bind(args, "target")?.resolve(server, ctx)?,
                path: args.data_path("path")?.clone(),
                numeric,
                scale: args.double("scale")?,
            },
        };
        Ok(StoreCallback { mode, target })
    }
}

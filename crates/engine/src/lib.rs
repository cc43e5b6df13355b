//! Command execution graph.
//!
//! Commands are parsed against a [`CommandGraph`] into stages and run by the
//! [`Dispatcher`] under immutable [`ExecutionContext`] values. `execute`
//! composes stages through forks (`as`, `at`), redirects (`positioned`, `in`),
//! gates (`if`, `unless`) and store clauses that observe the final result.
//!
//! ```no_run
//! # use mdcommand_engine::{CommandServer, Dispatcher, ExecutionContext};
//! # use mdcommand_core::{DVec3, DimensionId};
//! # fn demo(server: &mut dyn CommandServer) {
//! let dispatcher = Dispatcher::with_builtin_commands();
//! let console = ExecutionContext::console(DimensionId::Overworld, DVec3::ZERO);
//! dispatcher.run_command(server, "execute as @e[type=zombie] run tag @s add seen", &console);
//! # }
//! ```

pub mod args;
pub mod callback;
pub mod commands;
pub mod condition;
pub mod context;
pub mod coords;
pub mod data;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod execute;
pub mod graph;
pub mod message;
pub mod parse;
pub mod reader;
pub mod selector;
pub mod server;
pub mod store;
pub mod transform;

pub use args::{Argument, ArgumentKind, Arguments};
pub use callback::{CallbackChain, ObserverFn, ResultCallback};
pub use condition::{Condition, ConditionKind, Outcome, Polarity, RegionMode, MAX_REGION_VOLUME};
pub use context::{rotation_towards, Anchor, Combine, ExecutionContext, OutputSink};
pub use data::{DataAccessor, DataSource, DataSourceKind};
pub use dispatch::Dispatcher;
pub use entity::{EntityId, EntityRef};
pub use error::{CommandError, CommandResult};
pub use graph::{CommandGraph, CommandNode, Edge, Executor, LeafCommand, NodeId, NodeKind};
pub use message::Message;
pub use parse::{ParsedCommand, Stage};
pub use selector::{EntitySelector, ScoreHolder, SelectorKind};
pub use server::{CommandServer, PredicateContext};
pub use store::{NumericType, StoreCallback, StoreMode, StoreTarget, StoreTargetKind};
pub use transform::{ForkTransform, RedirectTransform};

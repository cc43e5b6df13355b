//! Runs parsed commands.
//!
//! Each non-terminal stage's edge is applied to every live context, in order,
//! producing the contexts for the next stage. The terminal executor then runs
//! once per surviving context and each completion is reported through that
//! context's callback chain.
//!
//! Once a fork or gate has been crossed the command is "forked": a failure
//! then ends only the branch it happened in, and the overall result is the
//! number of branches that completed successfully. Before that point a failure
//! aborts the whole command.

use tracing::{debug, info_span, trace};

use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult};
use crate::graph::{CommandGraph, NodeId, NodeKind};
use crate::parse::{self, ParsedCommand};
use crate::server::CommandServer;

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    graph: CommandGraph,
}

impl Dispatcher {
    pub fn new(graph: CommandGraph) -> Self {
        Self { graph }
    }

    /// `execute` plus the bundled leaf commands.
    pub fn with_builtin_commands() -> Self {
        let mut graph = CommandGraph::new();
        crate::execute::register(&mut graph);
        crate::commands::register_all(&mut graph);
        Self { graph }
    }

    pub fn graph(&self) -> &CommandGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut CommandGraph {
        &mut self.graph
    }

    pub fn parse(&self, input: &str, ctx: &ExecutionContext) -> CommandResult<ParsedCommand> {
        parse::parse(&self.graph, input.strip_prefix('/').unwrap_or(input), ctx)
    }

    pub fn execute(
        &self,
        server: &mut dyn CommandServer,
        input: &str,
        ctx: &ExecutionContext,
    ) -> CommandResult<i32> {
        let parsed = self.parse(input, ctx)?;
        self.execute_parsed(server, &parsed, ctx)
    }

    pub fn execute_parsed(
        &self,
        server: &mut dyn CommandServer,
        parsed: &ParsedCommand,
        ctx: &ExecutionContext,
    ) -> CommandResult<i32> {
        let Some((terminal, hops)) = parsed.split() else {
            return Err(CommandError::UnknownCommand {
                input: parsed.input.clone(),
                cursor: 0,
            });
        };

        let mut contexts = vec![ctx.clone()];
        let mut forked = false;
        for stage in hops {
            let edge = self.graph.node(stage.node).edge;
            let mut next = Vec::with_capacity(contexts.len());
            for source in &contexts {
                match edge.apply(server, source, &stage.args) {
                    Ok(derived) => next.extend(derived),
                    Err(err) => {
                        source.on_command_complete(server, false, 0);
                        if !forked {
                            return Err(err);
                        }
                        debug!(%err, "branch dropped");
                        source.send_failure(server, err.message());
                    }
                }
            }
            trace!(
                node = %self.describe(stage.node),
                before = contexts.len(),
                after = next.len(),
                "stage applied"
            );
            forked |= edge.forks();
            contexts = next;
            if contexts.is_empty() {
                break;
            }
        }

        let Some(executor) = self.graph.node(terminal.node).executor.as_ref() else {
            return Err(CommandError::UnknownCommand {
                input: parsed.input.clone(),
                cursor: parsed.input.len(),
            });
        };
        let mut result = 0;
        let mut successes = 0;
        for branch in &contexts {
            match executor.run(server, branch, &terminal.args) {
                Ok(value) => {
                    successes += 1;
                    result = value;
                    branch.on_command_complete(server, true, value);
                }
                Err(err) => {
                    branch.on_command_complete(server, false, 0);
                    if !forked {
                        return Err(err);
                    }
                    debug!(%err, "branch failed");
                    branch.send_failure(server, err.message());
                }
            }
        }
        Ok(if forked { successes } else { result })
    }

    /// Execute and report; failures go to `ctx`'s output and yield 0.
    pub fn run_command(
        &self,
        server: &mut dyn CommandServer,
        input: &str,
        ctx: &ExecutionContext,
    ) -> i32 {
        let span = info_span!("command", source = ctx.name(), input);
        let _guard = span.enter();
        match self.execute(server, input, ctx) {
            Ok(result) => {
                debug!(result, "command finished");
                result
            }
            Err(err) => {
                debug!(%err, "command failed");
                ctx.send_failure(server, err.message());
                0
            }
        }
    }

    fn describe(&self, node: NodeId) -> String {
        match &self.graph.node(node).kind {
            NodeKind::Root => "<root>".to_string(),
            NodeKind::Literal(name) => name.clone(),
            NodeKind::Argument { name, .. } => format!("<{name}>"),
        }
    }
}

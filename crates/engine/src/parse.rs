//! Turns command text into stages over the graph.
//!
//! A stage is the run of nodes between two hops. Every stage but the last
//! ends at a node whose edge leads elsewhere; the last ends at a node with an
//! executor.

use crate::args::Arguments;
use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult};
use crate::graph::{CommandGraph, NodeId, NodeKind};
use crate::reader::StringReader;

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    /// Last node consumed in this stage.
    pub node: NodeId,
    pub args: Arguments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub input: String,
    pub stages: Vec<Stage>,
}

impl ParsedCommand {
    /// Stages that hand on to another node, then the terminal stage.
    pub fn split(&self) -> Option<(&Stage, &[Stage])> {
        self.stages.split_last()
    }
}

fn error_cursor(err: &CommandError) -> usize {
    match err {
        CommandError::Syntax { cursor, .. } | CommandError::UnknownCommand { cursor, .. } => {
            *cursor
        }
        _ => 0,
    }
}

struct Parser<'g> {
    graph: &'g CommandGraph,
    permission_level: u8,
}

impl Parser<'_> {
    fn unknown(reader: &StringReader<'_>) -> CommandError {
        CommandError::UnknownCommand {
            input: reader.input().to_string(),
            cursor: reader.cursor(),
        }
    }

    /// `node` has just been consumed; parse whatever follows it.
    fn after(
        &self,
        mut reader: StringReader<'_>,
        node: NodeId,
        stage: Arguments,
        done: &[Stage],
    ) -> CommandResult<Vec<Stage>> {
        let current = self.graph.node(node);
        if !reader.can_read() {
            if current.executor.is_none() {
                return Err(Self::unknown(&reader));
            }
            let mut stages = done.to_vec();
            stages.push(Stage { node, args: stage });
            return Ok(stages);
        }
        reader.expect_separator()?;
        if let Some(target) = current.edge.target() {
            let mut stages = done.to_vec();
            stages.push(Stage { node, args: stage });
            return self.children(reader, target, Arguments::default(), &stages);
        }
        self.children(reader, node, stage, done)
    }

    /// Try each visible child of `parent`, literals first.
    fn children(
        &self,
        reader: StringReader<'_>,
        parent: NodeId,
        stage: Arguments,
        done: &[Stage],
    ) -> CommandResult<Vec<Stage>> {
        let visible: Vec<NodeId> = self
            .graph
            .node(parent)
            .children
            .iter()
            .copied()
            .filter(|&child| self.graph.node(child).requires <= self.permission_level)
            .collect();
        let ordered = visible
            .iter()
            .filter(|&&child| self.graph.node(child).is_literal())
            .chain(
                visible
                    .iter()
                    .filter(|&&child| !self.graph.node(child).is_literal()),
            );

        let mut best: Option<CommandError> = None;
        for &child in ordered {
            let mut attempt = reader.clone();
            let outcome = match &self.graph.node(child).kind {
                NodeKind::Root => continue,
                NodeKind::Literal(name) => {
                    if attempt.peek_token() != name.as_str() {
                        continue;
                    }
                    attempt.read_token();
                    self.after(attempt, child, stage.clone(), done)
                }
                NodeKind::Argument { name, kind } => match kind.parse(&mut attempt) {
                    Ok(value) => {
                        let mut args = stage.clone();
                        args.insert(name.clone(), value);
                        self.after(attempt, child, args, done)
                    }
                    Err(err) => Err(err),
                },
            };
            match outcome {
                Ok(stages) => return Ok(stages),
                Err(err) => {
                    if best
                        .as_ref()
                        .map_or(true, |b| error_cursor(&err) > error_cursor(b))
                    {
                        best = Some(err);
                    }
                }
            }
        }
        Err(best.unwrap_or_else(|| Self::unknown(&reader)))
    }
}

/// Parse `input` against `graph` as seen by `ctx`.
pub fn parse(
    graph: &CommandGraph,
    input: &str,
    ctx: &ExecutionContext,
) -> CommandResult<ParsedCommand> {
    let parser = Parser {
        graph,
        permission_level: ctx.permission_level(),
    };
    let mut reader = StringReader::new(input);
    reader.skip_whitespace();
    if !reader.can_read() {
        return Err(Parser::unknown(&reader));
    }
    let stages = parser.children(reader, graph.root(), Arguments::default(), &[])?;
    Ok(ParsedCommand {
        input: input.to_string(),
        stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Argument, ArgumentKind};
    use crate::graph::Executor;
    use crate::transform::RedirectTransform;
    use mdcommand_core::{DVec3, DimensionId};

    fn graph() -> (CommandGraph, NodeId, NodeId) {
        let mut graph = CommandGraph::new();
        let root = graph.root();
        let say = graph.literal(root, "say");
        let message = graph.argument(say, "message", ArgumentKind::GreedyString);
        graph.executes(message, Executor::leaf(|_, _, _| Ok(1)));
        let exec = graph.literal(root, "execute");
        graph.requires(exec, 2);
        let run = graph.literal(exec, "run");
        graph.redirect(run, root, RedirectTransform::Run);
        (graph, message, run)
    }

    fn console() -> ExecutionContext {
        ExecutionContext::console(DimensionId::Overworld, DVec3::ZERO)
    }

    #[test]
    fn single_stage_command() {
        let (graph, message, _) = graph();
        let parsed = parse(&graph, "say hello world", &console()).unwrap();
        assert_eq!(parsed.stages.len(), 1);
        assert_eq!(parsed.stages[0].node, message);
        assert_eq!(
            parsed.stages[0].args.get("message"),
            Some(&Argument::String("hello world".to_string()))
        );
    }

    #[test]
    fn redirect_starts_a_new_stage() {
        let (graph, message, run) = graph();
        let parsed = parse(&graph, "execute run execute run say hi", &console()).unwrap();
        let nodes: Vec<NodeId> = parsed.stages.iter().map(|s| s.node).collect();
        assert_eq!(nodes, vec![run, run, message]);
    }

    #[test]
    fn incomplete_and_unknown_commands_fail() {
        let (graph, _, _) = graph();
        for input in ["execute run", "say", "execute", "fly away", ""] {
            assert!(
                matches!(
                    parse(&graph, input, &console()),
                    Err(CommandError::UnknownCommand { .. })
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn permission_hides_nodes() {
        let (graph, _, _) = graph();
        let player = console().with_permission_level(0);
        assert!(parse(&graph, "execute run say hi", &player).is_err());
        assert!(parse(&graph, "say hi", &player).is_ok());
    }
}

//! The command graph: plain nodes in an arena, wired by [`Edge`] values.
//!
//! A node either continues into its children ([`Edge::Pass`]) or hands the
//! rest of the input to another node through a fork, redirect, gate or store
//! edge. Nodes that can end a command carry an [`Executor`].

use std::fmt;
use std::sync::Arc;

use crate::args::{ArgumentKind, Arguments};
use crate::callback::ResultCallback;
use crate::condition::{ConditionKind, Polarity};
use crate::context::{Combine, ExecutionContext};
use crate::error::CommandResult;
use crate::server::CommandServer;
use crate::store::{StoreMode, StoreTargetKind};
use crate::transform::{ForkTransform, RedirectTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Literal(String),
    Argument { name: String, kind: ArgumentKind },
}

/// How a node passes its context on when more input follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    /// Continue into this node's own children.
    #[default]
    Pass,
    Fork {
        target: NodeId,
        transform: ForkTransform,
    },
    Redirect {
        target: NodeId,
        transform: RedirectTransform,
    },
    /// Keep the context only when the condition agrees with the polarity.
    Gate {
        target: NodeId,
        condition: ConditionKind,
        polarity: Polarity,
    },
    /// Attach a store callback to the context.
    StoreWrap {
        target: NodeId,
        mode: StoreMode,
        kind: StoreTargetKind,
    },
}

impl Edge {
    pub fn target(&self) -> Option<NodeId> {
        match *self {
            Self::Pass => None,
            Self::Fork { target, .. }
            | Self::Redirect { target, .. }
            | Self::Gate { target, .. }
            | Self::StoreWrap { target, .. } => Some(target),
        }
    }

    /// Whether this edge can yield other than exactly one context.
    pub fn forks(&self) -> bool {
        matches!(self, Self::Fork { .. } | Self::Gate { .. })
    }

    /// Contexts the rest of the command runs under.
    pub fn apply(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        args: &Arguments,
    ) -> CommandResult<Vec<ExecutionContext>> {
        match *self {
            Self::Pass => Ok(vec![ctx.clone()]),
            Self::Fork { transform, .. } => transform.apply(server, ctx, args),
            Self::Redirect { transform, .. } => Ok(vec![transform.apply(ctx, args)?]),
            Self::Gate {
                condition,
                polarity,
                ..
            } => condition.bind(args)?.gate(server, ctx, polarity),
            Self::StoreWrap { mode, kind, .. } => {
                let store = kind.bind(mode, server, ctx, args)?;
                Ok(vec![ctx.with_callback(ResultCallback::Store(store), Combine::Chain)])
            }
        }
    }
}

/// Body of a command.
pub trait LeafCommand {
    fn run(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        args: &Arguments,
    ) -> CommandResult<i32>;
}

impl<F> LeafCommand for F
where
    F: Fn(&mut dyn CommandServer, &ExecutionContext, &Arguments) -> CommandResult<i32>,
{
    fn run(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        args: &Arguments,
    ) -> CommandResult<i32> {
        self(server, ctx, args)
    }
}

#[derive(Clone)]
pub enum Executor {
    Leaf(Arc<dyn LeafCommand>),
    /// `execute if|unless ...` ending the command.
    Conditional {
        condition: ConditionKind,
        polarity: Polarity,
    },
}

impl Executor {
    pub fn leaf<F>(f: F) -> Self
    where
        F: Fn(&mut dyn CommandServer, &ExecutionContext, &Arguments) -> CommandResult<i32>
            + 'static,
    {
        Self::Leaf(Arc::new(f))
    }

    pub fn run(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        args: &Arguments,
    ) -> CommandResult<i32> {
        match self {
            Self::Leaf(leaf) => leaf.run(server, ctx, args),
            Self::Conditional {
                condition,
                polarity,
            } => condition.bind(args)?.run_terminal(server, ctx, *polarity),
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(_) => f.write_str("Leaf(..)"),
            Self::Conditional {
                condition,
                polarity,
            } => f
                .debug_struct("Conditional")
                .field("condition", condition)
                .field("polarity", polarity)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandNode {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    /// Minimum permission level to see this node.
    pub requires: u8,
    pub executor: Option<Executor>,
    pub edge: Edge,
}

impl CommandNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            requires: 0,
            executor: None,
            edge: Edge::Pass,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }
}

#[derive(Debug, Clone)]
pub struct CommandGraph {
    nodes: Vec<CommandNode>,
}

impl Default for CommandGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new(NodeKind::Root)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node ids only come from this graph, so lookups cannot miss.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child of `parent` named `name`, if it is a literal.
    pub fn find_literal(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent).children.iter().copied().find(|&child| {
            matches!(&self.node(child).kind, NodeKind::Literal(literal) if literal == name)
        })
    }

    fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::new(kind));
        self.then(parent, id);
        id
    }

    /// Literal child; an existing literal with the same name is reused.
    pub fn literal(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.find_literal(parent, name) {
            Some(existing) => existing,
            None => self.add(parent, NodeKind::Literal(name.to_string())),
        }
    }

    pub fn argument(&mut self, parent: NodeId, name: &str, kind: ArgumentKind) -> NodeId {
        self.add(
            parent,
            NodeKind::Argument {
                name: name.to_string(),
                kind,
            },
        )
    }

    /// Attach an existing node as a child of `parent`.
    pub fn then(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.node_mut(parent).children;
        if !children.contains(&child) {
            children.push(child);
        }
    }

    pub fn executes(&mut self, node: NodeId, executor: Executor) {
        self.node_mut(node).executor = Some(executor);
    }

    pub fn requires(&mut self, node: NodeId, level: u8) {
        self.node_mut(node).requires = level;
    }

    pub fn fork(&mut self, node: NodeId, target: NodeId, transform: ForkTransform) {
        self.node_mut(node).edge = Edge::Fork { target, transform };
    }

    pub fn redirect(&mut self, node: NodeId, target: NodeId, transform: RedirectTransform) {
        self.node_mut(node).edge = Edge::Redirect { target, transform };
    }

    pub fn gate(
        &mut self,
        node: NodeId,
        target: NodeId,
        condition: ConditionKind,
        polarity: Polarity,
    ) {
        self.node_mut(node).edge = Edge::Gate {
            target,
            condition,
            polarity,
        };
    }

    pub fn store(&mut self, node: NodeId, target: NodeId, mode: StoreMode, kind: StoreTargetKind) {
        self.node_mut(node).edge = Edge::StoreWrap { target, mode, kind };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_with_the_same_name_merge() {
        let mut graph = CommandGraph::new();
        let root = graph.root();
        let first = graph.literal(root, "tag");
        let second = graph.literal(root, "tag");
        assert_eq!(first, second);
        assert_eq!(graph.node(root).children, vec![first]);

        let a = graph.argument(first, "targets", ArgumentKind::Entities);
        let b = graph.argument(first, "targets", ArgumentKind::Entities);
        assert_ne!(a, b);
    }

    #[test]
    fn edges_report_targets_and_forking() {
        let mut graph = CommandGraph::new();
        let root = graph.root();
        let exec = graph.literal(root, "execute");
        let run = graph.literal(exec, "run");
        graph.redirect(run, root, RedirectTransform::Run);
        let edge = graph.node(run).edge;
        assert_eq!(edge.target(), Some(root));
        assert!(!edge.forks());
        assert!(Edge::Gate {
            target: exec,
            condition: ConditionKind::Entity,
            polarity: Polarity::If
        }
        .forks());
        assert_eq!(Edge::Pass.target(), None);
    }
}

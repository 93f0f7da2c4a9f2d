// Copyright (c) The storyport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The execution tree: an in-memory mirror of the items created in the backend.

use super::{
    identity::{NodeIdentity, NodeKind, build_reference},
    params::case_id,
    port::{ItemHandle, ItemPort},
    status::Outcome,
};
use crate::helpers::{normalize_name, now};
use indexmap::IndexMap;
use std::ops::Index;
use storyport_metadata::{
    Attribute, FinishItemRequest, Issue, LogLevel, LogRequest, Parameter, StartItemRequest,
};
use tracing::debug;

/// The index of a node in an [`ExecutionTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node in the execution tree.
///
/// Nodes are created once and kept for the lifetime of the run.
#[derive(Clone, Debug)]
pub struct Node {
    identity: NodeIdentity,
    kind: NodeKind,
    name: String,
    code_ref: String,
    case_id: String,
    parameters: Vec<Parameter>,
    handle: ItemHandle,
    outcome: Outcome,
    closed: bool,
    parent: Option<NodeId>,
    children: IndexMap<NodeIdentity, NodeId>,
}

impl Node {
    /// Returns the identity of this node among its siblings.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the display name sent to the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the code reference.
    pub fn code_ref(&self) -> &str {
        &self.code_ref
    }

    /// Returns the test case ID.
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Returns the parameters substituted into this node's name.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the backend handle for this node.
    pub fn handle(&self) -> ItemHandle {
        self.handle
    }

    /// Returns the outcome recorded when this node was closed, or `Unset` if it is still open.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns true if this node has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the parent of this node, or `None` for a top-level node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children of this node, in creation order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }
}

/// Display data for a node about to be created.
///
/// Produced lazily by the factory passed to [`ExecutionTree::fetch_or_create`].
#[derive(Clone, Debug)]
pub struct NodeSpec {
    kind: NodeKind,
    name: String,
    reference_name: Option<String>,
    parameters: Vec<Parameter>,
    attributes: Vec<Attribute>,
    description: Option<String>,
}

impl NodeSpec {
    /// Creates a new spec with the given kind and display name.
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            reference_name: None,
            parameters: Vec::new(),
            attributes: Vec::new(),
            description: None,
        }
    }

    /// Sets the name used in the code reference, if different from the display name.
    pub fn with_reference_name(mut self, reference_name: impl Into<String>) -> Self {
        self.reference_name = Some(reference_name.into());
        self
    }

    /// Sets the parameters substituted into the display name.
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the attributes attached to the item.
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the item description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// An in-memory tree of nodes, keyed by identity under each parent.
///
/// The tree memoizes every node it creates, so that repeated references to the same logical
/// node resolve to the same backend item.
#[derive(Clone, Debug)]
pub struct ExecutionTree {
    nodes: Vec<Node>,
    roots: IndexMap<NodeIdentity, NodeId>,
    max_name_length: usize,
}

impl ExecutionTree {
    /// Creates an empty tree. Names longer than `max_name_length` characters are truncated.
    pub fn new(max_name_length: usize) -> Self {
        Self {
            nodes: Vec::new(),
            roots: IndexMap::new(),
            max_name_length,
        }
    }

    /// Returns the node with the given identity under `parent`, creating it if necessary.
    ///
    /// On creation, `factory` is called to obtain the node's display data, and the item is
    /// created through `port`. If the node already exists, `factory` is not called and nothing
    /// is sent to the port.
    pub fn fetch_or_create<P, F>(
        &mut self,
        port: &mut P,
        parent: Option<NodeId>,
        identity: NodeIdentity,
        factory: F,
    ) -> NodeId
    where
        P: ItemPort + ?Sized,
        F: FnOnce() -> NodeSpec,
    {
        if let Some(existing) = self.child(parent, &identity) {
            return existing;
        }

        let NodeSpec {
            kind,
            name,
            reference_name,
            parameters,
            attributes,
            description,
        } = factory();

        let parent_node = parent.map(|id| &self.nodes[id.0]);
        let code_ref = build_reference(
            parent_node.map(|node| node.code_ref.as_str()),
            kind,
            reference_name.as_deref().unwrap_or(&name),
        );
        let case_id = case_id(&code_ref, &parameters);
        let name = normalize_name(&name, self.max_name_length).into_owned();

        let request = StartItemRequest {
            name: name.clone(),
            item_type: kind.item_type(),
            start_time: now(),
            code_ref: code_ref.clone(),
            test_case_id: Some(case_id.clone()),
            parameters: parameters.clone(),
            attributes,
            description,
        };
        let handle = port.create_item(parent_node.map(|node| node.handle), request);
        debug!(%kind, %name, %code_ref, %handle, "created item");

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            identity: identity.clone(),
            kind,
            name,
            code_ref,
            case_id,
            parameters,
            handle,
            outcome: Outcome::Unset,
            closed: false,
            parent,
            children: IndexMap::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.insert(identity, id),
            None => self.roots.insert(identity, id),
        };

        id
    }

    /// Closes a node with the given outcome.
    ///
    /// Returns false (and sends nothing) if the node was already closed.
    pub fn close<P>(
        &mut self,
        port: &mut P,
        id: NodeId,
        outcome: Outcome,
        issue: Option<Issue>,
    ) -> bool
    where
        P: ItemPort + ?Sized,
    {
        let node = &mut self.nodes[id.0];
        if node.closed {
            debug!(code_ref = %node.code_ref, "item already closed, ignoring");
            return false;
        }

        port.close_item(
            node.handle,
            FinishItemRequest {
                end_time: now(),
                status: outcome.to_status(),
                issue,
            },
        );
        debug!(code_ref = %node.code_ref, %outcome, "closed item");
        node.outcome = outcome;
        node.closed = true;
        true
    }

    /// Folds the node's own outcome with the outcomes of its children.
    pub fn fold(&self, id: NodeId) -> Outcome {
        let node = &self.nodes[id.0];
        Outcome::fold(
            node.outcome,
            node.children.values().map(|child| self.nodes[child.0].outcome),
        )
    }

    /// Attaches a log message to a node.
    pub fn emit_log<P>(
        &self,
        port: &mut P,
        id: NodeId,
        level: LogLevel,
        message: impl Into<String>,
    ) where
        P: ItemPort + ?Sized,
    {
        port.emit_log(
            self.nodes[id.0].handle,
            LogRequest {
                level,
                message: message.into(),
                time: now(),
            },
        );
    }

    /// Looks up the node with the given identity under `parent` without creating it.
    pub fn child(&self, parent: Option<NodeId>, identity: &NodeIdentity) -> Option<NodeId> {
        match parent {
            Some(parent) => self.nodes[parent.0].children.get(identity).copied(),
            None => self.roots.get(identity).copied(),
        }
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the top-level nodes, in creation order.
    pub fn roots(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.roots.values().copied()
    }

    /// Returns all nodes in creation order.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = (NodeId, &Node)> + ExactSizeIterator + '_ {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no nodes have been created.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns nodes that were created but never closed, children before their parents.
    pub fn open_nodes(&self) -> Vec<NodeId> {
        // Parents are always created before their children, so reverse creation order visits
        // every child before its parent.
        self.iter()
            .rev()
            .filter(|(_, node)| !node.closed)
            .map(|(id, _)| id)
            .collect()
    }
}

impl Index<NodeId> for ExecutionTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
    }
}

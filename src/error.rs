use thiserror::Error;

use crate::circuit::{ComponentId, NodeId, WireId};
use crate::gate::ComponentKind;

/// Errors raised by the build API and by snapshot loading.
///
/// Every operation that returns one of these leaves the model exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("input node {node:?} already has an incoming wire")]
    DuplicateConnection { node: NodeId },

    #[error("{kind} does not accept arity {arity}")]
    InvalidArity { kind: ComponentKind, arity: usize },

    #[error("wire must run from an output node to an input node (got {source_node:?} -> {dest_node:?})")]
    InvalidEndpointRole { source_node: NodeId, dest_node: NodeId },

    #[error("wire endpoints {source_node:?} and {dest_node:?} belong to the same component")]
    SelfLoop { source_node: NodeId, dest_node: NodeId },

    #[error("unknown component kind '{0}'")]
    UnknownComponentKind(String),

    #[error("wire #{wire} refers to a missing component or port")]
    DanglingReference { wire: usize },

    #[error("unknown component {0:?}")]
    UnknownComponent(ComponentId),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("unknown wire {0:?}")]
    UnknownWire(WireId),

    #[error("component {component:?} has no input port {port}")]
    UnknownPort { component: ComponentId, port: usize },

    #[error("malformed circuit document: {0}")]
    Format(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Format(err.to_string())
    }
}

/// Errors returned by the engine control API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("topology is locked while {pending} events are pending")]
    Busy { pending: usize },

    #[error("component {0:?} is not a source")]
    NotASource(ComponentId),

    #[error("unknown component {0:?}")]
    UnknownComponent(ComponentId),

    #[error("invalid engine configuration: {0}")]
    Config(String),
}

/// Evaluator faults. These never leave the scheduler; they turn into a faulted status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("{kind} cannot evaluate {inputs} inputs")]
    ArityMismatch { kind: ComponentKind, inputs: usize },
}

pub mod circuit_builder;
pub mod circuit_sim;
pub mod components;
pub mod config;
pub mod error;
pub mod event;
pub mod gate;
pub mod persist;

mod circuit;
pub use circuit::{CircuitModel, Component, ComponentId, Direction, Node, NodeId, Wire, WireId};
pub use circuit_sim::{RunReport, SimulationEngine, Status, StepResult, Steps};
pub use config::EngineConfig;
pub use error::{EngineError, EvalError, ModelError};
pub use event::{EventKind, NoObserver, Observer, StepEvent, Target, TraceRecorder};
pub use gate::{ComponentKind, GateKind};

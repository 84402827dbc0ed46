use std::{cell::RefCell, rc::Rc};

use crate::circuit::{CircuitModel, ComponentId};
use crate::error::ModelError;
use crate::gate::ComponentKind;

pub type SharedBuilder = Rc<RefCell<CircuitBuilder>>;

/// Thin layer over [CircuitModel] for wiring circuits out of expressions.
#[derive(Default)]
pub struct CircuitBuilder {
    pub model: CircuitModel,
}

impl CircuitBuilder {
    pub fn shared() -> SharedBuilder {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Takes the finished model out of a shared builder, leaving it empty.
    pub fn finish(builder: &SharedBuilder) -> CircuitModel {
        std::mem::take(&mut builder.borrow_mut().model)
    }
}

/// Handle on the output of one component while building.
#[derive(Clone)]
pub struct Connector {
    builder: SharedBuilder,
    pub component: ComponentId,
}

impl Connector {
    fn from_component(builder: SharedBuilder, component: ComponentId) -> Self {
        Connector { builder, component }
    }

    /// A new source component.
    pub fn source(builder: &SharedBuilder) -> Result<Self, ModelError> {
        let component = builder
            .borrow_mut()
            .model
            .add_component(ComponentKind::Source, None)?;
        Ok(Self::from_component(builder.clone(), component))
    }

    fn gate_gen(kind: ComponentKind, inputs: &[&Self]) -> Result<Self, ModelError> {
        let first = inputs.first().ok_or(ModelError::InvalidArity { kind, arity: 0 })?;
        let builder = first.builder.clone();
        let mut builder_mut = builder.borrow_mut();
        let component = builder_mut.model.add_component(kind, Some(inputs.len()))?;
        for (port, input) in inputs.iter().enumerate() {
            assert!(Rc::ptr_eq(&builder, &input.builder));
            builder_mut.model.connect(input.component, component, port)?;
        }
        drop(builder_mut);
        Ok(Self::from_component(builder, component))
    }

    pub fn invert(&self) -> Result<Self, ModelError> {
        Self::gate_gen(ComponentKind::NOT, &[self])
    }

    /// Terminates this connector in a new sink and returns the sink's id.
    pub fn sink(&self) -> Result<ComponentId, ModelError> {
        let mut builder = self.builder.borrow_mut();
        let sink = builder.model.add_component(ComponentKind::Sink, None)?;
        builder.model.connect(self.component, sink, 0)?;
        Ok(sink)
    }

    pub fn label(&self, label: &str) -> Result<&Self, ModelError> {
        self.builder
            .borrow_mut()
            .model
            .set_label(self.component, Some(label.to_string()))?;
        Ok(self)
    }

    /// Feeds this connector into input `port` of `target`.
    pub fn connect(&self, target: &Connector, port: usize) -> Result<(), ModelError> {
        self.builder
            .borrow_mut()
            .model
            .connect(self.component, target.component, port)?;
        Ok(())
    }
}

pub mod ops {
    use crate::error::ModelError;
    use crate::gate::ComponentKind;

    use super::Connector;

    pub use crate::{and, nand, nor, or, xnor, xor};

    macro_rules! gate_fn_gen {
        ( $gate_lowercase:ident, $gate_uppercase:ident ) => {
            pub fn $gate_lowercase(inputs: Vec<&Connector>) -> Result<Connector, ModelError> {
                Connector::gate_gen(ComponentKind::$gate_uppercase, &inputs)
            }
        };
    }

    gate_fn_gen!(or, OR);
    gate_fn_gen!(nor, NOR);
    gate_fn_gen!(and, AND);
    gate_fn_gen!(nand, NAND);
    gate_fn_gen!(xor, XOR);
    gate_fn_gen!(xnor, XNOR);

    #[macro_export]
    macro_rules! or {
        ( $( $inputs:expr ),+ ) => {
            or(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! nor {
        ( $( $inputs:expr ),+ ) => {
            nor(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! and {
        ( $( $inputs:expr ),+ ) => {
            and(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! nand {
        ( $( $inputs:expr ),+ ) => {
            nand(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xor {
        ( $( $inputs:expr ),+ ) => {
            xor(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xnor {
        ( $( $inputs:expr ),+ ) => {
            xnor(vec!($(&$inputs),+))
        };
    }
}

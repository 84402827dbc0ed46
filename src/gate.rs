use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{EvalError, ModelError};

/// Widest fan-in a multi-input gate may be created with.
pub const MAX_GATE_ARITY: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    And,
    Or,
    Not,
    Xor,
    Nand,
    Nor,
    Xnor,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Source,
    Sink,
    Gate(GateKind),
}

// Every gate is one of three reductions over its inputs, optionally inverted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum GateFamily {
    OrNor,
    AndNand,
    XorXnor,
}

impl GateKind {
    pub const ALL: [GateKind; 7] = [
        GateKind::And,
        GateKind::Or,
        GateKind::Not,
        GateKind::Xor,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xnor,
    ];

    fn family(self) -> (GateFamily, bool) {
        match self {
            GateKind::Or => (GateFamily::OrNor, false),
            GateKind::Nor => (GateFamily::OrNor, true),
            // NOT is a single-input NOR
            GateKind::Not => (GateFamily::OrNor, true),
            GateKind::And => (GateFamily::AndNand, false),
            GateKind::Nand => (GateFamily::AndNand, true),
            GateKind::Xor => (GateFamily::XorXnor, false),
            GateKind::Xnor => (GateFamily::XorXnor, true),
        }
    }

    pub fn arity_range(self) -> RangeInclusive<usize> {
        match self {
            GateKind::Not => 1..=1,
            _ => 2..=MAX_GATE_ARITY,
        }
    }

    /// Evaluates the gate over its ordered input bits.
    ///
    /// XOR and XNOR generalize by parity: XOR is high on an odd number of high
    /// inputs, XNOR on an even number.
    pub fn evaluate(self, inputs: &[bool]) -> Result<bool, EvalError> {
        if !self.arity_range().contains(&inputs.len()) {
            return Err(EvalError::ArityMismatch {
                kind: ComponentKind::Gate(self),
                inputs: inputs.len(),
            });
        }
        let (family, inverted) = self.family();
        let reduced = match family {
            GateFamily::OrNor => inputs.iter().any(|input| *input),
            GateFamily::AndNand => inputs.iter().all(|input| *input),
            GateFamily::XorXnor => inputs.iter().filter(|input| **input).count() % 2 == 1,
        };
        Ok(inverted ^ reduced)
    }

    pub fn name(self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Not => "NOT",
            GateKind::Xor => "XOR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xnor => "XNOR",
        }
    }
}

impl ComponentKind {
    pub const AND: Self = ComponentKind::Gate(GateKind::And);
    pub const OR: Self = ComponentKind::Gate(GateKind::Or);
    pub const NOT: Self = ComponentKind::Gate(GateKind::Not);
    pub const XOR: Self = ComponentKind::Gate(GateKind::Xor);
    pub const NAND: Self = ComponentKind::Gate(GateKind::Nand);
    pub const NOR: Self = ComponentKind::Gate(GateKind::Nor);
    pub const XNOR: Self = ComponentKind::Gate(GateKind::Xnor);

    /// Allowed number of input nodes.
    pub fn arity_range(self) -> RangeInclusive<usize> {
        match self {
            ComponentKind::Source => 0..=0,
            ComponentKind::Sink => 1..=1,
            ComponentKind::Gate(gate) => gate.arity_range(),
        }
    }

    pub fn default_arity(self) -> usize {
        *self.arity_range().start()
    }

    pub fn accepts_arity(self, arity: usize) -> bool {
        self.arity_range().contains(&arity)
    }

    pub fn output_count(self) -> usize {
        match self {
            ComponentKind::Sink => 0,
            _ => 1,
        }
    }

    pub fn gate(self) -> Option<GateKind> {
        match self {
            ComponentKind::Gate(gate) => Some(gate),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Source => "SOURCE",
            ComponentKind::Sink => "SINK",
            ComponentKind::Gate(gate) => gate.name(),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_uppercase().as_str() {
            "SOURCE" => ComponentKind::Source,
            "SINK" => ComponentKind::Sink,
            "AND" => ComponentKind::AND,
            "OR" => ComponentKind::OR,
            "NOT" => ComponentKind::NOT,
            "XOR" => ComponentKind::XOR,
            "NAND" => ComponentKind::NAND,
            "NOR" => ComponentKind::NOR,
            "XNOR" => ComponentKind::XNOR,
            _ => return Err(ModelError::UnknownComponentKind(s.to_string())),
        };
        Ok(kind)
    }
}

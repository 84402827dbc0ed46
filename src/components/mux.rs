use crate::{
    circuit_builder::{ops::*, Connector},
    error::ModelError,
    gate::{ComponentKind, MAX_GATE_ARITY},
};

/// One-hot decoder: line `i` is high when the select bits spell `i`.
pub fn create_decoder(select: &[Connector]) -> Result<Vec<Connector>, ModelError> {
    let lines = 1usize << select.len();
    if select.is_empty() || lines > MAX_GATE_ARITY {
        return Err(ModelError::InvalidArity {
            kind: ComponentKind::OR,
            arity: lines,
        });
    }
    let inverted = select
        .iter()
        .map(Connector::invert)
        .collect::<Result<Vec<_>, _>>()?;
    if let [bit] = select {
        return Ok(vec![inverted[0].clone(), bit.clone()]);
    }

    (0..lines)
        .map(|line| {
            let terms = select
                .iter()
                .zip(&inverted)
                .enumerate()
                .map(|(i, (pos, neg))| if line & (1 << i) != 0 { pos } else { neg })
                .collect();
            and(terms)
        })
        .collect()
}

pub fn create_n_to_1_mux(inputs: &[Connector], select: &[Connector]) -> Result<Connector, ModelError> {
    if inputs.len() < 2 || inputs.len() > (1 << select.len()) {
        return Err(ModelError::InvalidArity {
            kind: ComponentKind::OR,
            arity: inputs.len(),
        });
    }
    let decoded = create_decoder(select)?;
    let gated = inputs
        .iter()
        .zip(&decoded)
        .map(|(input, enable)| and!(input.clone(), enable.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    or(gated.iter().collect())
}

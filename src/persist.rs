//! Storage-neutral snapshot of a circuit.
//!
//! Wires are recorded by component index and port index rather than by id, so a
//! snapshot loads into a fresh model whose ids need not match the saved ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::circuit::{CircuitModel, ComponentId};
use crate::error::ModelError;
use crate::gate::ComponentKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub id: u32,
    /// Upper-case kind name, parsed on load.
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub arity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_state: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub from_component_index: usize,
    pub from_port_index: usize,
    pub to_component_index: usize,
    pub to_port_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub components: Vec<ComponentRecord>,
    pub wires: Vec<WireRecord>,
}

impl CircuitModel {
    pub fn serialize(&self) -> CircuitSnapshot {
        let index: HashMap<ComponentId, usize> = self
            .components()
            .enumerate()
            .map(|(i, component)| (component.id(), i))
            .collect();

        let components = self
            .components()
            .map(|component| {
                let (x, y) = component.position();
                ComponentRecord {
                    id: component.id().0,
                    kind: component.kind().to_string(),
                    x,
                    y,
                    label: component.label().map(str::to_string),
                    arity: component.arity(),
                    source_state: (component.kind() == ComponentKind::Source)
                        .then(|| component.source_state()),
                }
            })
            .collect();

        let wires = self
            .wires()
            .filter_map(|wire| {
                let from = self.node(wire.source())?;
                let to = self.node(wire.dest())?;
                Some(WireRecord {
                    from_component_index: *index.get(&from.component())?,
                    from_port_index: from.port(),
                    to_component_index: *index.get(&to.component())?,
                    to_port_index: to.port(),
                })
            })
            .collect();

        CircuitSnapshot { components, wires }
    }

    /// Builds a new model from a snapshot.
    ///
    /// Components are created with their final arity and label before any wire
    /// is connected. A wire naming a missing component or port rejects the
    /// whole load.
    pub fn deserialize(snapshot: &CircuitSnapshot) -> Result<CircuitModel, ModelError> {
        let mut model = CircuitModel::new();
        let mut ids = Vec::with_capacity(snapshot.components.len());
        for record in &snapshot.components {
            let kind: ComponentKind = record.kind.parse()?;
            let id = model.add_component(kind, Some(record.arity))?;
            model.set_label(id, record.label.clone())?;
            model.set_position(id, record.x, record.y)?;
            if let (ComponentKind::Source, Some(state)) = (kind, record.source_state) {
                if let Some(component) = model.component_mut(id) {
                    component.source_state = state;
                }
            }
            ids.push(id);
        }

        for (i, wire) in snapshot.wires.iter().enumerate() {
            let dangling = ModelError::DanglingReference { wire: i };
            let from = *ids.get(wire.from_component_index).ok_or(dangling.clone())?;
            let to = *ids.get(wire.to_component_index).ok_or(dangling.clone())?;
            let source = *model
                .outputs(from)?
                .get(wire.from_port_index)
                .ok_or(dangling.clone())?;
            let dest = *model
                .inputs(to)?
                .get(wire.to_port_index)
                .ok_or(dangling)?;
            model.add_wire(source, dest)?;
        }
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    pub fn from_json(json: &str) -> Result<CircuitModel, ModelError> {
        let snapshot: CircuitSnapshot = serde_json::from_str(json)?;
        Self::deserialize(&snapshot)
    }
}

use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::gate::ComponentKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireId(pub(crate) u32);

impl ComponentId {
    /// Placeholder for arrays that are filled in after construction.
    pub const NULL: Self = ComponentId(u32::MAX);
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::NULL
    }
}

// Ids are handed out per model and never reused, so a stale handle can only miss.
#[derive(Debug, Default, Clone)]
struct IdBuilder {
    next_component: u32,
    next_node: u32,
    next_wire: u32,
}

impl IdBuilder {
    fn component(&mut self) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;
        id
    }

    fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn wire(&mut self) -> WireId {
        let id = WireId(self.next_wire);
        self.next_wire += 1;
        id
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    component: ComponentId,
    direction: Direction,
    port: usize,
    pub(crate) state: Option<bool>,
    wires: Vec<WireId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Position of this node in its component's input or output list.
    pub fn port(&self) -> usize {
        self.port
    }

    /// Last simulated value, `None` until the engine has written it.
    pub fn state(&self) -> Option<bool> {
        self.state
    }

    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Wire {
    id: WireId,
    source: NodeId,
    dest: NodeId,
    pub(crate) state: Option<bool>,
}

impl Wire {
    pub fn id(&self) -> WireId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn dest(&self) -> NodeId {
        self.dest
    }

    pub fn state(&self) -> Option<bool> {
        self.state
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    id: ComponentId,
    kind: ComponentKind,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    pub(crate) source_state: bool,
    pub(crate) sink_value: Option<bool>,
    label: Option<String>,
    x: f64,
    y: f64,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn output(&self) -> Option<NodeId> {
        self.outputs.first().copied()
    }

    /// Externally set bit of a source. Always `false` for other kinds.
    pub fn source_state(&self) -> bool {
        self.source_state
    }

    /// Value observed by a sink on its last recalculation.
    pub fn sink_value(&self) -> Option<bool> {
        self.sink_value
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Authoritative topology store: components, their nodes, and the wires between them.
#[derive(Clone, Debug, Default)]
pub struct CircuitModel {
    ids: IdBuilder,
    components: BTreeMap<ComponentId, Component>,
    nodes: BTreeMap<NodeId, Node>,
    wires: BTreeMap<WireId, Wire>,
}

impl CircuitModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a component with `arity` input nodes, or the kind's default when `None`.
    pub fn add_component(
        &mut self,
        kind: ComponentKind,
        arity: Option<usize>,
    ) -> Result<ComponentId, ModelError> {
        let arity = arity.unwrap_or_else(|| kind.default_arity());
        if !kind.accepts_arity(arity) {
            return Err(ModelError::InvalidArity { kind, arity });
        }

        let id = self.ids.component();
        let inputs = (0..arity)
            .map(|port| self.create_node(id, Direction::Input, port))
            .collect();
        let outputs = (0..kind.output_count())
            .map(|port| self.create_node(id, Direction::Output, port))
            .collect();
        self.components.insert(
            id,
            Component {
                id,
                kind,
                inputs,
                outputs,
                source_state: false,
                sink_value: None,
                label: None,
                x: 0.0,
                y: 0.0,
            },
        );
        Ok(id)
    }

    fn create_node(&mut self, component: ComponentId, direction: Direction, port: usize) -> NodeId {
        let id = self.ids.node();
        self.nodes.insert(
            id,
            Node {
                id,
                component,
                direction,
                port,
                state: None,
                wires: Vec::new(),
            },
        );
        id
    }

    /// Connects an output node to an input node.
    pub fn add_wire(&mut self, source: NodeId, dest: NodeId) -> Result<WireId, ModelError> {
        let source_node = self.node(source).ok_or(ModelError::UnknownNode(source))?;
        let dest_node = self.node(dest).ok_or(ModelError::UnknownNode(dest))?;
        if source_node.direction != Direction::Output || dest_node.direction != Direction::Input {
            return Err(ModelError::InvalidEndpointRole {
                source_node: source,
                dest_node: dest,
            });
        }
        if source_node.component == dest_node.component {
            return Err(ModelError::SelfLoop {
                source_node: source,
                dest_node: dest,
            });
        }
        if !dest_node.wires.is_empty() {
            return Err(ModelError::DuplicateConnection { node: dest });
        }

        let id = self.ids.wire();
        self.wires.insert(
            id,
            Wire {
                id,
                source,
                dest,
                state: None,
            },
        );
        for node_id in [source, dest] {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.wires.push(id);
            }
        }
        Ok(id)
    }

    /// Wires the single output of `from` into input `port` of `to`.
    pub fn connect(
        &mut self,
        from: ComponentId,
        to: ComponentId,
        port: usize,
    ) -> Result<WireId, ModelError> {
        let source = self
            .component(from)
            .ok_or(ModelError::UnknownComponent(from))?
            .output()
            .ok_or(ModelError::InvalidEndpointRole {
                source_node: self.first_node(from),
                dest_node: self.first_node(to),
            })?;
        let dest = self.input(to, port)?;
        self.add_wire(source, dest)
    }

    // Best-effort node for error reporting on components without the expected port.
    fn first_node(&self, id: ComponentId) -> NodeId {
        self.component(id)
            .and_then(|component| component.inputs.first().or(component.outputs.first()))
            .copied()
            .unwrap_or(NodeId(u32::MAX))
    }

    pub fn remove_wire(&mut self, id: WireId) -> Result<(), ModelError> {
        let wire = self.wires.remove(&id).ok_or(ModelError::UnknownWire(id))?;
        for node_id in [wire.source, wire.dest] {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.wires.retain(|wire_id| *wire_id != id);
            }
        }
        Ok(())
    }

    /// Removes a component together with every wire touching its nodes.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<(), ModelError> {
        let component = self
            .components
            .get(&id)
            .ok_or(ModelError::UnknownComponent(id))?;
        let node_ids: Vec<NodeId> = component
            .inputs
            .iter()
            .chain(component.outputs.iter())
            .copied()
            .collect();
        let attached: Vec<WireId> = node_ids
            .iter()
            .filter_map(|node_id| self.nodes.get(node_id))
            .flat_map(|node| node.wires.iter().copied())
            .collect();
        for wire_id in attached {
            self.remove_wire(wire_id)?;
        }
        for node_id in node_ids {
            self.nodes.remove(&node_id);
        }
        self.components.remove(&id);
        Ok(())
    }

    pub fn set_label(&mut self, id: ComponentId, label: Option<String>) -> Result<(), ModelError> {
        self.components
            .get_mut(&id)
            .ok_or(ModelError::UnknownComponent(id))?
            .label = label;
        Ok(())
    }

    pub fn set_position(&mut self, id: ComponentId, x: f64, y: f64) -> Result<(), ModelError> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or(ModelError::UnknownComponent(id))?;
        component.x = x;
        component.y = y;
        Ok(())
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    /// Components in creation order.
    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.values()
    }

    /// Wires in creation order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> + '_ {
        self.wires.values()
    }

    pub fn sources(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components
            .values()
            .filter(|component| component.kind == ComponentKind::Source)
            .map(|component| component.id)
    }

    pub fn wires_of(&self, node: NodeId) -> Result<&[WireId], ModelError> {
        self.node(node)
            .map(|node| node.wires.as_slice())
            .ok_or(ModelError::UnknownNode(node))
    }

    pub fn incoming_wire(&self, node: NodeId) -> Option<WireId> {
        self.node(node)
            .filter(|node| node.direction == Direction::Input)
            .and_then(|node| node.wires.first().copied())
    }

    pub fn inputs(&self, id: ComponentId) -> Result<&[NodeId], ModelError> {
        self.component(id)
            .map(|component| component.inputs.as_slice())
            .ok_or(ModelError::UnknownComponent(id))
    }

    pub fn outputs(&self, id: ComponentId) -> Result<&[NodeId], ModelError> {
        self.component(id)
            .map(|component| component.outputs.as_slice())
            .ok_or(ModelError::UnknownComponent(id))
    }

    pub fn input(&self, id: ComponentId, port: usize) -> Result<NodeId, ModelError> {
        let component = self.component(id).ok_or(ModelError::UnknownComponent(id))?;
        component
            .inputs
            .get(port)
            .copied()
            .ok_or(ModelError::UnknownPort {
                component: id,
                port,
            })
    }

    pub fn output(&self, id: ComponentId) -> Result<NodeId, ModelError> {
        let component = self.component(id).ok_or(ModelError::UnknownComponent(id))?;
        component.output().ok_or(ModelError::InvalidEndpointRole {
            source_node: self.first_node(id),
            dest_node: self.first_node(id),
        })
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn wire_mut(&mut self, id: WireId) -> Option<&mut Wire> {
        self.wires.get_mut(&id)
    }

    /// Forgets every simulated value. Source bits and topology are kept.
    pub(crate) fn clear_derived_state(&mut self) {
        self.nodes.values_mut().for_each(|node| node.state = None);
        self.wires.values_mut().for_each(|wire| wire.state = None);
        self.components
            .values_mut()
            .for_each(|component| component.sink_value = None);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn and_with_sources(model: &mut CircuitModel) -> (ComponentId, ComponentId, ComponentId) {
        let a = model.add_component(ComponentKind::Source, None).unwrap();
        let b = model.add_component(ComponentKind::Source, None).unwrap();
        let and = model.add_component(ComponentKind::AND, Some(2)).unwrap();
        model.connect(a, and, 0).unwrap();
        model.connect(b, and, 1).unwrap();
        (a, b, and)
    }

    #[test]
    fn component_shapes() {
        let mut model = CircuitModel::new();
        let source = model.add_component(ComponentKind::Source, None).unwrap();
        let sink = model.add_component(ComponentKind::Sink, None).unwrap();
        let not = model.add_component(ComponentKind::NOT, None).unwrap();
        let xor = model.add_component(ComponentKind::XOR, Some(5)).unwrap();

        assert_eq!(model.inputs(source).unwrap().len(), 0);
        assert_eq!(model.outputs(source).unwrap().len(), 1);
        assert_eq!(model.inputs(sink).unwrap().len(), 1);
        assert_eq!(model.outputs(sink).unwrap().len(), 0);
        assert_eq!(model.component(not).unwrap().arity(), 1);
        assert_eq!(model.component(xor).unwrap().arity(), 5);

        let ports: Vec<usize> = model
            .inputs(xor)
            .unwrap()
            .iter()
            .map(|node| model.node(*node).unwrap().port())
            .collect();
        assert_eq!(ports, vec![0, 1, 2, 3, 4]);
        assert_eq!(model.sources().collect::<Vec<_>>(), vec![source]);
    }

    #[test]
    fn invalid_arity_is_rejected() {
        let mut model = CircuitModel::new();
        assert_eq!(
            model.add_component(ComponentKind::AND, Some(9)),
            Err(ModelError::InvalidArity {
                kind: ComponentKind::AND,
                arity: 9
            })
        );
        assert!(model.add_component(ComponentKind::NOT, Some(2)).is_err());
        assert!(model.add_component(ComponentKind::OR, Some(1)).is_err());
        assert!(model.add_component(ComponentKind::Source, Some(1)).is_err());
        assert!(model.is_empty());
    }

    #[test]
    fn wire_validation() {
        let mut model = CircuitModel::new();
        let (a, b, and) = and_with_sources(&mut model);
        let and_in = model.input(and, 0).unwrap();
        let and_out = model.output(and).unwrap();
        let a_out = model.output(a).unwrap();
        let b_out = model.output(b).unwrap();

        assert_eq!(
            model.add_wire(b_out, and_in),
            Err(ModelError::DuplicateConnection { node: and_in })
        );
        assert_eq!(
            model.add_wire(and_in, a_out),
            Err(ModelError::InvalidEndpointRole {
                source_node: and_in,
                dest_node: a_out
            })
        );
        assert_eq!(
            model.add_wire(a_out, b_out),
            Err(ModelError::InvalidEndpointRole {
                source_node: a_out,
                dest_node: b_out
            })
        );
        assert_eq!(
            model.add_wire(and_out, and_in),
            Err(ModelError::SelfLoop {
                source_node: and_out,
                dest_node: and_in
            })
        );
        assert_eq!(model.wire_count(), 2);
    }

    #[test]
    fn fan_out_and_queries() {
        let mut model = CircuitModel::new();
        let (a, _, and) = and_with_sources(&mut model);
        let not = model.add_component(ComponentKind::NOT, None).unwrap();
        let w = model.connect(a, not, 0).unwrap();

        let a_out = model.output(a).unwrap();
        assert_eq!(model.wires_of(a_out).unwrap().len(), 2);
        assert_eq!(model.incoming_wire(model.input(not, 0).unwrap()), Some(w));
        assert_eq!(model.incoming_wire(a_out), None);
        let wire = model.wire(w).unwrap();
        assert_eq!(wire.source(), a_out);
        assert_eq!(model.node(wire.dest()).unwrap().component(), not);
        assert_eq!(
            model.input(and, 2),
            Err(ModelError::UnknownPort {
                component: and,
                port: 2
            })
        );
        assert_eq!(
            model.connect(a, and, 5),
            Err(ModelError::UnknownPort {
                component: and,
                port: 5
            })
        );
        assert_eq!(model.wire_count(), 3);
    }

    #[test]
    fn removing_a_component_cascades() {
        let mut model = CircuitModel::new();
        let (a, b, and) = and_with_sources(&mut model);
        let sink = model.add_component(ComponentKind::Sink, None).unwrap();
        model.connect(and, sink, 0).unwrap();
        assert_eq!(model.wire_count(), 3);

        model.remove_component(and).unwrap();
        assert_eq!(model.wire_count(), 0);
        assert!(model.component(and).is_none());
        assert!(model.wires_of(model.output(a).unwrap()).unwrap().is_empty());
        assert!(model.wires_of(model.output(b).unwrap()).unwrap().is_empty());
        assert_eq!(model.incoming_wire(model.input(sink, 0).unwrap()), None);
        assert_eq!(
            model.remove_component(and),
            Err(ModelError::UnknownComponent(and))
        );
    }

    #[test]
    fn removing_a_wire_frees_the_input() {
        let mut model = CircuitModel::new();
        let (a, b, and) = and_with_sources(&mut model);
        let and_in = model.input(and, 0).unwrap();
        let w = model.incoming_wire(and_in).unwrap();
        model.remove_wire(w).unwrap();
        assert_eq!(model.remove_wire(w), Err(ModelError::UnknownWire(w)));
        assert!(model.wires_of(model.output(a).unwrap()).unwrap().is_empty());
        model.connect(b, and, 0).unwrap();
        assert_eq!(model.wires_of(model.output(b).unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn ids_are_per_model() {
        let mut first = CircuitModel::new();
        let mut second = CircuitModel::new();
        let x = first.add_component(ComponentKind::Source, None).unwrap();
        let y = second.add_component(ComponentKind::Source, None).unwrap();
        assert_eq!(x, y);
        first.remove_component(x).unwrap();
        let z = first.add_component(ComponentKind::Source, None).unwrap();
        assert_ne!(x, z);
    }

    #[test]
    fn labels_and_positions() {
        let mut model = CircuitModel::new();
        let a = model.add_component(ComponentKind::Source, None).unwrap();
        model.set_label(a, Some("A".to_string())).unwrap();
        model.set_position(a, 10.0, -4.5).unwrap();
        let component = model.component(a).unwrap();
        assert_eq!(component.label(), Some("A"));
        assert_eq!(component.position(), (10.0, -4.5));
    }
}

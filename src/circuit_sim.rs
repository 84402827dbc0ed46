use std::collections::{HashSet, VecDeque};

use tracing::{debug, error, trace, warn};

use crate::circuit::{CircuitModel, Component, ComponentId, WireId};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event::{Event, NoObserver, Observer, StepEvent, Target};
use crate::gate::ComponentKind;

pub type Steps = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Stable,
    OscillationLimit,
    /// An event could not be evaluated. Carries the component (or wire) at fault.
    Faulted(Target),
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Stable | Status::OscillationLimit | Status::Faulted(_)
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub status: Status,
    /// Events processed by this call.
    pub steps: Steps,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// Nothing was queued.
    Idle,
    Stepped { event: StepEvent, status: Status },
    /// The drain stopped without producing an event (step cap or fault).
    Halted(Status),
}

/// FIFO discrete-event scheduler over a [CircuitModel].
///
/// The engine owns the model and is the only writer of node, wire and sink state.
/// Topology edits go through [SimulationEngine::model_mut], which is refused while
/// events are pending.
pub struct SimulationEngine<O: Observer = NoObserver> {
    model: CircuitModel,
    queue: VecDeque<Event>,
    status: Status,
    steps: Steps,
    // False until a full rebuild has been seeded, and again after anything that
    // invalidates the derived state (reset, edits, halts).
    primed: bool,
    config: EngineConfig,
    observer: O,
}

impl SimulationEngine<NoObserver> {
    pub fn new(model: CircuitModel) -> Self {
        Self::with_observer(model, EngineConfig::default(), NoObserver)
    }

    pub fn with_config(model: CircuitModel, config: EngineConfig) -> Self {
        Self::with_observer(model, config, NoObserver)
    }
}

impl<O: Observer> SimulationEngine<O> {
    pub fn with_observer(model: CircuitModel, config: EngineConfig, observer: O) -> Self {
        Self {
            model,
            queue: VecDeque::new(),
            status: Status::Idle,
            steps: 0,
            primed: false,
            config,
            observer,
        }
    }

    pub fn model(&self) -> &CircuitModel {
        &self.model
    }

    /// Mutable access for topology edits. The next run after an edit is a full rebuild.
    pub fn model_mut(&mut self) -> Result<&mut CircuitModel, EngineError> {
        if !self.queue.is_empty() {
            return Err(EngineError::Busy {
                pending: self.queue.len(),
            });
        }
        self.primed = false;
        Ok(&mut self.model)
    }

    pub fn into_model(self) -> CircuitModel {
        self.model
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Events processed since the current drain started.
    pub fn steps(&self) -> Steps {
        self.steps
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn sink_value(&self, id: ComponentId) -> Option<bool> {
        self.model.component(id).and_then(|component| component.sink_value())
    }

    /// Current value on a component's output node.
    pub fn output_state(&self, id: ComponentId) -> Option<bool> {
        let output = self.model.component(id)?.output()?;
        self.model.node(output)?.state()
    }

    fn enqueue(&mut self, event: Event) {
        if self.queue.is_empty() {
            self.steps = 0;
        }
        self.status = Status::Running;
        self.queue.push_back(event);
    }

    /// Seeds a full rebuild without draining.
    ///
    /// Sources go first, then every component with a floating input, then
    /// anything those cannot reach (closed feedback rings). An acyclic circuit is
    /// always fully reachable from the first two groups.
    pub fn start_run(&mut self) {
        debug!(
            components = self.model.component_count(),
            wires = self.model.wire_count(),
            "seeding full rebuild"
        );
        self.queue.clear();
        self.model.clear_derived_state();
        for event in self.rebuild_seeds() {
            self.enqueue(event);
        }
        if self.queue.is_empty() {
            self.status = Status::Stable;
        }
        self.primed = true;
    }

    fn rebuild_seeds(&self) -> Vec<Event> {
        let model = &self.model;
        let floating = |component: &Component| {
            component
                .inputs()
                .iter()
                .any(|input| model.incoming_wire(*input).is_none())
        };
        let sources = model
            .components()
            .filter(|component| component.kind() == ComponentKind::Source);
        let floating_roots = model
            .components()
            .filter(|component| component.kind() != ComponentKind::Source && floating(*component));
        let roots: Vec<&Component> = sources.chain(floating_roots).collect();

        let mut reached: HashSet<ComponentId> = roots.iter().map(|root| root.id()).collect();
        let mut frontier: VecDeque<ComponentId> = roots.iter().map(|root| root.id()).collect();
        while let Some(id) = frontier.pop_front() {
            let Some(component) = model.component(id) else {
                continue;
            };
            let downstream = component
                .outputs()
                .iter()
                .filter_map(|output| model.node(*output))
                .flat_map(|node| node.wires())
                .filter_map(|wire| model.wire(*wire))
                .filter_map(|wire| model.node(wire.dest()))
                .map(|node| node.component());
            for next in downstream {
                if reached.insert(next) {
                    frontier.push_back(next);
                }
            }
        }

        let seed = |component: &Component| match component.kind() {
            ComponentKind::Source => Event::SourceChanged(component.id()),
            _ => Event::Recalculate(component.id()),
        };
        roots
            .iter()
            .map(|root| seed(*root))
            .chain(
                model
                    .components()
                    .filter(|component| !reached.contains(&component.id()))
                    .map(seed),
            )
            .collect()
    }

    /// Runs until quiescence or the step cap. A primed engine with nothing
    /// pending returns immediately without emitting any event.
    pub fn run_to_completion(&mut self) -> RunReport {
        if !self.primed {
            self.start_run();
        }
        self.drain()
    }

    /// Sets a source bit and enqueues its change without draining.
    ///
    /// Returns whether a `SourceChanged` for this source is now pending. Setting a
    /// source to its current value on a primed engine is a no-op, and a change
    /// staged while the source's event is still queued is picked up by that event.
    pub fn stage_source(&mut self, id: ComponentId, bit: bool) -> Result<bool, EngineError> {
        let component = self
            .model
            .component_mut(id)
            .ok_or(EngineError::UnknownComponent(id))?;
        if component.kind() != ComponentKind::Source {
            return Err(EngineError::NotASource(id));
        }
        let changed = component.source_state != bit;
        component.source_state = bit;

        if !self.primed {
            self.start_run();
            return Ok(true);
        }
        let event = Event::SourceChanged(id);
        let pending = self.queue.contains(&event);
        if changed && !pending {
            self.enqueue(event);
        }
        Ok(pending || changed)
    }

    pub fn set_source(&mut self, id: ComponentId, bit: bool) -> Result<RunReport, EngineError> {
        self.stage_source(id, bit)?;
        Ok(self.drain())
    }

    /// Flips a source and re-simulates only what it reaches.
    pub fn toggle_source(&mut self, id: ComponentId) -> Result<RunReport, EngineError> {
        let current = self
            .model
            .component(id)
            .ok_or(EngineError::UnknownComponent(id))?
            .source_state();
        self.set_source(id, !current)
    }

    /// Processes queued events until none remain or the step cap is reached.
    pub fn drain(&mut self) -> RunReport {
        let mut executed = 0;
        while !self.queue.is_empty() {
            if self.steps >= self.config.max_steps {
                self.halt(Status::OscillationLimit);
                break;
            }
            if self.process_next().is_none() {
                break;
            }
            executed += 1;
        }
        if self.status == Status::Running {
            self.status = Status::Stable;
        }
        debug!(status = ?self.status, steps = executed, "drain finished");
        RunReport {
            status: self.status,
            steps: executed,
        }
    }

    /// Processes exactly one queued event. Lets a host pace the simulation
    /// one event per frame.
    pub fn single_step(&mut self) -> StepResult {
        if self.queue.is_empty() {
            return StepResult::Idle;
        }
        if self.steps >= self.config.max_steps {
            self.halt(Status::OscillationLimit);
            return StepResult::Halted(self.status);
        }
        match self.process_next() {
            Some(event) => StepResult::Stepped {
                event,
                status: self.status,
            },
            None => StepResult::Halted(self.status),
        }
    }

    /// Drops pending work and every simulated value. Safe from any status.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.model.clear_derived_state();
        self.steps = 0;
        self.status = Status::Idle;
        self.primed = false;
    }

    fn halt(&mut self, status: Status) {
        match status {
            Status::OscillationLimit => warn!(
                max_steps = self.config.max_steps,
                pending = self.queue.len(),
                "step cap reached, circuit does not settle"
            ),
            _ => error!(?status, pending = self.queue.len(), "simulation halted"),
        }
        self.queue.clear();
        self.status = status;
        self.primed = false;
    }

    fn process_next(&mut self) -> Option<StepEvent> {
        let event = self.queue.pop_front()?;
        self.status = Status::Running;
        self.steps += 1;
        match self.process(event) {
            Ok(step) => {
                trace!(step = self.steps, ?event, old = ?step.old_state, new = ?step.new_state);
                self.observer.on_step(&step);
                if self.queue.is_empty() {
                    self.status = Status::Stable;
                }
                Some(step)
            }
            Err(target) => {
                self.halt(Status::Faulted(target));
                None
            }
        }
    }

    fn process(&mut self, event: Event) -> Result<StepEvent, Target> {
        let (old_state, new_state) = match event {
            Event::SourceChanged(id) => self.source_changed(id)?,
            Event::Propagate(wire, state) => self.propagate(wire, state)?,
            Event::Recalculate(id) => self.recalculate(id)?,
        };
        Ok(StepEvent {
            kind: event.kind(),
            target: event.target(),
            old_state,
            new_state,
        })
    }

    fn source_changed(&mut self, id: ComponentId) -> Result<(Option<bool>, Option<bool>), Target> {
        let fault = Target::Component(id);
        let component = self.model.component(id).ok_or(fault)?;
        let bit = component.source_state();
        let output = component.output().ok_or(fault)?;
        let node = self.model.node_mut(output).ok_or(fault)?;
        let old = node.state.replace(bit);
        let wires = node.wires().to_vec();
        for wire in wires {
            self.queue.push_back(Event::Propagate(wire, bit));
        }
        Ok((old, Some(bit)))
    }

    fn propagate(
        &mut self,
        id: WireId,
        state: bool,
    ) -> Result<(Option<bool>, Option<bool>), Target> {
        let fault = Target::Wire(id);
        let wire = self.model.wire(id).ok_or(fault)?;
        let old = wire.state();
        let dest = wire.dest();
        let dest_node = self.model.node(dest).ok_or(fault)?;
        let owner = dest_node.component();
        if old == Some(state) && dest_node.state() == Some(state) {
            return Ok((old, old));
        }

        if let Some(wire) = self.model.wire_mut(id) {
            wire.state = Some(state);
        }
        if let Some(node) = self.model.node_mut(dest) {
            node.state = Some(state);
        }
        self.queue.push_back(Event::Recalculate(owner));
        Ok((old, Some(state)))
    }

    fn recalculate(&mut self, id: ComponentId) -> Result<(Option<bool>, Option<bool>), Target> {
        let fault = Target::Component(id);
        let component = self.model.component(id).ok_or(fault)?;
        let kind = component.kind();
        // Unconnected and not-yet-driven inputs read low.
        let inputs: Vec<bool> = component
            .inputs()
            .iter()
            .map(|node| {
                self.model
                    .node(*node)
                    .and_then(|node| node.state())
                    .unwrap_or(false)
            })
            .collect();
        let output = component.output();

        match kind {
            ComponentKind::Source => {
                let state = output.and_then(|node| self.model.node(node)?.state());
                Ok((state, state))
            }
            ComponentKind::Sink => {
                let value = match inputs.as_slice() {
                    [value] => *value,
                    _ => return Err(fault),
                };
                let component = self.model.component_mut(id).ok_or(fault)?;
                let old = component.sink_value.replace(value);
                Ok((old, Some(value)))
            }
            ComponentKind::Gate(gate) => {
                let value = gate.evaluate(&inputs).map_err(|err| {
                    error!(component = ?id, %err, "gate evaluation failed");
                    fault
                })?;
                let node = self.model.node_mut(output.ok_or(fault)?).ok_or(fault)?;
                let old = node.state;
                if old != Some(value) {
                    node.state = Some(value);
                    let wires = node.wires().to_vec();
                    for wire in wires {
                        self.queue.push_back(Event::Propagate(wire, value));
                    }
                }
                Ok((old, Some(value)))
            }
        }
    }
}

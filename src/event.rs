use crate::circuit::{ComponentId, WireId};

/// Work item in the engine's FIFO queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SourceChanged(ComponentId),
    Propagate(WireId, bool),
    Recalculate(ComponentId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    SourceChanged,
    Propagate,
    Recalculate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Component(ComponentId),
    Wire(WireId),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SourceChanged(_) => EventKind::SourceChanged,
            Event::Propagate(..) => EventKind::Propagate,
            Event::Recalculate(_) => EventKind::Recalculate,
        }
    }

    pub fn target(&self) -> Target {
        match *self {
            Event::SourceChanged(component) | Event::Recalculate(component) => {
                Target::Component(component)
            }
            Event::Propagate(wire, _) => Target::Wire(wire),
        }
    }
}

/// What happened when one queued event was processed.
///
/// For `SourceChanged` the states are the source's output node before and after.
/// For `Propagate` they are the wire's cached state; equal states mean the
/// propagation was gated off. For `Recalculate` they are the gate's output, or
/// the sink's observed value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepEvent {
    pub kind: EventKind,
    pub target: Target,
    pub old_state: Option<bool>,
    pub new_state: Option<bool>,
}

impl StepEvent {
    pub fn changed(&self) -> bool {
        self.old_state != self.new_state
    }
}

/// Receives every processed event in processing order.
pub trait Observer {
    fn on_step(&mut self, _event: &StepEvent) {}
}

#[derive(Debug, Default)]
pub struct NoObserver;
impl Observer for NoObserver {}

/// Keeps the full event trace, mostly for tests and replay logs.
#[derive(Debug, Default, Clone)]
pub struct TraceRecorder {
    pub events: Vec<StepEvent>,
}

impl TraceRecorder {
    pub fn take(&mut self) -> Vec<StepEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    pub fn touches(&self, component: ComponentId) -> bool {
        self.events
            .iter()
            .any(|event| event.target == Target::Component(component))
    }
}

impl Observer for TraceRecorder {
    fn on_step(&mut self, event: &StepEvent) {
        self.events.push(*event);
    }
}

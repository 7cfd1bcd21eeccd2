use super::error::SinkError;
use super::event_builder::BuiltEvent;

/// EventSink is the downstream consumer of built events.
///
/// The sink decides what to do with an event (store it, fill histograms, forward it).
/// Events are lent, not given: a sink that keeps them must clone.
pub trait EventSink {
    fn accept(&mut self, event: &BuiltEvent) -> Result<(), SinkError>;
}

/// Keeps a copy of every event it is given
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub events: Vec<BuiltEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for CollectingSink {
    fn accept(&mut self, event: &BuiltEvent) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Only counts what goes by
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingSink {
    pub events: u64,
    pub fragments: u64,
    pub max_multiplicity: usize,
}

impl EventSink for CountingSink {
    fn accept(&mut self, event: &BuiltEvent) -> Result<(), SinkError> {
        self.events += 1;
        self.fragments += event.len() as u64;
        self.max_multiplicity = self.max_multiplicity.max(event.len());
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, event: &BuiltEvent) -> Result<(), SinkError> {
        (**self).accept(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn accept(&mut self, event: &BuiltEvent) -> Result<(), SinkError> {
        (**self).accept(event)
    }
}

//! Capability traits the engine consumes from the host entity system.
//!
//! The engine never implements these; the host does.  They are deliberately
//! narrow: the scheduler only needs to know whether an agent may think right
//! now, and Event nodes only need to announce which named events they listen
//! for so the host knows what to route back through
//! `Wrangler::deliver_event`.

use std::any::Any;
use std::sync::Arc;

use crate::AgentId;

/// Opaque payload attached to a delivered event.
///
/// Event nodes keep the payload of their latest trigger; leaf closures that
/// care downcast it with `data.downcast_ref::<T>()`.
pub type EventData = Arc<dyn Any + Send + Sync>;

/// Validity queries consulted before a brain is updated.
///
/// An agent that is invalid or asleep is skipped for the tick; it keeps its
/// scheduling state until the host removes it explicitly.
pub trait AgentHost {
    /// `false` once the entity behind `agent` has been destroyed.
    fn is_valid(&self, agent: AgentId) -> bool;

    /// `true` while the host has suspended `agent` (e.g. out of the active
    /// area).
    fn is_asleep(&self, _agent: AgentId) -> bool {
        false
    }
}

/// Named-event subscription scoped to one agent.
///
/// Brains subscribe every Event node of their tree on `start` and
/// unsubscribe on `stop`, so a destroyed agent never keeps callbacks alive.
pub trait EventSource {
    fn listen_for_event(&mut self, agent: AgentId, event: &str);

    fn remove_event_callback(&mut self, agent: AgentId, event: &str);
}

/// A host where every agent is valid and awake and subscriptions are
/// discarded.  Useful in tests and for headless runs.
pub struct NullHost;

impl AgentHost for NullHost {
    fn is_valid(&self, _agent: AgentId) -> bool {
        true
    }
}

impl EventSource for NullHost {
    fn listen_for_event(&mut self, _agent: AgentId, _event: &str) {}

    fn remove_event_callback(&mut self, _agent: AgentId, _event: &str) {}
}

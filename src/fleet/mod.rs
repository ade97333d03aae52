//! Vehicle-level model: archetypes, agents, and their event logs.

/// The per-vehicle charging state machine and SOC model.
pub mod agent;
/// Static archetype configuration and plug-in window resolution.
pub mod archetype;
/// Tapered charging-power curve.
pub mod charging;
pub mod event;

pub use agent::{Agent, AgentId, ChargeState};
pub use archetype::{Archetype, ArchetypeRecord, ChargeWindow};
pub use event::{Event, EventKind, EventLog};

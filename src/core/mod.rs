//! Core module - the hub, its barrier, and the tasks around it

mod aggregator;
mod engine;
mod event_bus;
mod hub;
mod producer;
mod readiness;
mod record;
mod scheduler;

pub use aggregator::{Aggregator, AggregatorStats, EmitOutcome, StatsSnapshot};
pub use engine::Engine;
pub use event_bus::{Event, EventBus, HubEvent};
pub use hub::Hub;
pub use producer::{CycleOutcome, Producer};
pub use readiness::{ReadinessMask, ReadinessSet, Stalled};
pub use record::{SensorRecord, SharedRecord, Snapshot};
pub use scheduler::Scheduler;

use serde::{Deserialize, Serialize};

use crate::sensors::{SensorHealth, SensorKind};

/// Hub-wide state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubState {
    pub running: bool,
    pub uptime_seconds: u64,
    pub required: Vec<SensorKind>,
    pub stats: StatsSnapshot,
    pub record: SensorRecord,
    pub sensors: Vec<SensorHealth>,
}

//! GSN Simulator Core
//!
//! Session-wide delivery policy and the delayed-dispatch scheduler shared
//! by the listener's receive path and its dispatcher thread.

pub mod policy;
pub mod sched;

pub use policy::DeliveryPolicy;
pub use sched::{ScheduledDelivery, Scheduler, SCHED_IDLE_WAIT};

pub mod aggregate;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod id;
pub mod participant;
pub mod select;
pub mod slot;
pub mod store;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use aggregate::{aggregate, aggregate_with, AttendancePolicy, Aggregation, SlotTally};
pub use event::{Answers, Event, EventDetails, Response};
pub use participant::{Grade, Role, User};
pub use select::{analyze, analyze_with, Analysis, Recommendation};

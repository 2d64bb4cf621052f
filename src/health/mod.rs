//! Health evaluation for monitored websites.

mod policy;
mod state;

pub use policy::{build_policy, AlertKind, AlertPolicy, DebouncePolicy, HysteresisPolicy};
pub use state::{AlertStore, TargetHandle, TargetHealth};

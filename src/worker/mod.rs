//! Offline caching controller
//!
//! Install precaches a manifest into a versioned static partition, activation
//! drops every other version's partitions, and intercepted requests are then
//! answered by a strategy picked from the request's class.

pub mod controller;
pub mod lifecycle;
pub mod partitions;
pub mod policy;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{
    Activation, AssetCacheController, ControllerSettings, DispatchOutcome, FetchOutcome,
    ResponseSource, Served,
};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use partitions::{CacheNames, PartitionKind, PartitionName};
pub use policy::{classify, ControlMessage, Effect, LifecycleEvent, RequestClass, Router, Strategy};
pub use registration::{Registered, Registration, RegistrationRecord};

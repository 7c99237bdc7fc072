pub mod allocations;
pub mod events;
pub mod members;
pub mod settings;
pub mod workload;

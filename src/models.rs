pub mod allocation;
pub mod leave;
pub mod members;
pub mod settings;
pub mod workload;

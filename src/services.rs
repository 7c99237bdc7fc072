pub mod aggregate_cache;
pub mod aggregation;
pub mod allocation_input;
pub mod allocation_service;
pub mod processors;
pub mod utilization;
pub mod workload_service;

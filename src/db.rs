pub mod allocation_repo;
pub use allocation_repo::AllocationRepository;
pub mod leave_repo;
pub use leave_repo::LeaveRepository;
pub mod member_repo;
pub use member_repo::MemberRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod workload_source;
pub use workload_source::PgWorkloadSource;

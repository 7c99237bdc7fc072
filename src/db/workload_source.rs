// src/db/workload_source.rs

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    db::{AllocationRepository, LeaveRepository},
    models::{
        allocation::AllocationRow,
        leave::{AnnualLeave, OfficeHoliday, OtherLeave},
        workload::WindowQuery,
    },
    services::workload_service::WorkloadSource,
};

// As quatro fontes lidas do Postgres
#[derive(Clone)]
pub struct PgWorkloadSource {
    allocations: AllocationRepository,
    leave: LeaveRepository,
}

impl PgWorkloadSource {
    pub fn new(allocations: AllocationRepository, leave: LeaveRepository) -> Self {
        Self { allocations, leave }
    }
}

#[async_trait]
impl WorkloadSource for PgWorkloadSource {
    async fn fetch_allocations(&self, query: &WindowQuery) -> Result<Vec<AllocationRow>, AppError> {
        self.allocations.fetch_for_window(query).await
    }

    async fn fetch_annual_leave(&self, query: &WindowQuery) -> Result<Vec<AnnualLeave>, AppError> {
        self.leave.fetch_annual_leave(query).await
    }

    async fn fetch_office_holidays(&self, query: &WindowQuery) -> Result<Vec<OfficeHoliday>, AppError> {
        self.leave.fetch_office_holidays(query).await
    }

    async fn fetch_other_leave(&self, query: &WindowQuery) -> Result<Vec<OtherLeave>, AppError> {
        self.leave.fetch_other_leave(query).await
    }
}

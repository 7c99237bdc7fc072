// src/db/leave_repo.rs

use chrono::Days;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::{
        leave::{AnnualLeave, OfficeHoliday, OtherLeave},
        workload::WindowQuery,
    },
};

// Férias, feriados e outras licenças: só leitura aqui
#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_annual_leave(&self, query: &WindowQuery) -> Result<Vec<AnnualLeave>, AppError> {
        let (from, until) = query.date_range();

        let rows = sqlx::query_as::<_, AnnualLeave>(
            r#"
            SELECT company_id, member_id, leave_date, hours
            FROM annual_leave
            WHERE company_id = $1
              AND member_id = ANY($2)
              AND leave_date >= $3
              AND leave_date < $4
            "#,
        )
            .bind(query.company_id)
            .bind(&query.member_ids)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Feriados que tocam a janela em qualquer dia. Não filtra por membro:
    /// o escopo por local é decidido no processamento.
    pub async fn fetch_office_holidays(&self, query: &WindowQuery) -> Result<Vec<OfficeHoliday>, AppError> {
        let (from, until) = query.date_range();

        let rows = sqlx::query_as::<_, OfficeHoliday>(
            r#"
            SELECT company_id, name, holiday_date, end_date, location
            FROM office_holidays
            WHERE company_id = $1
              AND holiday_date < $3
              AND COALESCE(end_date, holiday_date) >= $2
            ORDER BY holiday_date
            "#,
        )
            .bind(query.company_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Licenças semanais cuja semana (7 dias a partir de `week_start_date`)
    /// cruza a janela.
    pub async fn fetch_other_leave(&self, query: &WindowQuery) -> Result<Vec<OtherLeave>, AppError> {
        let (from, until) = query.date_range();
        let earliest_week = from.checked_sub_days(Days::new(6)).unwrap_or(from);

        let rows = sqlx::query_as::<_, OtherLeave>(
            r#"
            SELECT company_id, member_id, week_start_date, hours
            FROM other_leave
            WHERE company_id = $1
              AND member_id = ANY($2)
              AND week_start_date >= $3
              AND week_start_date < $4
            "#,
        )
            .bind(query.company_id)
            .bind(&query.member_ids)
            .bind(earliest_week)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

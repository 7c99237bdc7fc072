// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{CompanySettingsRow, UpdateSettingsRequest, WorkloadSettings, weekday_to_iso},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn get_settings<'e, E>(&self, executor: E, company_id: Uuid) -> Result<WorkloadSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Empresa sem linha ainda: valem os padrões
        let row = sqlx::query_as::<_, CompanySettingsRow>(
            "SELECT * FROM company_settings WHERE company_id = $1",
        )
            .bind(company_id)
            .fetch_optional(executor)
            .await?;

        Ok(row.map(WorkloadSettings::from).unwrap_or_else(|| WorkloadSettings::defaults(company_id)))
    }

    /// Aplica os campos presentes sobre o valor atual e grava (UPSERT).
    pub async fn update_settings(
        &self,
        company_id: Uuid,
        input: UpdateSettingsRequest,
    ) -> Result<WorkloadSettings, AppError> {
        let mut tx = self.pool.begin().await?;

        let merged = self.get_settings(&mut *tx, company_id).await?.apply(input);
        let working_days: Vec<i32> = merged.working_days.iter().copied().map(weekday_to_iso).collect();

        let row = sqlx::query_as::<_, CompanySettingsRow>(
            r#"
            INSERT INTO company_settings (company_id, week_start_day, work_week_hours, display_unit, working_days)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (company_id)
            DO UPDATE SET
                week_start_day = EXCLUDED.week_start_day,
                work_week_hours = EXCLUDED.work_week_hours,
                display_unit = EXCLUDED.display_unit,
                working_days = EXCLUDED.working_days,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(company_id)
            .bind(merged.week_start_day)
            .bind(merged.work_week_hours)
            .bind(merged.display_unit)
            .bind(&working_days)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }
}

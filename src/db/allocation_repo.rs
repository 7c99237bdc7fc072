// src/db/allocation_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, hours::Hours},
    models::{
        allocation::{AllocationKey, AllocationRow},
        workload::WindowQuery,
    },
    services::allocation_service::AllocationStore,
};

#[derive(Clone)]
pub struct AllocationRepository {
    pool: PgPool,
}

// Projeto da própria empresa ou nada; linha de outra empresa nunca é tocada
const UPSERT_SQL: &str = r#"
    INSERT INTO project_allocations
        (company_id, project_id, resource_id, resource_type, allocation_date, hours)
    SELECT $1, p.id, $3, $4, $5, $6
    FROM projects p
    WHERE p.id = $2
      AND p.company_id = $1
    ON CONFLICT (resource_id, resource_type, project_id, allocation_date)
    DO UPDATE SET
        hours = EXCLUDED.hours,
        updated_at = NOW()
    WHERE project_allocations.company_id = EXCLUDED.company_id
"#;

const WINDOW_SQL: &str = r#"
    SELECT
        a.project_id, a.resource_id, a.resource_type, a.allocation_date, a.hours,
        p.name AS project_name, p.code AS project_code
    FROM project_allocations a
    LEFT JOIN projects p ON p.id = a.project_id AND p.company_id = a.company_id
    WHERE a.company_id = $1
      AND a.resource_id = ANY($2)
      AND a.allocation_date >= $3
      AND a.allocation_date < $4
    ORDER BY a.allocation_date, a.resource_id
"#;

// Violação de unicidade/FK vira conflito de escrita; o resto é erro de banco
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() || db_err.is_check_violation() {
            return AppError::WriteConflict(db_err.message().to_string());
        }
    }
    AppError::DatabaseError(e)
}

impl AllocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Linhas de alocação dos membros dentro da janela, com nome e código do projeto.
    pub async fn fetch_for_window(&self, query: &WindowQuery) -> Result<Vec<AllocationRow>, AppError> {
        let (from, until) = query.date_range();

        let rows = sqlx::query_as::<_, AllocationRow>(WINDOW_SQL)
            .bind(query.company_id)
            .bind(&query.member_ids)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn upsert_with<'e, E>(executor: E, company_id: Uuid, key: &AllocationKey, hours: Hours) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(UPSERT_SQL)
            .bind(company_id)
            .bind(key.project_id)
            .bind(key.resource_id)
            .bind(key.resource_type)
            .bind(key.allocation_date)
            .bind(hours)
            .execute(executor)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::WriteConflict(
                "Projeto de outra empresa (ou inexistente), ou alocação pertencente a outra empresa.".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn upsert(&self, company_id: Uuid, key: &AllocationKey, hours: Hours) -> Result<(), AppError> {
        Self::upsert_with(&self.pool, company_id, key, hours).await
    }

    pub async fn delete(&self, company_id: Uuid, key: &AllocationKey) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM project_allocations
            WHERE company_id = $1
              AND resource_id = $2
              AND resource_type = $3
              AND project_id = $4
              AND allocation_date = $5
            "#,
        )
            .bind(company_id)
            .bind(key.resource_id)
            .bind(key.resource_type)
            .bind(key.project_id)
            .bind(key.allocation_date)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Apaga as linhas de `[key.allocation_date, until)` do recurso/projeto e
    /// grava `rows` no lugar. Tudo ou nada.
    pub async fn replace_range(
        &self,
        company_id: Uuid,
        key: &AllocationKey,
        until: NaiveDate,
        rows: &[(NaiveDate, Hours)],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM project_allocations
            WHERE company_id = $1
              AND resource_id = $2
              AND resource_type = $3
              AND project_id = $4
              AND allocation_date >= $5
              AND allocation_date < $6
            "#,
        )
            .bind(company_id)
            .bind(key.resource_id)
            .bind(key.resource_type)
            .bind(key.project_id)
            .bind(key.allocation_date)
            .bind(until)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?
            .rows_affected();

        // Erro em qualquer linha: o drop da transação faz o rollback
        for (date, hours) in rows {
            let row_key = AllocationKey { allocation_date: *date, ..*key };
            Self::upsert_with(&mut *tx, company_id, &row_key, *hours).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }
}

#[async_trait]
impl AllocationStore for AllocationRepository {
    async fn upsert(&self, company_id: Uuid, key: &AllocationKey, hours: Hours) -> Result<(), AppError> {
        AllocationRepository::upsert(self, company_id, key, hours).await
    }

    async fn delete(&self, company_id: Uuid, key: &AllocationKey) -> Result<bool, AppError> {
        AllocationRepository::delete(self, company_id, key).await
    }

    async fn replace_range(
        &self,
        company_id: Uuid,
        key: &AllocationKey,
        until: NaiveDate,
        rows: &[(NaiveDate, Hours)],
    ) -> Result<u64, AppError> {
        AllocationRepository::replace_range(self, company_id, key, until, rows).await
    }
}

// src/db/member_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::members::Member};

#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Sem `ids`, devolve todos os membros da empresa
    pub async fn list_members(&self, company_id: Uuid, ids: Option<&[Uuid]>) -> Result<Vec<Member>, AppError> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, resource_type, name, weekly_capacity, location
            FROM company_members
            WHERE company_id = $1
              AND ($2::uuid[] IS NULL OR id = ANY($2))
            ORDER BY name NULLS LAST, id
            "#,
        )
            .bind(company_id)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(members)
    }
}

use crate::dto::user_dto::RegisterUserPayload;
use crate::error::Result;
use crate::models::user::User;
use crate::utils::best_effort::run_best_effort;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TenantService {
    pool: PgPool,
}

impl TenantService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts the tenant row keyed by the external identity provider id.
    /// Auxiliary defaults are created best-effort afterwards; their failure
    /// never fails the registration itself.
    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (external_id, name, email) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (external_id) DO UPDATE \
                 SET name = EXCLUDED.name, email = EXCLUDED.email, updated_at = NOW() \
             RETURNING id, external_id, name, email, is_active, created_at, updated_at",
        )
        .bind(payload.external_id.trim())
        .bind(payload.name.trim())
        .bind(payload.email.trim())
        .fetch_one(&self.pool)
        .await?;

        run_best_effort("create default settings", self.create_default_settings(user.id)).await;

        Ok(user)
    }

    async fn create_default_settings(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_settings (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

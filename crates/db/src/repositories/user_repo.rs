//! Repository for the `users` table.

use sqlx::PgPool;
use printshop_core::roles::ROLE_USER;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, email, role, first_name, last_name, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user. The role defaults to `USER`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, role, first_name, last_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(input.role.as_deref().unwrap_or(ROLE_USER))
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_one(pool)
            .await
    }
}

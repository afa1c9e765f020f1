//! User and portfolio stub storage. CRUD only, no business logic.

use crate::types::{Portfolio, User};
use crate::Result;
use sqlx::PgPool;

pub struct PortfolioRepository {
    pool: PgPool,
}

impl PortfolioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, username: &str, email: &str) -> Result<User> {
        let user = sqlx::query_as(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id, username, email",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as("SELECT id, username, email FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT id, username, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn create_portfolio(&self, name: &str, user_id: i32) -> Result<Portfolio> {
        let portfolio = sqlx::query_as(
            "INSERT INTO portfolios (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(portfolio)
    }

    pub async fn list_portfolios(&self, user_id: i32) -> Result<Vec<Portfolio>> {
        let portfolios =
            sqlx::query_as("SELECT id, name, user_id FROM portfolios WHERE user_id = $1 ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(portfolios)
    }
}

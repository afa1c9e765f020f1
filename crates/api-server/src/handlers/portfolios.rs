//! User and portfolio stub handlers. CRUD only.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use trendline_core::types::{Portfolio, User};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePortfolioRequest {
    pub name: String,
    pub user_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PortfolioResponse {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
}

impl From<Portfolio> for PortfolioResponse {
    fn from(portfolio: Portfolio) -> Self {
        Self {
            id: portfolio.id,
            name: portfolio.name,
            user_id: portfolio.user_id,
        }
    }
}

/// List users.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "portfolios",
    responses((status = 200, description = "All users", body = Vec<UserResponse>))
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.portfolios().list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Create a user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "portfolios",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created user", body = UserResponse),
        (status = 500, description = "Duplicate username or email", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .portfolios()
        .create_user(&request.username, &request.email)
        .await?;
    Ok(Json(user.into()))
}

/// List one user's portfolios.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/portfolios",
    tag = "portfolios",
    params(("user_id" = i32, Path, description = "User identifier")),
    responses(
        (status = 200, description = "The user's portfolios", body = Vec<PortfolioResponse>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_user_portfolios(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<Vec<PortfolioResponse>>> {
    let repo = state.portfolios();
    if repo.get_user(user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }
    let portfolios = repo.list_portfolios(user_id).await?;
    Ok(Json(portfolios.into_iter().map(Into::into).collect()))
}

/// Create a portfolio.
#[utoipa::path(
    post,
    path = "/api/v1/portfolios",
    tag = "portfolios",
    request_body = CreatePortfolioRequest,
    responses(
        (status = 200, description = "Created portfolio", body = PortfolioResponse),
        (status = 404, description = "Owner not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_portfolio(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePortfolioRequest>,
) -> ApiResult<Json<PortfolioResponse>> {
    let repo = state.portfolios();
    if repo.get_user(request.user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "User {} not found",
            request.user_id
        )));
    }
    let portfolio = repo
        .create_portfolio(&request.name, request.user_id)
        .await?;
    Ok(Json(portfolio.into()))
}

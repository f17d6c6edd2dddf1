//! User resource handlers.
//!
//! Each handler extracts its input, calls exactly one [`userhub::UserStore`]
//! operation and wraps the outcome. Validation, uniqueness and error
//! precedence all belong to the store; failures convert to [`ServerError`]
//! through `From<StoreError>`.

use crate::error::{ServerError, ServerResult};
use crate::routes::ApiResponse;
use crate::state::ServerState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use userhub::{NewUser, User, UserPatch};

/// Body of `POST /api/v1/users`
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
        }
    }
}

/// Body of `PUT /api/v1/users/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        UserPatch {
            name: req.name,
            email: req.email,
        }
    }
}

/// Query of `GET /api/v1/users/search`
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn list_users(State(state): State<Arc<ServerState>>) -> Json<ApiResponse<Vec<User>>> {
    Json(ApiResponse::list(state.users.list_all()))
}

pub async fn search_users(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ServerResult<Json<ApiResponse<Vec<User>>>> {
    let Query(query) = query?;
    let hits = state.users.search(query.name.as_deref())?;
    Ok(Json(ApiResponse::list(hits)))
}

pub async fn get_user(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<ApiResponse<User>>> {
    let user = state.users.get(&id)?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn create_user(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) = body?;
    let user = state.users.create(request.into())?;
    tracing::info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

pub async fn update_user(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ServerResult<Json<ApiResponse<User>>> {
    // Id format and existence outrank a malformed body
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state.users.get(&id)?;
            return Err(ServerError::from(rejection));
        }
    };
    let user = state.users.update(&id, request.into())?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn delete_user(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<ApiResponse<User>>> {
    let user = state.users.delete(&id)?;
    tracing::info!(user_id = user.id, "user deleted");
    let message = format!("User {} deleted successfully", user.name);
    Ok(Json(ApiResponse::ok(user).with_message(message)))
}

//! Magazine API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::{
    CreateMagazineRequest, Magazine, MagazineDeleted, MagazineUpdated, UpdateMagazineRequest,
};
use crate::period::MonthWindow;
use crate::AppState;

/// GET /magazines - List magazines created in the current calendar month.
pub async fn list_magazines(State(state): State<AppState>) -> Result<Json<Vec<Magazine>>, AppError> {
    const FAILED: &str = "Failed to fetch magazines";

    let window = MonthWindow::current().ok_or_else(|| {
        tracing::error!("Could not compute the current month window");
        AppError::Internal(FAILED.to_string())
    })?;

    let magazines = state
        .repo
        .list_magazines_between(&window)
        .await
        .map_err(|e| e.public(FAILED))?;

    Ok(Json(magazines))
}

/// GET /magazines/:id - Get a single magazine.
pub async fn get_magazine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Magazine>, AppError> {
    match state.repo.get_magazine(&id).await {
        Ok(Some(magazine)) => Ok(Json(magazine)),
        Ok(None) => Err(AppError::NotFound("Magazine not found".to_string())),
        Err(e) => Err(e.public("Failed to fetch magazine")),
    }
}

/// POST /magazines - Create a new magazine (admins only).
pub async fn create_magazine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateMagazineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Magazine>), AppError> {
    let Json(request) = payload.map_err(|e| unreadable_body(e, "Failed to create magazine"))?;

    let magazine = state
        .repo
        .create_magazine(&request)
        .await
        .map_err(|e| e.public("Failed to create magazine"))?;

    tracing::info!(admin = %identity.admin_id, magazine = %magazine.id, "Magazine created");
    Ok((StatusCode::CREATED, Json(magazine)))
}

/// PUT /magazines/:id - Partially update a magazine (admins only).
pub async fn update_magazine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMagazineRequest>, JsonRejection>,
) -> Result<Json<MagazineUpdated>, AppError> {
    let Json(request) = payload.map_err(|e| unreadable_body(e, "Failed to update magazine"))?;

    let magazine = state
        .repo
        .update_magazine(&id, &request)
        .await
        .map_err(|e| e.public("Failed to update magazine"))?;

    tracing::info!(admin = %identity.admin_id, magazine = %id, "Magazine updated");
    Ok(Json(MagazineUpdated {
        message: "Magazine updated successfully",
        magazine,
    }))
}

/// DELETE /magazines/:id - Permanently delete a magazine (admins only).
pub async fn delete_magazine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<MagazineDeleted>, AppError> {
    state
        .repo
        .delete_magazine(&id)
        .await
        .map_err(|e| e.public("Failed to delete magazine"))?;

    tracing::info!(admin = %identity.admin_id, magazine = %id, "Magazine deleted");
    Ok(Json(MagazineDeleted {
        message: "Magazine deleted successfully",
    }))
}

/// Malformed input is not told apart from a store failure.
fn unreadable_body(rejection: JsonRejection, operation_message: &str) -> AppError {
    tracing::error!("Unreadable request body: {}", rejection);
    AppError::Internal(operation_message.to_string())
}

//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    infrastructure::dto::http::{
        DeletePadRequest, RoomDetailDto, RoomSummaryDto, SavePadRequest, StatusResponse,
    },
    ui::{error::ApiError, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Get list of resident rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let room = state.get_room_detail_usecase.execute(&room_id).await?;
    Ok(Json(RoomDetailDto::from(&room)))
}

/// Store the latest encrypted snapshot of a pad.
pub async fn save_pad(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SavePadRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = body?;
    state
        .pad_usecase
        .save(&request.room_id, &request.password, &request.payload)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

/// Delete a stored pad and close its room.
pub async fn delete_pad(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeletePadRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = body?;
    state
        .pad_usecase
        .delete(&request.room_id, &request.password)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

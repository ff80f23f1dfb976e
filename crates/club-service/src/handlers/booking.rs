//! 课程预约 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    dto::ApiResponse,
    error::CommerceError,
    handlers::OwnerId,
    models::{Booking, ClassSession, UpcomingBooking},
    state::AppState,
};

/// 未来课程列表
///
/// GET /api/classes
pub async fn list_classes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClassSession>>>, CommerceError> {
    let classes = state.booking_service.list_classes().await?;

    Ok(Json(ApiResponse::success(classes)))
}

/// 预约课程
///
/// POST /api/classes/{id}/bookings
pub async fn reserve_class(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(class_id): Path<i64>,
) -> Result<Json<ApiResponse<Booking>>, CommerceError> {
    let booking = state.booking_service.reserve(&owner_id, class_id).await?;

    Ok(Json(ApiResponse::success(booking)))
}

/// 取消预约（仅限本人）
///
/// DELETE /api/bookings/{id}
pub async fn release_booking(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(booking_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, CommerceError> {
    state.booking_service.release(booking_id, &owner_id).await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 我的未来预约
///
/// GET /api/bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<ApiResponse<Vec<UpcomingBooking>>>, CommerceError> {
    let bookings = state.booking_service.upcoming_for(&owner_id).await?;

    Ok(Json(ApiResponse::success(bookings)))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};

use crate::{
    dto::orders::UpdateOrderStatusRequest,
    error::AppResult,
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{order_number}/status", patch(update_order_status))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{order_number}/status",
    params(
        ("order_number" = String, Path, description = "Order number")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order moved to the requested status", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &order_number, payload).await?;
    Ok(Json(resp))
}

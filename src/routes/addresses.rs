use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddAddressRequest, AddressList},
    error::AppResult,
    middleware::identity::Identity,
    response::ApiResponse,
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(add_address))
        .route("/{id}", delete(delete_address))
}

#[utoipa::path(
    get,
    path = "/api/user/addresses",
    responses(
        (status = 200, description = "Saved addresses, default first", body = ApiResponse<AddressList>)
    ),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = address_service::list_addresses(&state, &identity).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/addresses",
    request_body = AddAddressRequest,
    responses(
        (status = 200, description = "Address saved", body = ApiResponse<AddressList>),
        (status = 400, description = "Missing required address fields"),
    ),
    tag = "Addresses"
)]
pub async fn add_address(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<AddAddressRequest>,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = address_service::add_address(&state, &identity, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/user/addresses/{id}",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Address removed", body = ApiResponse<AddressList>),
    ),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = address_service::delete_address(&state, &identity, id).await?;
    Ok(Json(resp))
}

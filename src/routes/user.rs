use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::addresses::UserProfile,
    error::AppResult,
    middleware::identity::Identity,
    response::ApiResponse,
    routes::addresses,
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile))
        .nest("/addresses", addresses::router())
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Identity of the caller with its saved addresses", body = ApiResponse<UserProfile>)
    ),
    tag = "User"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = address_service::get_profile(&state, &identity).await?;
    Ok(Json(resp))
}

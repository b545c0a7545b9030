/// Admin dashboard endpoint
///
/// `GET /v1/admin/stats` returns booking counts per status, the unread
/// message count and total revenue (sum of approved budgets).

use crate::{app::AppState, error::ApiResult, middleware::session::Caller};
use axum::{extract::State, Json};
use planora_shared::portal::stats::{admin_stats, AdminStats};

pub async fn stats(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<AdminStats>> {
    Ok(Json(admin_stats(&state.store, &caller).await?))
}

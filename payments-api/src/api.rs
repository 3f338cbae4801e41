use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use payments_core::handlers::{
    ConfirmOutcome, ConfirmPaymentHandler, CreatePaymentHandler, GetPaymentHandler,
    ListPaymentsHandler, ListPaymentsResponse, PaymentDto,
};
use payments_core::PaymentError;

#[derive(Clone)]
pub struct AppState {
    pub create: Arc<CreatePaymentHandler>,
    pub confirm: Arc<ConfirmPaymentHandler>,
    pub get: Arc<GetPaymentHandler>,
    pub list: Arc<ListPaymentsHandler>,
    pub requested_topic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub game_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/payments", post(create_payment).get(list_payments))
        .route("/api/payments/:id", get(get_payment))
        .route("/api/payments/:id/confirm", post(confirm_payment))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

fn error_response(err: PaymentError) -> ApiError {
    let status = match &err {
        PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
        PaymentError::InvalidTransition { .. } => StatusCode::CONFLICT,
        PaymentError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Caller identity, resolved upstream and forwarded as a header.
fn caller_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentDto>), ApiError> {
    let user_id = caller_id(&headers).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "missing or invalid x-user-id header".to_string(),
            }),
        )
    })?;

    match state
        .create
        .handle(user_id, request.game_id, &state.requested_topic)
        .await
    {
        Ok(res) => Ok((StatusCode::CREATED, Json(res))),
        Err(e) => {
            tracing::error!("Failed to create payment: {}", e);
            Err(error_response(e))
        }
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentDto>, ApiError> {
    match state.get.handle(id).await {
        Ok(Some(res)) => Ok(Json(res)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("payment {id} not found"),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPaymentsResponse>, ApiError> {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(0);

    match state.list.handle(page, size).await {
        Ok(res) => Ok(Json(res)),
        Err(e) => Err(error_response(e)),
    }
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.confirm.handle(id).await {
        Ok(ConfirmOutcome::Confirmed | ConfirmOutcome::AlreadyPaid) => Ok(StatusCode::NO_CONTENT),
        Ok(ConfirmOutcome::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("payment {id} not found"),
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to confirm payment {}: {}", id, e);
            Err(error_response(e))
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

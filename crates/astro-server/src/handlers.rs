//! HTTP Handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use astro_payments::{parse_event, PaymentCredentials, PaymentError, SessionRef, VerifiedPayment, WebhookEvent};
use astro_reading::{
    model::parse_birth_date, AnalysisResult, BirthSubject, ChartPayload, ReadingError, Tier,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub completion_connected: bool,
    pub stripe_configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub birth_date: String,
    pub birth_time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub birth_chart: ChartPayload,
    #[serde(default)]
    pub partner_birth_chart: Option<ChartPayload>,
    #[serde(default = "default_tier")]
    pub analysis_type: Tier,
}

fn default_tier() -> Tier {
    Tier::Basic
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub payment_credentials: Option<PaymentCredentials>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub session_id: String,
    #[serde(default)]
    pub payment_credentials: Option<PaymentCredentials>,
}

/// Success envelope: `{success: true, data, isMock?}`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

impl<T: Serialize> DataResponse<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            is_mock: None,
        }
    }

    fn mock(data: T) -> Self {
        Self {
            success: true,
            data,
            is_mock: Some(true),
        }
    }
}

/// Error envelope: `{success: false, error, details?}`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Some(details),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum VerifyPaymentResponse {
    #[serde(rename_all = "camelCase")]
    Verified {
        success: bool,
        session: VerifiedPayment,
    },
    #[serde(rename_all = "camelCase")]
    NotPaid {
        success: bool,
        payment_status: String,
        error: String,
    },
}

#[derive(Serialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map a reading error onto the HTTP contract: validation 400, completion
/// exhaustion 503, everything else 500.
fn reading_error(e: &ReadingError) -> HandlerError {
    match e {
        ReadingError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details(
                "Invalid input data",
                json!([{"field": field, "message": message}]),
            )),
        ),
        ReadingError::MissingPartnerData => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.user_message())),
        ),
        ReadingError::CompletionUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("AI service temporarily unavailable")),
        ),
        ReadingError::Payment(PaymentError::UnknownProduct(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid product name")),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.user_message())),
        ),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let completion_connected = match &state.provider {
        Some(provider) => provider.health_check().await.unwrap_or(false),
        None => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        completion_connected,
        stripe_configured: state.stripe_configured,
    })
}

/// Calculate a birth chart
pub async fn create_chart(
    State(state): State<AppState>,
    Json(payload): Json<ChartRequest>,
) -> Result<Json<DataResponse<ChartPayload>>, HandlerError> {
    let date = parse_birth_date(&payload.birth_date).map_err(|e| reading_error(&e))?;

    let subject = BirthSubject {
        name: payload
            .name
            .as_deref()
            .map(BirthSubject::sanitize)
            .unwrap_or_else(|| "User".into()),
        date,
        time: payload.birth_time,
        latitude: payload.latitude,
        longitude: payload.longitude,
        location: BirthSubject::sanitize(&payload.location),
    };
    subject.validate().map_err(|e| reading_error(&e))?;

    let chart = state.charts.generate(&subject);
    Ok(Json(DataResponse::new(chart)))
}

/// Generate the AI analysis for a chart (plus optional partner chart)
pub async fn ai_analysis(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisRequest>,
) -> Result<Json<DataResponse<AnalysisResult>>, HandlerError> {
    payload.birth_chart.birth_data.validate().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid birth data format")),
        )
    })?;

    if let Some(partner) = &payload.partner_birth_chart {
        partner.birth_data.validate().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid partner birth data format")),
            )
        })?;
    }

    let outcome = state
        .engine
        .analyze(
            &payload.birth_chart,
            payload.partner_birth_chart.as_ref(),
            payload.analysis_type,
        )
        .await
        .map_err(|e| {
            tracing::error!("AI analysis error: {}", e);
            reading_error(&e)
        })?;

    let response = if outcome.mock {
        DataResponse::mock(outcome.analysis)
    } else {
        DataResponse::new(outcome.analysis)
    };
    Ok(Json(response))
}

/// Create a checkout session (real or mock)
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutSessionRequest>,
) -> Result<Json<CheckoutSessionResponse>, HandlerError> {
    if payload.product_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Product name is required")),
        ));
    }

    let session = state
        .checkout
        .create_session(
            &payload.product_name,
            &payload.success_url,
            &payload.cancel_url,
            payload.payment_credentials.as_ref(),
        )
        .await
        .map_err(|e| match e {
            PaymentError::UnknownProduct(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid product name")),
            ),
            e => {
                tracing::error!("Checkout error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(e.user_message())),
                )
            }
        })?;

    Ok(Json(CheckoutSessionResponse {
        is_mock: session.kind.is_mock().then_some(true),
        session_id: session.id,
        url: session.url,
    }))
}

/// Verify paid status for a session on return from checkout
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, HandlerError> {
    if payload.session_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Session ID is required")),
        ));
    }

    // Classify the raw id exactly once at this boundary
    let session = SessionRef::classify(payload.session_id);

    let verified = state
        .verifier
        .verify(&session, payload.payment_credentials.as_ref())
        .await
        .map_err(|e| match e {
            PaymentError::SessionNotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Session not found")),
            ),
            e => {
                tracing::error!("Error verifying payment: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Failed to verify payment")),
                )
            }
        })?;

    if verified.paid {
        Ok(Json(VerifyPaymentResponse::Verified {
            success: true,
            session: verified,
        }))
    } else {
        Ok(Json(VerifyPaymentResponse::NotPaid {
            success: false,
            payment_status: verified.payment_status,
            error: "Payment not completed".into(),
        }))
    }
}

/// Stripe webhook endpoint
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ReceivedResponse>, HandlerError> {
    let secret = state.webhook_secret.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Payments not configured")),
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing stripe-signature header")),
            )
        })?;

    let event = parse_event(&body, signature, secret).map_err(|e| {
        tracing::warn!("Webhook rejected: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid signature")),
        )
    })?;

    match &event {
        WebhookEvent::CheckoutCompleted {
            session_id,
            customer_email,
            product_name,
            ..
        } => {
            tracing::info!(
                session_id = %session_id,
                email = ?customer_email,
                product = ?product_name,
                "Checkout session completed"
            );
        }
        WebhookEvent::PaymentSucceeded { payment_intent_id } => {
            tracing::info!(payment_intent = %payment_intent_id, "Payment succeeded");
        }
        WebhookEvent::PaymentFailed {
            payment_intent_id,
            failure_message,
        } => {
            tracing::warn!(
                payment_intent = %payment_intent_id,
                reason = ?failure_message,
                "Payment failed"
            );
        }
        WebhookEvent::Other { event_type } => {
            tracing::debug!(event_type = %event_type, "Unhandled webhook event");
        }
    }

    Ok(Json(ReceivedResponse { received: true }))
}

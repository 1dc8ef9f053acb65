//! Axum route handlers for the Receipt API.
//!
//! Render and preview take a `multipart/form-data` body with a `receipt` part
//! (JSON `ReceiptRequest`) and an optional `logo` part (PNG/JPEG bytes).

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::layout::{encode_png, render_receipt};
use crate::receipt::models::{download_filename, share_message, RenderResult};
use crate::receipt::money::format_money;
use crate::receipt::profile::ReceiptProfile;
use crate::receipt::validation::{build_record, ReceiptRequest};
use crate::state::AppState;

pub const RECEIPT_PART: &str = "receipt";
pub const LOGO_PART: &str = "logo";
pub const TOTAL_HEADER: &str = "x-receipt-total";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: ReceiptProfile,
    pub today: NaiveDate,
    pub suggested_receipt_no: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub receipt_no: String,
    pub filename: String,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub width: u32,
    pub height: u32,
    pub message: String,
}

/// A rendered receipt plus what the handlers need to describe it.
struct RenderedReceipt {
    receipt_no: String,
    business_name: String,
    result: RenderResult,
    png: Vec<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/receipts/profile
///
/// Returns the active profile's defaults and a suggested receipt number for today.
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    let today = Local::now().date_naive();
    Json(ProfileResponse {
        profile: (*state.profile).clone(),
        today,
        suggested_receipt_no: state.profile.generate_receipt_no(today),
    })
}

/// POST /api/v1/receipts/render
///
/// Returns the receipt as a PNG download. The formatted grand total is echoed in
/// the `X-Receipt-Total` header.
pub async fn handle_render(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let rendered = render_from_form(&state, multipart).await?;

    let filename = download_filename(&rendered.receipt_no);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid Content-Disposition: {e}")))?;
    let total = HeaderValue::from_str(&format_money(&rendered.result.total()))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid total header: {e}")))?;

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
        (header::CONTENT_DISPOSITION, disposition),
        (HeaderName::from_static(TOTAL_HEADER), total),
    ];
    Ok((headers, Bytes::from(rendered.png)).into_response())
}

/// POST /api/v1/receipts/preview
///
/// Renders the receipt and returns its amounts, file name and the customer message
/// without the image bytes.
pub async fn handle_preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, AppError> {
    let rendered = render_from_form(&state, multipart).await?;
    let totals = rendered.result.totals;

    Ok(Json(PreviewResponse {
        filename: download_filename(&rendered.receipt_no),
        subtotal: format_money(&totals.subtotal),
        tax: format_money(&totals.tax),
        total: format_money(&totals.total),
        width: rendered.result.image.width(),
        height: rendered.result.image.height(),
        message: share_message(&rendered.business_name, totals.total),
        receipt_no: rendered.receipt_no,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Validates the form, then renders and encodes on the blocking pool.
async fn render_from_form(
    state: &AppState,
    multipart: Multipart,
) -> Result<RenderedReceipt, AppError> {
    let (request, logo) = read_receipt_form(multipart).await?;
    let record = build_record(&request, &state.profile, logo, Local::now().date_naive())?;

    let receipt_no = record.receipt_no.clone();
    let business_name = record.business_name.clone();
    let item_count = record.items.len();
    let fonts = Arc::clone(&state.fonts);

    // Layout and PNG encoding are CPU-bound; keep them off the async workers.
    let (result, png) = tokio::task::spawn_blocking(move || {
        let result = render_receipt(&record, &fonts);
        let png = encode_png(&result.image)?;
        Ok::<_, AppError>((result, png))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    info!(
        receipt_no = %receipt_no,
        items = item_count,
        height = result.image.height(),
        header_x = result.header_x,
        total = %format_money(&result.total()),
        "Receipt rendered"
    );

    Ok(RenderedReceipt {
        receipt_no,
        business_name,
        result,
        png,
    })
}

/// Pulls the `receipt` JSON part and the optional `logo` part out of the form.
async fn read_receipt_form(
    mut multipart: Multipart,
) -> Result<(ReceiptRequest, Option<Vec<u8>>), AppError> {
    let mut request = None;
    let mut logo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RECEIPT_PART) => {
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read receipt part: {e}")))?;
                let parsed: ReceiptRequest = serde_json::from_slice(&body)
                    .map_err(|e| AppError::BadRequest(format!("Invalid receipt JSON: {e}")))?;
                request = Some(parsed);
            }
            Some(LOGO_PART) => {
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Could not read logo part: {e}")))?;
                logo = Some(body.to_vec());
            }
            _ => {}
        }
    }

    let request = request
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{RECEIPT_PART}' part")))?;
    Ok((request, logo))
}

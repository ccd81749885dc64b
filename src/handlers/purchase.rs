// src/handlers/purchase.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use tracing::{error, instrument};

use crate::dtos::purchase::{
    CreatePurchaseInvoiceRequest, PurchaseInvoiceResponse, UpdatePurchaseInvoiceRequest,
    VendorResponse,
};
use crate::error::AppError;
use crate::models::purchase::{build_product_lines, validate_invoice_input, PurchaseInvoice};
use crate::state::AppState;

const INVOICE_COLUMNS: &str = "id, date, vendor, phone, products, created_at, updated_at";

// POST /purchases - Create new purchase invoice
#[instrument(skip(state, payload))]
pub async fn create_purchase_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseInvoiceRequest>,
) -> Result<(StatusCode, Json<PurchaseInvoiceResponse>), AppError> {
    validate_invoice_input(&payload.vendor, &payload.phone, &payload.products)
        .map_err(AppError::ValidationError)?;

    let products = build_product_lines(payload.date, &payload.products);

    let invoice = sqlx::query_as::<_, PurchaseInvoice>(&format!(
        "INSERT INTO purchase_invoices (date, vendor, phone, products)
         VALUES ($1, $2, $3, $4)
         RETURNING {INVOICE_COLUMNS}"
    ))
    .bind(payload.date)
    .bind(payload.vendor.trim())
    .bind(&payload.phone)
    .bind(SqlJson(products))
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(PurchaseInvoiceResponse::from(invoice))))
}

// GET /purchases - List all invoices, newest first
#[instrument(skip(state))]
pub async fn get_all_purchase_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<PurchaseInvoiceResponse>>, AppError> {
    match sqlx::query_as::<_, PurchaseInvoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM purchase_invoices ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&state.db_pool)
    .await
    {
        Ok(invoices) => {
            let response = invoices.into_iter().map(PurchaseInvoiceResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch purchase invoices");
            Err(e.into())
        }
    }
}

// GET /purchases/:id - Get single invoice
#[instrument(skip(state), fields(id))]
pub async fn get_purchase_invoice(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PurchaseInvoiceResponse>, AppError> {
    let invoice = sqlx::query_as::<_, PurchaseInvoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM purchase_invoices WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase invoice not found"))?;

    Ok(Json(PurchaseInvoiceResponse::from(invoice)))
}

// PUT /purchases/:id - Replace date/vendor/phone/products wholesale
#[instrument(skip(state, payload), fields(id))]
pub async fn update_purchase_invoice(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePurchaseInvoiceRequest>,
) -> Result<Json<PurchaseInvoiceResponse>, AppError> {
    validate_invoice_input(&payload.vendor, &payload.phone, &payload.products)
        .map_err(AppError::ValidationError)?;

    let products = build_product_lines(payload.date, &payload.products);

    let invoice = sqlx::query_as::<_, PurchaseInvoice>(&format!(
        "UPDATE purchase_invoices
         SET date = $1, vendor = $2, phone = $3, products = $4, updated_at = NOW()
         WHERE id = $5
         RETURNING {INVOICE_COLUMNS}"
    ))
    .bind(payload.date)
    .bind(payload.vendor.trim())
    .bind(&payload.phone)
    .bind(SqlJson(products))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase invoice not found"))?;

    Ok(Json(PurchaseInvoiceResponse::from(invoice)))
}

// DELETE /purchases/:id - Delete invoice
#[instrument(skip(state), fields(id))]
pub async fn delete_purchase_invoice(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = sqlx::query("DELETE FROM purchase_invoices WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Purchase invoice not found"));
    }

    Ok(Json(json!({ "message": "Purchase invoice deleted successfully" })))
}

// GET /purchases/vendors/list - Distinct vendor names with a representative phone
#[instrument(skip(state))]
pub async fn list_vendors(
    State(state): State<AppState>,
) -> Result<Json<Vec<VendorResponse>>, AppError> {
    let vendors = sqlx::query_as::<_, (String, String)>(
        "SELECT DISTINCT ON (vendor) vendor, phone
         FROM purchase_invoices
         ORDER BY vendor, id",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(
        vendors
            .into_iter()
            .map(|(name, phone)| VendorResponse { name, phone })
            .collect(),
    ))
}

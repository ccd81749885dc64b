// src/models/purchase.rs
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

use crate::dtos::expense::{FilterOptionsResponse, TrackableProductResponse};
use crate::dtos::purchase::ProductLineRequest;

/// Unit of measure for a product line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QtyType {
    #[default]
    Pcs,
    Kg,
    Ltr,
    Box,
}

/// One purchased product line, embedded in the invoice's JSONB `products` array.
/// `total_cost` is always derived from `quantity * cost` at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub name: String,
    pub hsn: String,
    #[serde(default)]
    pub qty_type: QtyType,
    pub quantity: i64,
    pub cost: f64,
    pub total_cost: f64,
    pub purchase_date: NaiveDate,
    // Legacy free-text expense notes, superseded by Expense records
    #[serde(default)]
    pub expenses: Vec<String>,
}

#[derive(Debug, FromRow)]
pub struct PurchaseInvoice {
    pub id: i64,
    pub date: NaiveDate,
    pub vendor: String,
    pub phone: String,
    pub products: Json<Vec<ProductLine>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validates the invoice fields shared by create and update.
/// Phone must be exactly 10 digits, products non-empty, each line well-formed.
pub fn validate_invoice_input(
    vendor: &str,
    phone: &str,
    products: &[ProductLineRequest],
) -> Result<(), String> {
    if vendor.trim().is_empty() {
        return Err("Vendor name is required".to_string());
    }
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number must be 10 digits".to_string());
    }
    if products.is_empty() {
        return Err("At least one product is required".to_string());
    }
    for product in products {
        if product.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        if product.hsn.trim().is_empty() {
            return Err("HSN code is required".to_string());
        }
        if product.quantity < 1 {
            return Err("Quantity must be at least 1".to_string());
        }
        if product.cost < 0.0 {
            return Err("Cost cannot be negative".to_string());
        }
    }
    Ok(())
}

/// Builds the persisted product lines from request lines, recomputing
/// `total_cost = quantity * cost` and ignoring any caller-supplied total.
/// A missing per-line purchase date falls back to the invoice date.
pub fn build_product_lines(invoice_date: NaiveDate, products: &[ProductLineRequest]) -> Vec<ProductLine> {
    products
        .iter()
        .map(|p| ProductLine {
            name: p.name.trim().to_string(),
            hsn: p.hsn.trim().to_string(),
            qty_type: p.qty_type,
            quantity: p.quantity,
            cost: p.cost,
            total_cost: p.quantity as f64 * p.cost,
            purchase_date: p.purchase_date.unwrap_or(invoice_date),
            expenses: p.expenses.clone(),
        })
        .collect()
}

/// Flattens every product line across every invoice into one row per
/// (invoice, productIndex) pair, enough to drive expense entry without a
/// second query. Row id is `{invoiceId}-{productIndex}`.
pub fn flatten_products(invoices: &[PurchaseInvoice]) -> Vec<TrackableProductResponse> {
    let mut rows = Vec::new();
    for invoice in invoices {
        for (index, product) in invoice.products.0.iter().enumerate() {
            rows.push(TrackableProductResponse {
                id: format!("{}-{}", invoice.id, index),
                purchase_invoice_id: invoice.id,
                product_index: index,
                name: product.name.clone(),
                vendor: invoice.vendor.clone(),
                phone: invoice.phone.clone(),
                hsn: product.hsn.clone(),
                qty_type: product.qty_type,
                quantity: product.quantity,
                unit_cost: product.cost,
                original_total_cost: product.total_cost,
                purchase_date: product.purchase_date,
                invoice_date: invoice.date,
            });
        }
    }
    rows
}

/// Distinct sorted vendors, HSN codes and product names for filter dropdowns.
pub fn collect_filter_options(invoices: &[PurchaseInvoice]) -> FilterOptionsResponse {
    let mut vendors = BTreeSet::new();
    let mut hsn_codes = BTreeSet::new();
    let mut product_names = BTreeSet::new();

    for invoice in invoices {
        vendors.insert(invoice.vendor.clone());
        for product in invoice.products.0.iter() {
            hsn_codes.insert(product.hsn.clone());
            product_names.insert(product.name.clone());
        }
    }

    FilterOptionsResponse {
        vendors: vendors.into_iter().collect(),
        hsn_codes: hsn_codes.into_iter().collect(),
        product_names: product_names.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, hsn: &str, quantity: i64, cost: f64) -> ProductLineRequest {
        ProductLineRequest {
            name: name.to_string(),
            hsn: hsn.to_string(),
            qty_type: QtyType::Pcs,
            quantity,
            cost,
            purchase_date: None,
            expenses: Vec::new(),
        }
    }

    fn invoice(id: i64, vendor: &str, products: Vec<ProductLine>) -> PurchaseInvoice {
        PurchaseInvoice {
            id,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            vendor: vendor.to_string(),
            phone: "9876543210".to_string(),
            products: Json(products),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_ten_digit_phone() {
        let products = vec![line("Widget", "1234", 10, 5.0)];
        assert!(validate_invoice_input("Acme", "1234567890", &products).is_ok());
    }

    #[test]
    fn rejects_short_phone() {
        let products = vec![line("Widget", "1234", 10, 5.0)];
        let err = validate_invoice_input("Acme", "12345", &products).unwrap_err();
        assert_eq!(err, "Phone number must be 10 digits");
    }

    #[test]
    fn rejects_non_numeric_phone() {
        let products = vec![line("Widget", "1234", 10, 5.0)];
        assert!(validate_invoice_input("Acme", "987654321x", &products).is_err());
    }

    #[test]
    fn rejects_empty_product_list() {
        let err = validate_invoice_input("Acme", "9876543210", &[]).unwrap_err();
        assert_eq!(err, "At least one product is required");
    }

    #[test]
    fn rejects_zero_quantity() {
        let products = vec![line("Widget", "1234", 0, 5.0)];
        assert!(validate_invoice_input("Acme", "9876543210", &products).is_err());
    }

    #[test]
    fn rejects_negative_cost() {
        let products = vec![line("Widget", "1234", 1, -0.5)];
        assert!(validate_invoice_input("Acme", "9876543210", &products).is_err());
    }

    #[test]
    fn total_cost_is_quantity_times_cost() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let lines = build_product_lines(date, &[line("Widget", "1234", 10, 5.0)]);
        assert_eq!(lines[0].total_cost, 50.0);
        assert_eq!(lines[0].purchase_date, date);
    }

    #[test]
    fn per_line_purchase_date_overrides_invoice_date() {
        let invoice_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let line_date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let mut req = line("Widget", "1234", 2, 3.0);
        req.purchase_date = Some(line_date);
        let lines = build_product_lines(invoice_date, &[req]);
        assert_eq!(lines[0].purchase_date, line_date);
    }

    #[test]
    fn flatten_yields_one_row_per_product_with_composite_id() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let products = build_product_lines(
            date,
            &[line("Widget", "1234", 10, 5.0), line("Gadget", "5678", 2, 20.0)],
        );
        let invoices = vec![invoice(7, "Acme", products)];

        let rows = flatten_products(&invoices);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "7-0");
        assert_eq!(rows[1].id, "7-1");
        assert_eq!(rows[0].unit_cost, 5.0);
        assert_eq!(rows[1].original_total_cost, 40.0);
        assert_eq!(rows[0].vendor, "Acme");
    }

    #[test]
    fn filter_options_are_distinct_and_sorted() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let invoices = vec![
            invoice(1, "Zeta", build_product_lines(date, &[line("Widget", "1234", 1, 1.0)])),
            invoice(2, "Acme", build_product_lines(date, &[line("Widget", "1234", 1, 1.0), line("Gadget", "5678", 1, 1.0)])),
        ];

        let options = collect_filter_options(&invoices);
        assert_eq!(options.vendors, vec!["Acme", "Zeta"]);
        assert_eq!(options.hsn_codes, vec!["1234", "5678"]);
        assert_eq!(options.product_names, vec!["Gadget", "Widget"]);
    }
}

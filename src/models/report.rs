// src/models/report.rs
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::dtos::report::{
    ExpenseSummaryResponse, HsnReportRow, MonthlyReportRow, OverallSummary, VendorSummary,
};
use crate::models::expense::Expense;
use crate::models::purchase::PurchaseInvoice;

/// Overall + per-vendor aggregate over already-filtered expense records.
/// Records with a zero original cost contribute 0 to the percentage average
/// instead of producing NaN/Infinity.
pub fn summarize_expenses(records: &[Expense]) -> ExpenseSummaryResponse {
    let mut overall = OverallSummary {
        total_records: records.len() as i64,
        total_original_cost: 0.0,
        total_additional_expenses: 0.0,
        total_final_cost: 0.0,
        avg_additional_expense_percentage: 0.0,
    };

    let mut percentage_sum = 0.0;
    let mut by_vendor: HashMap<String, VendorSummary> = HashMap::new();

    for record in records {
        let original = record.product_details.0.original_total_cost;
        overall.total_original_cost += original;
        overall.total_additional_expenses += record.total_additional_expenses;
        overall.total_final_cost += record.final_total_cost;
        if original > 0.0 {
            percentage_sum += record.total_additional_expenses / original * 100.0;
        }

        let vendor = by_vendor
            .entry(record.product_vendor.clone())
            .or_insert_with(|| VendorSummary {
                vendor: record.product_vendor.clone(),
                total_records: 0,
                total_original_cost: 0.0,
                total_additional_expenses: 0.0,
                total_final_cost: 0.0,
            });
        vendor.total_records += 1;
        vendor.total_original_cost += original;
        vendor.total_additional_expenses += record.total_additional_expenses;
        vendor.total_final_cost += record.final_total_cost;
    }

    if !records.is_empty() {
        overall.avg_additional_expense_percentage = percentage_sum / records.len() as f64;
    }

    let mut by_vendor: Vec<VendorSummary> = by_vendor.into_values().collect();
    by_vendor.sort_by(|a, b| {
        b.total_final_cost
            .partial_cmp(&a.total_final_cost)
            .unwrap_or(Ordering::Equal)
    });

    ExpenseSummaryResponse { overall, by_vendor }
}

// Additional expense totals keyed by the expense record match key
fn expense_totals_by_product(expenses: &[Expense]) -> HashMap<(i64, &str, &str), f64> {
    expenses
        .iter()
        .map(|e| {
            (
                (e.purchase_invoice_id, e.product_name.as_str(), e.product_hsn.as_str()),
                e.total_additional_expenses,
            )
        })
        .collect()
}

/// Groups invoices by `YYYY-MM` of the invoice date; additional expenses are
/// taken from the attached Expense records. Newest month first.
pub fn monthly_rollup(invoices: &[PurchaseInvoice], expenses: &[Expense]) -> Vec<MonthlyReportRow> {
    let attached = expense_totals_by_product(expenses);
    // Product lines sharing (name, hsn) collapse onto one expense record;
    // count that record once, not once per line
    let mut counted: HashSet<(i64, &str, &str)> = HashSet::new();

    struct Bucket {
        total_purchases: i64,
        total_amount: f64,
        total_expenses: f64,
        vendors: HashSet<String>,
        products: i64,
    }

    let mut months: BTreeMap<String, Bucket> = BTreeMap::new();

    for invoice in invoices {
        let month = invoice.date.format("%Y-%m").to_string();
        let bucket = months.entry(month).or_insert_with(|| Bucket {
            total_purchases: 0,
            total_amount: 0.0,
            total_expenses: 0.0,
            vendors: HashSet::new(),
            products: 0,
        });

        bucket.total_purchases += 1;
        bucket.vendors.insert(invoice.vendor.clone());
        bucket.products += invoice.products.0.len() as i64;

        for product in invoice.products.0.iter() {
            bucket.total_amount += product.total_cost;
            let key = (invoice.id, product.name.as_str(), product.hsn.as_str());
            if let Some(extra) = attached.get(&key) {
                if counted.insert(key) {
                    bucket.total_expenses += extra;
                }
            }
        }
    }

    // BTreeMap iterates ascending; newest month first on the way out
    months
        .into_iter()
        .rev()
        .map(|(month, bucket)| MonthlyReportRow {
            month,
            total_purchases: bucket.total_purchases,
            total_amount: bucket.total_amount,
            total_expenses: bucket.total_expenses,
            vendors: bucket.vendors.len() as i64,
            products: bucket.products,
        })
        .collect()
}

/// Groups product lines by HSN code; sorted descending by base amount.
pub fn hsn_rollup(invoices: &[PurchaseInvoice], expenses: &[Expense]) -> Vec<HsnReportRow> {
    let attached = expense_totals_by_product(expenses);
    // Same dedupe as the monthly rollup: one expense record, one count
    let mut counted: HashSet<(i64, &str, &str)> = HashSet::new();

    struct Bucket {
        total_quantity: i64,
        total_amount: f64,
        total_expenses: f64,
        vendors: HashSet<String>,
    }

    let mut groups: BTreeMap<String, Bucket> = BTreeMap::new();

    for invoice in invoices {
        for product in invoice.products.0.iter() {
            let bucket = groups.entry(product.hsn.clone()).or_insert_with(|| Bucket {
                total_quantity: 0,
                total_amount: 0.0,
                total_expenses: 0.0,
                vendors: HashSet::new(),
            });

            bucket.total_quantity += product.quantity;
            bucket.total_amount += product.total_cost;
            bucket.vendors.insert(invoice.vendor.clone());
            let key = (invoice.id, product.name.as_str(), product.hsn.as_str());
            if let Some(extra) = attached.get(&key) {
                if counted.insert(key) {
                    bucket.total_expenses += extra;
                }
            }
        }
    }

    let mut rows: Vec<HsnReportRow> = groups
        .into_iter()
        .map(|(hsn, bucket)| HsnReportRow {
            hsn,
            total_quantity: bucket.total_quantity,
            total_amount: bucket.total_amount,
            total_expenses: bucket.total_expenses,
            vendors: bucket.vendors.len() as i64,
            avg_cost_per_unit: if bucket.total_quantity > 0 {
                bucket.total_amount / bucket.total_quantity as f64
            } else {
                0.0
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_amount
            .partial_cmp(&a.total_amount)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

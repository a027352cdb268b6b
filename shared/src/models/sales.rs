//! Sales uploads and sales aggregation

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Spreadsheet extensions the ingestion pipeline understands
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

/// Label for sales with neither a product name nor a SKU
pub const UNKNOWN_PRODUCT: &str = "Produto desconhecido";

text_enum! {
    pub enum SalesUploadStatus {
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Fresh upload identifier: `upload_` followed by 20 hex characters
pub fn new_upload_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("upload_{}", &hex[..20])
}

/// Accept only spreadsheet files, judged by extension
pub fn validate_spreadsheet(filename: &str) -> DomainResult<&str> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    SPREADSHEET_EXTENSIONS
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(ext))
        .copied()
        .ok_or_else(|| {
            DomainError::validation("Formato de arquivo inválido. Envie .xlsx, .xls ou .csv")
        })
}

/// A recorded sale, as written by the ingestion pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub sku: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub name: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesByProduct {
    pub products: Vec<ProductSales>,
    pub total_products: usize,
    pub total_revenue: Decimal,
    pub total_quantity: Decimal,
}

/// Group sales by product, ranked by revenue (highest first)
pub fn aggregate_sales(lines: &[SaleLine]) -> SalesByProduct {
    let mut by_product: HashMap<String, ProductSales> = HashMap::new();
    for line in lines {
        let name = line
            .product_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| line.sku.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        let entry = by_product
            .entry(name.clone())
            .or_insert_with(|| ProductSales {
                name,
                quantity: Decimal::ZERO,
                revenue: Decimal::ZERO,
            });
        entry.quantity = entry.quantity.saturating_add(line.quantity);
        entry.revenue = entry
            .revenue
            .saturating_add(line.quantity.saturating_mul(line.unit_price));
    }

    let mut products: Vec<ProductSales> = by_product.into_values().collect();
    products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));

    SalesByProduct {
        total_products: products.len(),
        total_revenue: products
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.revenue)),
        total_quantity: products
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.quantity)),
        products,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(name: Option<&str>, sku: Option<&str>, qty: i64, price: i64) -> SaleLine {
        SaleLine {
            sku: sku.map(str::to_string),
            product_name: name.map(str::to_string),
            quantity: Decimal::from(qty),
            unit_price: Decimal::from(price),
        }
    }

    #[test]
    fn test_upload_id_shape() {
        let id = new_upload_id();
        assert!(id.starts_with("upload_"));
        assert_eq!(id.len(), "upload_".len() + 20);
        assert!(id["upload_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_validate_spreadsheet() {
        assert_eq!(validate_spreadsheet("vendas.XLSX"), Ok("xlsx"));
        assert_eq!(validate_spreadsheet("vendas.csv"), Ok("csv"));
        assert!(validate_spreadsheet("vendas.pdf").is_err());
        assert!(validate_spreadsheet("vendas").is_err());
    }

    #[test]
    fn test_aggregate_sales() {
        let report = aggregate_sales(&[
            sale(Some("Moqueca"), Some("M1"), 2, 80),
            sale(Some("Moqueca"), Some("M1"), 1, 80),
            sale(None, Some("SUCO"), 5, 10),
            sale(None, None, 1, 5),
        ]);
        assert_eq!(report.total_products, 3);
        assert_eq!(report.products[0].name, "Moqueca");
        assert_eq!(report.products[0].quantity, Decimal::from(3));
        assert_eq!(report.products[1].name, "SUCO");
        assert_eq!(report.products[2].name, UNKNOWN_PRODUCT);
        assert_eq!(report.total_revenue, Decimal::from(295));
        assert_eq!(report.total_quantity, Decimal::from(9));
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CategorySummary;

/// A product row joined with its category's name and code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub price: Decimal,
    pub image: String,
    pub minimum_quantity: i32,
    pub discount_rate: Decimal,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub category_code: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub price: Decimal,
    pub image: String,
    pub minimum_quantity: i32,
    pub discount_rate: Decimal,
    pub discount_price: Decimal,
    pub category: Option<CategorySummary>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn discount_price(price: Decimal, discount_rate: Decimal) -> Decimal {
    price - discount_rate / Decimal::ONE_HUNDRED * price
}

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_code) {
            (Some(id), Some(name), Some(code)) => Some(CategorySummary { id, name, code }),
            _ => None,
        };

        Self {
            id: row.id,
            discount_price: discount_price(row.price, row.discount_rate),
            name: row.name,
            code: row.code,
            price: row.price,
            image: row.image,
            minimum_quantity: row.minimum_quantity,
            discount_rate: row.discount_rate,
            category,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub minimum_quantity: Option<i64>,
    pub discount_rate: Option<Decimal>,
    pub category: Option<i32>,
}

/// Fields of a validated create request.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub code: String,
    pub price: Decimal,
    pub image: String,
    pub minimum_quantity: i32,
    pub discount_rate: Decimal,
    pub category_id: i32,
}

/// Fields of a validated update request; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub minimum_quantity: Option<i32>,
    pub discount_rate: Option<Decimal>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProductQuery {
    pub fn has_filters(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.name) || present(&self.code) || self.category.is_some()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlQuery {
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub pre_signed_url: Option<String>,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn row() -> ProductRow {
        let now = Utc::now();
        ProductRow {
            id: 1,
            name: "Desk".to_string(),
            code: "PRO-1".to_string(),
            price: dec("200"),
            image: "https://cdn.test/desk.png".to_string(),
            minimum_quantity: 2,
            discount_rate: dec("15"),
            category_id: Some(4),
            category_name: Some("Furniture".to_string()),
            category_code: Some("CAT-1".to_string()),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn discount_price_subtracts_the_rate_percentage() {
        assert_eq!(discount_price(dec("200"), dec("15")), dec("170"));
        assert_eq!(discount_price(dec("20.3"), dec("0")), dec("20.3"));
        assert_eq!(discount_price(dec("80"), dec("100")), Decimal::ZERO);
    }

    #[test]
    fn response_embeds_category_and_derived_price() {
        let response = ProductResponse::from(row());
        assert_eq!(response.discount_price, dec("170"));
        assert_eq!(
            response.category,
            Some(CategorySummary {
                id: 4,
                name: "Furniture".to_string(),
                code: "CAT-1".to_string(),
            })
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["discountPrice"], 170.0);
        assert_eq!(json["minimumQuantity"], 2);
    }

    #[test]
    fn orphaned_product_has_no_category() {
        let mut orphan = row();
        orphan.category_id = None;
        orphan.category_name = None;
        orphan.category_code = None;

        assert!(ProductResponse::from(orphan).category.is_none());
    }

    #[test]
    fn blank_filters_do_not_count() {
        let query = ProductQuery {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(!query.has_filters());

        let query = ProductQuery {
            category: Some(3),
            ..Default::default()
        };
        assert!(query.has_filters());
    }
}

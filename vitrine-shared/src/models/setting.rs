/// Store settings model
///
/// A single-row table holding store-wide configuration: currency, tax rate,
/// shipping fees and feature toggles. The boolean primary key with a CHECK
/// keeps it a singleton at the database level.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE settings (
///     id BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (id),
///     currency VARCHAR(8) NOT NULL DEFAULT 'INR',
///     tax_rate DOUBLE PRECISION NOT NULL DEFAULT 0,
///     shipping_fee DOUBLE PRECISION NOT NULL DEFAULT 0,
///     free_shipping_threshold DOUBLE PRECISION,
///     features JSONB NOT NULL DEFAULT '{}',
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

const SETTING_COLUMNS: &str =
    "id, currency, tax_rate, shipping_fee, free_shipping_threshold, features, updated_at";

/// Store-wide settings singleton
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    #[serde(skip_serializing)]
    pub id: bool,

    /// ISO currency code shown by the storefront
    pub currency: String,

    /// Tax applied to the order subtotal, as a fraction (0.18 = 18%)
    pub tax_rate: f64,

    /// Flat shipping fee per order
    pub shipping_fee: f64,

    /// Subtotal above which shipping is free; None disables the rule
    pub free_shipping_threshold: Option<f64>,

    /// Arbitrary feature toggles consumed by the storefront
    pub features: Json<serde_json::Value>,

    pub updated_at: DateTime<Utc>,
}

/// Input for updating settings; only non-None fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSetting {
    pub currency: Option<String>,

    pub tax_rate: Option<f64>,

    pub shipping_fee: Option<f64>,

    pub free_shipping_threshold: Option<Option<f64>>,

    pub features: Option<serde_json::Value>,
}

impl Setting {
    /// Fetches the settings row, seeding defaults on first access
    pub async fn get(pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Setting>(&format!(
            r#"
            INSERT INTO settings (id)
            VALUES (TRUE)
            ON CONFLICT (id) DO UPDATE SET id = TRUE
            RETURNING {SETTING_COLUMNS}
            "#
        ))
        .fetch_one(pool)
        .await
    }

    /// Updates the settings singleton
    pub async fn update(pool: &PgPool, data: UpdateSetting) -> Result<Self, sqlx::Error> {
        // Seed the row first so the UPDATE always has a target
        Self::get(pool).await?;

        let mut query = String::from("UPDATE settings SET updated_at = NOW()");
        let mut bind_count = 0;

        if data.currency.is_some() {
            bind_count += 1;
            query.push_str(&format!(", currency = ${}", bind_count));
        }
        if data.tax_rate.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tax_rate = ${}", bind_count));
        }
        if data.shipping_fee.is_some() {
            bind_count += 1;
            query.push_str(&format!(", shipping_fee = ${}", bind_count));
        }
        if data.free_shipping_threshold.is_some() {
            bind_count += 1;
            query.push_str(&format!(", free_shipping_threshold = ${}", bind_count));
        }
        if data.features.is_some() {
            bind_count += 1;
            query.push_str(&format!(", features = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = TRUE RETURNING {SETTING_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Setting>(&query);

        if let Some(currency) = data.currency {
            q = q.bind(currency);
        }
        if let Some(tax_rate) = data.tax_rate {
            q = q.bind(tax_rate);
        }
        if let Some(shipping_fee) = data.shipping_fee {
            q = q.bind(shipping_fee);
        }
        if let Some(threshold) = data.free_shipping_threshold {
            q = q.bind(threshold);
        }
        if let Some(features) = data.features {
            q = q.bind(Json(features));
        }

        q.fetch_one(pool).await
    }

    /// Shipping fee for a given subtotal, honoring the free-shipping rule
    pub fn shipping_for(&self, subtotal: f64) -> f64 {
        match self.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => 0.0,
            _ => self.shipping_fee,
        }
    }

    /// Tax for a given subtotal
    pub fn tax_for(&self, subtotal: f64) -> f64 {
        subtotal * self.tax_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_setting() -> Setting {
        Setting {
            id: true,
            currency: "INR".to_string(),
            tax_rate: 0.18,
            shipping_fee: 50.0,
            free_shipping_threshold: Some(500.0),
            features: Json(serde_json::json!({})),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_shipping_free_above_threshold() {
        let setting = sample_setting();
        assert_eq!(setting.shipping_for(499.99), 50.0);
        assert_eq!(setting.shipping_for(500.0), 0.0);
        assert_eq!(setting.shipping_for(1200.0), 0.0);
    }

    #[test]
    fn test_shipping_without_threshold() {
        let mut setting = sample_setting();
        setting.free_shipping_threshold = None;
        assert_eq!(setting.shipping_for(10_000.0), 50.0);
    }

    #[test]
    fn test_tax_for() {
        let setting = sample_setting();
        assert!((setting.tax_for(100.0) - 18.0).abs() < f64::EPSILON);
    }
}

use crate::domain::prediction::{PersistedRecord, StoredPrediction, SuitabilityLabel};
use crate::domain::repositories::PredictionRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

pub struct SqlitePredictionRepository {
    pool: SqlitePool,
}

impl SqlitePredictionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: SqliteRow) -> Result<StoredPrediction> {
        let crop: String = row.try_get("crop_type")?;
        let suitability: String = row.try_get("suitability")?;
        let recommendations: String = row.try_get("recommendations")?;
        let profitability: Option<String> = row.try_get("profitability_data")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(StoredPrediction {
            id: row.try_get("prediction_id")?,
            user_id: row.try_get("user_id")?,
            crop_type: crop
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Stored crop_type: {}", e))?,
            farm_area: row.try_get("farm_area")?,
            predicted_yield: row.try_get("predicted_yield")?,
            confidence: row.try_get("confidence")?,
            suitability: suitability.parse::<SuitabilityLabel>()?,
            recommendations: serde_json::from_str(&recommendations)
                .context("Stored recommendations are not a JSON array")?,
            profitability: profitability
                .map(|raw| serde_json::from_str::<BTreeMap<String, f64>>(&raw))
                .transpose()
                .context("Stored profitability_data is not a JSON object")?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .context("Stored created_at is not RFC 3339")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl PredictionRepository for SqlitePredictionRepository {
    async fn save(&self, record: &PersistedRecord) -> Result<()> {
        let features = record.features();
        let result = record.result();

        let recommendations = serde_json::to_string(result.recommendations())?;
        let profitability = result
            .profitability()
            .map(serde_json::to_string)
            .transpose()?;

        // Held for this one write and returned to the pool on drop
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire database connection")?;

        sqlx::query(
            r#"
            INSERT INTO yield_predictions (
                prediction_id, user_id, crop_type, farm_area, soil_type, soil_ph,
                water_usage, fertilizer, temperature, humidity, predicted_yield,
                confidence, suitability, recommendations, profitability_data,
                yield_source, model_version, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id())
        .bind(features.user_id())
        .bind(features.crop_type().as_str())
        .bind(features.farm_area())
        .bind(features.soil_type().as_str())
        .bind(features.soil_ph())
        .bind(features.water_usage())
        .bind(features.fertilizer())
        .bind(features.temperature())
        .bind(features.humidity())
        .bind(result.predicted_yield())
        .bind(result.confidence())
        .bind(result.suitability().to_string())
        .bind(recommendations)
        .bind(profitability)
        .bind(result.yield_source().as_str())
        .bind(result.model_version())
        .bind(record.created_at().to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to save prediction")?;

        Ok(())
    }

    async fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredPrediction>> {
        let rows = sqlx::query(
            r#"
            SELECT prediction_id, user_id, crop_type, farm_area, predicted_yield, confidence,
                   suitability, recommendations, profitability_data, created_at
            FROM yield_predictions
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load recent predictions")?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }
}

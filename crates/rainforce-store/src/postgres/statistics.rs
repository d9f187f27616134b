use async_trait::async_trait;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{RainfallStatistic, Rcp, Scenario, StatisticKey, StatisticKind};
use sqlx::Row;

use super::{storage_error, PostgresStore};
use crate::ports::StatisticsStore;

fn parse_kind(s: &str) -> Result<StatisticKind> {
    match s {
        "depth" => Ok(StatisticKind::Depth),
        "intensity" => Ok(StatisticKind::Intensity),
        other => Err(RainforceError::Storage(format!("Unknown stored statistic kind '{}'", other))),
    }
}

#[async_trait]
impl StatisticsStore for PostgresStore {
    async fn get(&self, key: &StatisticKey) -> Result<Option<RainfallStatistic>> {
        let row = sqlx::query(
            r#"
            SELECT return_period, rcp, time_period, kind, value
            FROM rainfall_statistics
            WHERE site_id = $1 AND scenario_key = $2 AND duration_mins = $3 AND kind = $4
            "#,
        )
        .bind(key.site_id.as_str())
        .bind(key.scenario.key())
        .bind(key.duration_mins as i32)
        .bind(key.kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to get statistic"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let rcp = row
            .get::<Option<String>, _>("rcp")
            .map(|label| label.parse::<Rcp>())
            .transpose()?;

        Ok(Some(RainfallStatistic {
            site_id: key.site_id.clone(),
            scenario: Scenario {
                return_period: row.get("return_period"),
                rcp,
                time_period: row.get("time_period"),
            },
            duration_mins: key.duration_mins,
            kind: parse_kind(row.get::<&str, _>("kind"))?,
            value: row.get("value"),
        }))
    }

    async fn put(&self, statistic: &RainfallStatistic) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rainfall_statistics
                (site_id, scenario_key, return_period, rcp, time_period, duration_mins, kind, value)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (site_id, scenario_key, duration_mins, kind) DO UPDATE
            SET value = EXCLUDED.value,
                fetched_at = now()
            "#,
        )
        .bind(statistic.site_id.as_str())
        .bind(statistic.scenario.key())
        .bind(statistic.scenario.return_period)
        .bind(statistic.scenario.rcp.map(|r| r.label()))
        .bind(statistic.scenario.time_period.as_deref())
        .bind(statistic.duration_mins as i32)
        .bind(statistic.kind.as_str())
        .bind(statistic.value)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to store statistic"))?;

        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rainfall_statistics")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count statistics"))?;
        Ok(count as usize)
    }
}

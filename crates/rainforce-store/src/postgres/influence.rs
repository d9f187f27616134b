use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{InfluenceArea, SiteId};
use rainforce_geo::models::{parse_wkt, region_key};
use rainforce_geo::spatial::{envelope, same_region};
use sqlx::{PgConnection, Row};
use uuid::Uuid;

use super::{storage_error, PostgresStore};
use crate::ports::InfluenceAreaStore;

/// Ids of stored regions equal to `region`
///
/// Candidates are narrowed by exact bounding box, then compared topologically.
async fn matching_region_ids(
    conn: &mut PgConnection,
    region: &MultiPolygon<f64>,
) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
    let Some(bbox) = envelope(region) else {
        return Ok(Vec::new());
    };

    let rows = sqlx::query(
        r#"
        SELECT id, region_wkt, created_at
        FROM influence_regions
        WHERE min_x = $1 AND min_y = $2 AND max_x = $3 AND max_y = $4
        "#,
    )
    .bind(bbox.min().x)
    .bind(bbox.min().y)
    .bind(bbox.max().x)
    .bind(bbox.max().y)
    .fetch_all(&mut *conn)
    .await
    .map_err(storage_error("Failed to query influence regions"))?;

    let mut matches = Vec::new();
    for row in rows {
        let wkt: String = row.get("region_wkt");
        match parse_wkt(&wkt) {
            Ok(stored) if same_region(&stored, region) => {
                matches.push((row.get("id"), row.get("created_at")))
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable stored region"),
        }
    }
    Ok(matches)
}

#[async_trait]
impl InfluenceAreaStore for PostgresStore {
    async fn find_by_region(&self, region: &MultiPolygon<f64>) -> Result<Option<Vec<InfluenceArea>>> {
        let mut conn = self.pool.acquire().await.map_err(storage_error("Failed to acquire connection"))?;

        let Some((region_id, created_at)) =
            matching_region_ids(&mut conn, region).await?.into_iter().next()
        else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT site_id, site_lon, site_lat, geometry
            FROM influence_areas
            WHERE region_id = $1
            ORDER BY ordinal
            "#,
        )
        .bind(region_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(storage_error("Failed to load influence areas"))?;

        let mut areas = Vec::with_capacity(rows.len());
        for row in rows {
            let geometry: serde_json::Value = row.get("geometry");
            let geometry: MultiPolygon<f64> = serde_json::from_value(geometry).map_err(|e| {
                RainforceError::Serialization(format!("Invalid stored influence geometry: {}", e))
            })?;
            areas.push(InfluenceArea {
                site_id: SiteId::new(row.get::<String, _>("site_id")),
                site_location: [row.get("site_lon"), row.get("site_lat")],
                geometry,
            });
        }

        tracing::debug!(%region_id, %created_at, areas = areas.len(), "Influence areas found in store");
        Ok(Some(areas))
    }

    async fn put(&self, region: &MultiPolygon<f64>, areas: &[InfluenceArea]) -> Result<()> {
        let bbox = envelope(region).ok_or_else(|| {
            RainforceError::insufficient_input("influence store", "region polygon is empty")
        })?;

        let mut tx = self.pool.begin().await.map_err(storage_error("Failed to begin transaction"))?;

        for (stale, _) in matching_region_ids(&mut tx, region).await? {
            sqlx::query("DELETE FROM influence_regions WHERE id = $1")
                .bind(stale)
                .execute(&mut *tx)
                .await
                .map_err(storage_error("Failed to replace influence region"))?;
        }

        let region_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO influence_regions (id, min_x, min_y, max_x, max_y, region_wkt)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(region_id)
        .bind(bbox.min().x)
        .bind(bbox.min().y)
        .bind(bbox.max().x)
        .bind(bbox.max().y)
        .bind(region_key(region))
        .execute(&mut *tx)
        .await
        .map_err(storage_error("Failed to store influence region"))?;

        for (ordinal, area) in areas.iter().enumerate() {
            let geometry = serde_json::to_value(&area.geometry)?;
            sqlx::query(
                r#"
                INSERT INTO influence_areas (region_id, ordinal, site_id, site_lon, site_lat, geometry)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(region_id)
            .bind(ordinal as i32)
            .bind(area.site_id.as_str())
            .bind(area.site_location[0])
            .bind(area.site_location[1])
            .bind(geometry)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to store influence area"))?;
        }

        tx.commit().await.map_err(storage_error("Failed to commit influence areas"))?;
        Ok(())
    }

    async fn remove(&self, region: &MultiPolygon<f64>) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(storage_error("Failed to begin transaction"))?;

        let matches = matching_region_ids(&mut tx, region).await?;
        for (id, _) in &matches {
            sqlx::query("DELETE FROM influence_regions WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(storage_error("Failed to remove influence region"))?;
        }

        tx.commit().await.map_err(storage_error("Failed to commit removal"))?;
        Ok(!matches.is_empty())
    }
}

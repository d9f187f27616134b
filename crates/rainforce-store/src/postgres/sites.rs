use async_trait::async_trait;
use geo::MultiPolygon;
use rainforce_core::error::Result;
use rainforce_core::models::{Site, SiteId};
use rainforce_geo::spatial::{covers_point, envelope};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{storage_error, PostgresStore};
use crate::ports::SiteRegistry;

fn site_from_row(row: &PgRow) -> Site {
    Site {
        id: SiteId::new(row.get::<String, _>("site_id")),
        name: row.get("name"),
        location: [row.get("lon"), row.get("lat")],
    }
}

#[async_trait]
impl SiteRegistry for PostgresStore {
    async fn store_sites(&self, sites: &[Site]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(storage_error("Failed to begin transaction"))?;

        for site in sites {
            sqlx::query(
                r#"
                INSERT INTO rainfall_sites (site_id, name, lon, lat)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (site_id) DO UPDATE
                SET name = EXCLUDED.name,
                    lon = EXCLUDED.lon,
                    lat = EXCLUDED.lat
                "#,
            )
            .bind(site.id.as_str())
            .bind(site.name.as_deref())
            .bind(site.lon())
            .bind(site.lat())
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to store site"))?;
        }

        tx.commit().await.map_err(storage_error("Failed to commit sites"))?;
        Ok(sites.len())
    }

    async fn all_sites(&self) -> Result<Vec<Site>> {
        let rows = sqlx::query("SELECT site_id, name, lon, lat FROM rainfall_sites ORDER BY site_id")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("Failed to list sites"))?;

        Ok(rows.iter().map(site_from_row).collect())
    }

    async fn list_sites(&self, region: &MultiPolygon<f64>) -> Result<Vec<Site>> {
        let Some(bbox) = envelope(region) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT site_id, name, lon, lat
            FROM rainfall_sites
            WHERE lon BETWEEN $1 AND $2 AND lat BETWEEN $3 AND $4
            ORDER BY site_id
            "#,
        )
        .bind(bbox.min().x)
        .bind(bbox.max().x)
        .bind(bbox.min().y)
        .bind(bbox.max().y)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to query sites in region"))?;

        Ok(rows
            .iter()
            .map(site_from_row)
            .filter(|site| covers_point(region, site.location))
            .collect())
    }

    async fn site_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rainfall_sites")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count sites"))?;
        Ok(count as usize)
    }
}

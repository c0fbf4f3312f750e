//! Reads and writes of the `countries` table.

use std::future::Future;
use std::pin::Pin;

use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use atlas_core::aggregate::{region_totals, RegionTotal, RegionTotalsSource};
use atlas_core::country::Country;
use atlas_core::error::{AtlasError, Result};
use atlas_core::schema::{column_list, create_table_sql, COUNTRIES_TABLE, STAGING_TABLE};

use super::pool::Database;

/// Rows per INSERT statement. Eight binds per row keeps this far below the
/// PostgreSQL limit of 65535 parameters.
const INSERT_BATCH: usize = 1000;

/// Access to the countries table.
#[derive(Clone)]
pub struct CountryStore {
    db: Database,
}

impl CountryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Read the whole table in storage order.
    pub async fn fetch_all(&self) -> Result<Vec<Country>> {
        let sql = format!("SELECT {} FROM {}", column_list(), COUNTRIES_TABLE);
        let rows = sqlx::query(&sql)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AtlasError::Database(format!("Failed to read countries: {}", e)))?;

        rows.iter().map(country_from_row).collect()
    }

    /// Total population per region, summed over every row in the table.
    pub async fn region_totals(&self) -> Result<Vec<RegionTotal>> {
        let sql = format!("SELECT region, population FROM {}", COUNTRIES_TABLE);
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(&sql)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                AtlasError::Database(format!("Failed to read region populations: {}", e))
            })?;

        Ok(region_totals(rows))
    }

    /// Number of rows in the table.
    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", COUNTRIES_TABLE);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| AtlasError::Database(format!("Failed to count countries: {}", e)))?;
        Ok(count)
    }

    /// Replace the table contents with `countries`.
    ///
    /// Rows are written into a staging table which is then renamed over the
    /// live table, all in one transaction. If anything fails the transaction
    /// is rolled back and the previous table is left as it was.
    pub async fn replace_all(&self, countries: &[Country]) -> Result<u64> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| AtlasError::Database(format!("Failed to begin transaction: {}", e)))?;

        let ddl = [
            format!("DROP TABLE IF EXISTS {}", STAGING_TABLE),
            create_table_sql(STAGING_TABLE),
        ];
        for statement in &ddl {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AtlasError::Database(format!("Failed to prepare staging table: {}", e))
                })?;
        }

        let mut written = 0u64;
        for chunk in countries.chunks(INSERT_BATCH) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                STAGING_TABLE,
                column_list()
            ));
            builder.push_values(chunk, |mut b, c| {
                b.push_bind(c.country.clone())
                    .push_bind(c.official_name.clone())
                    .push_bind(c.capital.clone())
                    .push_bind(c.region.clone())
                    .push_bind(c.subregion.clone())
                    .push_bind(c.population)
                    .push_bind(c.area)
                    .push_bind(c.flag_url.clone());
            });

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| AtlasError::Database(format!("Failed to insert countries: {}", e)))?;
            written += result.rows_affected();
            debug!(rows = chunk.len(), "Inserted batch");
        }

        let swap = [
            format!("DROP TABLE IF EXISTS {}", COUNTRIES_TABLE),
            format!("ALTER TABLE {} RENAME TO {}", STAGING_TABLE, COUNTRIES_TABLE),
        ];
        for statement in &swap {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| AtlasError::Database(format!("Failed to swap tables: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AtlasError::Database(format!("Failed to commit load: {}", e)))?;

        info!(rows = written, table = COUNTRIES_TABLE, "Table replaced");
        Ok(written)
    }
}

impl RegionTotalsSource for CountryStore {
    fn region_totals(&self) -> Pin<Box<dyn Future<Output = Result<Vec<RegionTotal>>> + Send + '_>> {
        Box::pin(CountryStore::region_totals(self))
    }
}

fn country_from_row(row: &PgRow) -> Result<Country> {
    Ok(Country {
        country: row.try_get("country")?,
        official_name: row.try_get("official_name")?,
        capital: row.try_get("capital")?,
        region: row.try_get("region")?,
        subregion: row.try_get("subregion")?,
        population: row.try_get("population")?,
        area: row.try_get("area")?,
        flag_url: row.try_get("flag_url")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Connects to `TEST_DATABASE_URL`, or skips the test when it is unset.
    async fn test_store() -> Option<CountryStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .ok()?;
        Some(CountryStore::new(Database::from_pool(pool)))
    }

    fn country(name: &str, region: Option<&str>, population: i64) -> Country {
        Country {
            country: name.to_string(),
            official_name: None,
            capital: "Unknown".to_string(),
            region: region.map(str::to_string),
            subregion: None,
            population,
            area: 1.5,
            flag_url: None,
        }
    }

    #[test]
    fn test_batch_stays_under_bind_limit() {
        assert!(INSERT_BATCH * 8 < 65535);
    }

    // A single test touches the shared table so parallel test threads never
    // race on it.
    #[tokio::test]
    async fn test_replace_round_trip() {
        let Some(store) = test_store().await else {
            return;
        };

        let first = vec![
            country("A", Some("Europe"), 10),
            country("B", Some("Asia"), 20),
            country("C", Some("Europe"), 5),
        ];
        assert_eq!(store.replace_all(&first).await.unwrap(), 3);
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.fetch_all().await.unwrap(), first);

        let totals = store.region_totals().await.unwrap();
        assert_eq!(
            totals,
            vec![
                RegionTotal {
                    region: "Asia".to_string(),
                    population: 20
                },
                RegionTotal {
                    region: "Europe".to_string(),
                    population: 15
                },
            ]
        );

        // A failed insert rolls back and leaves the previous table in place
        let broken = vec![country("D", Some("Asia"), 7), country("bad\0name", None, 1)];
        let err = store.replace_all(&broken).await.unwrap_err();
        assert!(matches!(err, AtlasError::Database(_)));
        assert_eq!(store.fetch_all().await.unwrap(), first);
        let staging: (Option<String>,) =
            sqlx::query_as("SELECT to_regclass('countries_staging')::text")
                .fetch_one(store.database().pool())
                .await
                .unwrap();
        assert!(staging.0.is_none());

        // A second load fully replaces the first
        let second = vec![country("Z", None, 1)];
        assert_eq!(store.replace_all(&second).await.unwrap(), 1);
        assert_eq!(store.fetch_all().await.unwrap(), second);
        assert!(store.region_totals().await.unwrap().is_empty());

        let staging: (Option<String>,) =
            sqlx::query_as("SELECT to_regclass('countries_staging')::text")
                .fetch_one(store.database().pool())
                .await
                .unwrap();
        assert!(staging.0.is_none());

        // Loading nothing leaves an empty table rather than no table
        assert_eq!(store.replace_all(&[]).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}

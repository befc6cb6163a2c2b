//! Repository layer for rate storage.

use crate::domain::{Currency, Decimal, ParsedRate, StoredRate};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

const SELECT_RATE: &str = r#"
    SELECT id, source_currency, destination_currency, buy_price, sell_price,
           cap_amount, created_at, updated_at
    FROM fx_rates
"#;

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Maps a `fx_rates` row. `entry_id` is 0; callers attach their own ordinal.
fn stored_rate_from_row(row: &SqliteRow) -> Result<StoredRate, sqlx::Error> {
    let source: String = row.try_get("source_currency")?;
    let destination: String = row.try_get("destination_currency")?;
    let buy_price: String = row.try_get("buy_price")?;
    let sell_price: String = row.try_get("sell_price")?;

    Ok(StoredRate {
        id: row.try_get("id")?,
        rate: ParsedRate {
            entry_id: 0,
            source_currency: source.parse::<Currency>().map_err(decode_err)?,
            destination_currency: destination.parse::<Currency>().map_err(decode_err)?,
            buy_price: buy_price.parse::<Decimal>().map_err(decode_err)?,
            sell_price: sell_price.parse::<Decimal>().map_err(decode_err)?,
            cap_amount: row.try_get("cap_amount")?,
        },
        created_at_ms: row.try_get("created_at")?,
        updated_at_ms: row.try_get("updated_at")?,
    })
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip a trivial query to check the pool is usable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create or update one row per currency pair, all in one transaction.
    ///
    /// Returns the rows as stored, carrying the input `entry_id`s and sorted
    /// ascending by them. Any failure rolls back the whole batch.
    ///
    /// # Errors
    /// Returns an error if any statement or the commit fails.
    pub async fn upsert_rates(&self, rates: &[ParsedRate]) -> Result<Vec<ParsedRate>, sqlx::Error> {
        if rates.is_empty() {
            return Ok(Vec::new());
        }

        let now = chrono::Utc::now().timestamp_millis();
        let mut stored = Vec::with_capacity(rates.len());
        let mut tx = self.pool.begin().await?;

        for rate in rates {
            sqlx::query(
                r#"
                INSERT INTO fx_rates (
                    id, source_currency, destination_currency, buy_price, sell_price,
                    cap_amount, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(source_currency, destination_currency) DO UPDATE SET
                    buy_price = excluded.buy_price,
                    sell_price = excluded.sell_price,
                    cap_amount = excluded.cap_amount,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(rate.source_currency.as_str())
            .bind(rate.destination_currency.as_str())
            .bind(rate.buy_price.to_canonical_string())
            .bind(rate.sell_price.to_canonical_string())
            .bind(rate.cap_amount)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query(&format!(
                "{SELECT_RATE} WHERE source_currency = ? AND destination_currency = ?"
            ))
            .bind(rate.source_currency.as_str())
            .bind(rate.destination_currency.as_str())
            .fetch_one(&mut *tx)
            .await?;

            let mut materialized = stored_rate_from_row(&row)?.rate;
            materialized.entry_id = rate.entry_id;
            stored.push(materialized);
        }

        tx.commit().await?;
        debug!(rows = stored.len(), "Upserted FX rates");

        stored.sort_by_key(|rate| rate.entry_id);
        Ok(stored)
    }

    /// Fetch the stored row for one pair.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_rate(
        &self,
        source: Currency,
        destination: Currency,
    ) -> Result<Option<StoredRate>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "{SELECT_RATE} WHERE source_currency = ? AND destination_currency = ?"
        ))
        .bind(source.as_str())
        .bind(destination.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(stored_rate_from_row).transpose()
    }

    /// All stored rows, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_rates(&self) -> Result<Vec<StoredRate>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "{SELECT_RATE} ORDER BY created_at ASC, source_currency ASC, destination_currency ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stored_rate_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn rate(entry_id: usize, source: Currency, destination: Currency, buy: &str, cap: i64) -> ParsedRate {
        ParsedRate {
            entry_id,
            source_currency: source,
            destination_currency: destination,
            buy_price: buy.parse().unwrap(),
            sell_price: "1.2".parse().unwrap(),
            cap_amount: cap,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_and_returns_sorted_by_entry_id() {
        let (repo, _temp) = setup_repo().await;

        let stored = repo
            .upsert_rates(&[
                rate(3, Currency::Eur, Currency::Usd, "1.05", 15000),
                rate(1, Currency::Usd, Currency::Gbp, "0.85", 10000),
            ])
            .await
            .unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].entry_id, 1);
        assert_eq!(stored[0].pair(), (Currency::Usd, Currency::Gbp));
        assert_eq!(stored[1].entry_id, 3);
        assert_eq!(stored[1].buy_price.to_canonical_string(), "1.05");
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_pair_in_place() {
        let (repo, _temp) = setup_repo().await;

        repo.upsert_rates(&[rate(1, Currency::Usd, Currency::Eur, "0.85", 10000)])
            .await
            .unwrap();
        let first = repo
            .get_rate(Currency::Usd, Currency::Eur)
            .await
            .unwrap()
            .expect("row should exist");

        let stored = repo
            .upsert_rates(&[rate(1, Currency::Usd, Currency::Eur, "0.86", 11000)])
            .await
            .unwrap();
        assert_eq!(stored[0].buy_price.to_canonical_string(), "0.86");
        assert_eq!(stored[0].cap_amount, 11000);

        let second = repo
            .get_rate(Currency::Usd, Currency::Eur)
            .await
            .unwrap()
            .expect("row should exist");
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at_ms, first.created_at_ms);
        assert!(second.updated_at_ms >= first.updated_at_ms);
        assert_eq!(repo.list_rates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prices_are_stored_losslessly() {
        let (repo, _temp) = setup_repo().await;

        repo.upsert_rates(&[rate(1, Currency::Jpy, Currency::Usd, "0.00671234", 1_000_000)])
            .await
            .unwrap();

        let row = repo
            .get_rate(Currency::Jpy, Currency::Usd)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.rate.buy_price.to_canonical_string(), "0.00671234");
        assert_eq!(row.rate.cap_amount, 1_000_000);
    }

    #[tokio::test]
    async fn test_get_rate_missing_pair() {
        let (repo, _temp) = setup_repo().await;
        let row = repo.get_rate(Currency::Ngn, Currency::Kes).await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_upsert_empty_batch() {
        let (repo, _temp) = setup_repo().await;
        assert!(repo.upsert_rates(&[]).await.unwrap().is_empty());
        assert!(repo.list_rates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let (repo, _temp) = setup_repo().await;

        sqlx::query("CREATE TRIGGER reject_kes BEFORE INSERT ON fx_rates WHEN NEW.source_currency = 'KES' BEGIN SELECT RAISE(ABORT, 'rejected'); END")
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = repo
            .upsert_rates(&[
                rate(1, Currency::Usd, Currency::Gbp, "0.85", 10000),
                rate(2, Currency::Kes, Currency::Usd, "0.0077", 500),
            ])
            .await;
        assert!(result.is_err());
        assert!(repo.list_rates().await.unwrap().is_empty());
    }
}

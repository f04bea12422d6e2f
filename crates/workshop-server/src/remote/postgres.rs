use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::time::Duration;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{Remote, Row};
use crate::error::RemoteError;

/// `workshops` table in PostgreSQL.
///
/// Rows travel as `jsonb`: reads use `to_jsonb` on the whole row and writes
/// go through `jsonb_populate_record`, so the column list lives only in the
/// migration.
#[derive(Clone)]
pub struct PgRemote {
    pool: PgPool,
}

impl PgRemote {
    /// Create a pool that connects on first use, so an unreachable database
    /// surfaces as a failed load rather than a failed start
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

impl Remote for PgRemote {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Value>, RemoteError>> {
        async move {
            let rows: Vec<(Value,)> =
                sqlx::query_as("SELECT to_jsonb(w) FROM workshops w ORDER BY w.date DESC")
                    .fetch_all(&self.pool)
                    .await?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
        .boxed()
    }

    fn insert(&self, row: Row) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            sqlx::query(
                r#"
                INSERT INTO workshops
                SELECT * FROM jsonb_populate_record(NULL::workshops, $1)
                "#,
            )
            .bind(Value::Object(row))
            .execute(&self.pool)
            .await?;

            Ok(())
        }
        .boxed()
    }

    fn update(&self, id: &str, row: Row) -> BoxFuture<'_, Result<(), RemoteError>> {
        let id = id.to_string();

        async move {
            let count = sqlx::query(
                r#"
                UPDATE workshops AS w
                SET (title, theme, category, lead, date, venue, frequency,
                     agenda, speakers, activities, metrics, feedback, budget, actionplan,
                     attachment_url, attachment_name)
                  = (r.title, r.theme, r.category, r.lead, r.date, r.venue, r.frequency,
                     r.agenda, r.speakers, r.activities, r.metrics, r.feedback, r.budget, r.actionplan,
                     r.attachment_url, r.attachment_name)
                FROM jsonb_populate_record(NULL::workshops, $2) AS r
                WHERE w.id = $1
                "#,
            )
            .bind(&id)
            .bind(Value::Object(row))
            .execute(&self.pool)
            .await?
            .rows_affected();

            if count == 0 {
                Err(RemoteError::Missing(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), RemoteError>> {
        let id = id.to_string();

        async move {
            let count = sqlx::query("DELETE FROM workshops WHERE id = $1")
                .bind(&id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if count == 0 {
                Err(RemoteError::Missing(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn upsert_many(&self, rows: Vec<Row>) -> BoxFuture<'_, Result<(), RemoteError>> {
        async move {
            let batch = Value::Array(rows.into_iter().map(Value::Object).collect());
            sqlx::query(
                r#"
                INSERT INTO workshops
                SELECT * FROM jsonb_populate_recordset(NULL::workshops, $1)
                ON CONFLICT (id) DO UPDATE SET
                    title = EXCLUDED.title,
                    theme = EXCLUDED.theme,
                    category = EXCLUDED.category,
                    lead = EXCLUDED.lead,
                    date = EXCLUDED.date,
                    venue = EXCLUDED.venue,
                    frequency = EXCLUDED.frequency,
                    agenda = EXCLUDED.agenda,
                    speakers = EXCLUDED.speakers,
                    activities = EXCLUDED.activities,
                    metrics = EXCLUDED.metrics,
                    feedback = EXCLUDED.feedback,
                    budget = EXCLUDED.budget,
                    actionplan = EXCLUDED.actionplan,
                    attachment_url = EXCLUDED.attachment_url,
                    attachment_name = EXCLUDED.attachment_name
                "#,
            )
            .bind(batch)
            .execute(&self.pool)
            .await?;

            Ok(())
        }
        .boxed()
    }
}

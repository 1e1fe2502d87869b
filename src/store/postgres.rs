use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{
    apply_set, with_id, Collection, DeleteResult, Document, DocumentStore, Filter,
    InsertOneResult, UpdateResult,
};
use crate::config::AppConfig;

/// Documents kept as JSONB rows, one table per collection.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Builds the pool without connecting; an unreachable database shows up
    /// as per-request failures instead of a startup error.
    pub fn connect_lazy(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.database_url)
            .context("build database pool")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Inserts `fields` under `id`, or merges them into a row a concurrent
/// writer created first.
///
/// `Some(true)` for a fresh insert, `Some(false)` when an existing row was
/// changed, `None` when the existing row already held these values.
async fn insert_or_merge(
    conn: &mut PgConnection,
    table: &str,
    id: Uuid,
    fields: Document,
) -> anyhow::Result<Option<bool>> {
    let row = sqlx::query_as::<_, (bool,)>(&format!(
        "INSERT INTO {table} (id, doc) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET doc = {table}.doc || EXCLUDED.doc \
         WHERE {table}.doc IS DISTINCT FROM {table}.doc || EXCLUDED.doc \
         RETURNING (xmax = 0)"
    ))
    .bind(id)
    .bind(Json(fields))
    .fetch_optional(conn)
    .await
    .with_context(|| format!("upsert into {table}"))?;
    Ok(row.map(|(inserted,)| inserted))
}

fn upsert_outcome(id: Uuid, inserted: Option<bool>) -> UpdateResult {
    match inserted {
        Some(true) => UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id),
        },
        Some(false) | None => UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(inserted.is_some()),
            upserted_count: 0,
            upserted_id: None,
        },
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, coll: Collection, doc: Document) -> anyhow::Result<InsertOneResult> {
        let id = Uuid::new_v4();
        sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            coll.table()
        ))
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert into {}", coll.table()))?;

        debug!(collection = coll.table(), %id, "document inserted");
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find(&self, coll: Collection, filter: Filter) -> anyhow::Result<Vec<Value>> {
        let (clause, param) = match filter {
            Filter::All => ("", None),
            Filter::OwnerEmail(email) => ("WHERE doc -> 'owner' ->> 'email' = $1", Some(email)),
            Filter::Email(email) => ("WHERE doc ->> 'email' = $1", Some(email)),
            Filter::Featured => ("WHERE doc -> 'featured' = 'true'::jsonb", None),
        };
        let sql = format!(
            "SELECT id, doc FROM {} {} ORDER BY created_at",
            coll.table(),
            clause
        );

        let mut query = sqlx::query_as::<_, (Uuid, Json<Document>)>(&sql);
        if let Some(p) = param {
            query = query.bind(p);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("find in {}", coll.table()))?;

        Ok(rows.into_iter().map(|(id, doc)| with_id(id, doc.0)).collect())
    }

    async fn find_one(&self, coll: Collection, id: Uuid) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query_as::<_, (Json<Document>,)>(&format!(
            "SELECT doc FROM {} WHERE id = $1",
            coll.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("find one in {}", coll.table()))?;

        Ok(row.map(|(doc,)| with_id(id, doc.0)))
    }

    async fn update_one_upsert(
        &self,
        coll: Collection,
        id: Uuid,
        fields: Document,
    ) -> anyhow::Result<UpdateResult> {
        let table = coll.table();
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let existing = sqlx::query_as::<_, (Json<Document>,)>(&format!(
            "SELECT doc FROM {table} WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("lock {table} row"))?;

        let result = match existing {
            Some((Json(mut doc),)) => {
                let changed = apply_set(&mut doc, &fields);
                if changed {
                    sqlx::query(&format!("UPDATE {table} SET doc = $2 WHERE id = $1"))
                        .bind(id)
                        .bind(Json(doc))
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("update {table}"))?;
                }
                UpdateResult {
                    acknowledged: true,
                    matched_count: 1,
                    modified_count: u64::from(changed),
                    upserted_count: 0,
                    upserted_id: None,
                }
            }
            None => {
                let inserted = insert_or_merge(&mut *tx, table, id, fields).await?;
                upsert_outcome(id, inserted)
            }
        };

        tx.commit().await.context("commit tx")?;
        debug!(collection = table, %id, upserted = result.upserted_count, "document updated");
        Ok(result)
    }

    async fn delete_one(&self, coll: Collection, id: Uuid) -> anyhow::Result<DeleteResult> {
        let done = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", coll.table()))
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete from {}", coll.table()))?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: done.rows_affected(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

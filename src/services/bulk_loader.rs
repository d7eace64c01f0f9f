use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use crate::database::DbPool;
use crate::models::user::NewUser;

/// Rows per multi-row insert. Keeps each statement well under the store's
/// bound-parameter limit.
pub const BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub start: usize,
    pub end: usize,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What a bulk load did, batch by batch. A failed batch is not retried;
/// callers that need completeness re-check the store themselves.
#[derive(Debug, Clone, Default)]
pub struct BulkLoadReport {
    pub batches: Vec<BatchOutcome>,
}

impl BulkLoadReport {
    pub fn inserted(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.succeeded())
            .map(BatchOutcome::len)
            .sum()
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| !b.succeeded())
    }
}

pub async fn bulk_create(pool: &DbPool, users: &[NewUser]) -> BulkLoadReport {
    bulk_create_in_batches(pool, users, BATCH_SIZE).await
}

/// Inserts `users` one batch at a time, sequentially. A batch that fails is
/// logged and skipped; the load carries on with the next one.
pub async fn bulk_create_in_batches(
    pool: &DbPool,
    users: &[NewUser],
    batch_size: usize,
) -> BulkLoadReport {
    let batch_size = batch_size.max(1);
    let mut report = BulkLoadReport::default();

    for (index, batch) in users.chunks(batch_size).enumerate() {
        let start = index * batch_size;
        let end = start + batch.len();
        tracing::info!("bulk: {} - {}", start, end);

        let error = match insert_batch(pool, batch).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("bulk insert of rows {} - {} failed: {}", start, end, e);
                Some(e.to_string())
            }
        };

        report.batches.push(BatchOutcome { start, end, error });
    }

    tracing::info!(
        inserted = report.inserted(),
        failed_batches = report.failed_batches().count(),
        "Bulk load finished"
    );

    report
}

async fn insert_batch(pool: &DbPool, batch: &[NewUser]) -> Result<(), sqlx::Error> {
    let created_at = Utc::now();

    let mut query = QueryBuilder::<Sqlite>::new(
        "INSERT INTO users (login, name, last_name, password_hash, description, created_at) ",
    );
    query.push_values(batch, |mut row, user| {
        row.push_bind(&user.login)
            .push_bind(&user.name)
            .push_bind(&user.last_name)
            .push_bind(&user.password_hash)
            .push_bind(&user.description)
            .push_bind(created_at);
    });

    query.build().execute(pool.as_ref()).await?;
    Ok(())
}

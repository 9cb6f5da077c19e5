use std::time::Duration;

use async_trait::async_trait;
use common::{Product, User, UserId};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::aggregation::Accumulator;
use crate::update::{apply_all, validate_updates};
use crate::{
    AggregateRow, DocumentStore, Pipeline, ProductFilter, Result, StoreError, UpdateOptions,
    UserFilter, UserUpdate, Version, VersionedUser,
};

/// PostgreSQL-backed document store.
///
/// Documents are kept as JSONB next to a `version` column. Updates lock the
/// row, apply the batch in Rust and write the whole document back inside a
/// single transaction.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and verifies the database is reachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_user(row: &PgRow) -> Result<VersionedUser> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(VersionedUser {
            user: serde_json::from_value(document)?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    fn map_unique_violation(e: sqlx::Error, what: &str) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            let constraint = db_err.constraint().unwrap_or("primary key");
            return StoreError::DuplicateKey(format!("{what} ({constraint})"));
        }
        StoreError::Database(e)
    }

    fn map_numeric_overflow(e: sqlx::Error, pipeline: &Pipeline) -> StoreError {
        // 22003: numeric_value_out_of_range, raised by the ::bigint cast.
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some("22003")
        {
            return StoreError::Overflow(format!(
                "{} total for user {}",
                pipeline.unwind.document_key(),
                pipeline.match_user
            ));
        }
        StoreError::Database(e)
    }
}

/// Escapes LIKE wildcards so a search fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Builds the WHERE clause for a user filter; parameters are bound in
/// id, email, phone order.
fn user_where_clause(filter: &UserFilter) -> String {
    let mut conditions = Vec::new();
    let mut param_count = 0;

    if filter.user_id.is_some() {
        param_count += 1;
        conditions.push(format!("id = ${param_count}"));
    }
    if filter.email.is_some() {
        param_count += 1;
        conditions.push(format!("email = ${param_count}"));
    }
    if filter.phone.is_some() {
        param_count += 1;
        conditions.push(format!("phone = ${param_count}"));
    }

    if conditions.is_empty() {
        return "TRUE".to_string();
    }
    let joiner = if filter.match_any { " OR " } else { " AND " };
    conditions.join(joiner)
}

fn product_where_clause(filter: &ProductFilter) -> String {
    let mut conditions = Vec::new();
    let mut param_count = 0;

    if filter.product_id.is_some() {
        param_count += 1;
        conditions.push(format!("id = ${param_count}"));
    }
    if filter.name_contains.is_some() {
        param_count += 1;
        conditions.push(format!("name ILIKE ${param_count}"));
    }

    if conditions.is_empty() {
        return "TRUE".to_string();
    }
    conditions.join(" AND ")
}

fn pipeline_sql(pipeline: &Pipeline) -> String {
    let field = pipeline.unwind.document_key();
    let accumulator = match pipeline.group {
        Accumulator::SumPrice => format!(
            "SUM((elem ->> '{}')::bigint)::bigint",
            pipeline.unwind.price_key()
        ),
        Accumulator::Count => "COUNT(*)::bigint".to_string(),
    };

    format!(
        r#"
        SELECT u.id AS user_id, {accumulator} AS value
        FROM users u
        CROSS JOIN LATERAL jsonb_array_elements(u.document -> '{field}') AS elem
        WHERE u.id = $1
        GROUP BY u.id
        "#
    )
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert_user(&self, user: User) -> Result<Version> {
        let document = serde_json::to_value(&user)?;
        let version = Version::first();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, phone, version, document)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.email)
        .bind(&user.phone)
        .bind(version.as_i64())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, "user"))?;

        Ok(version)
    }

    async fn find_user(&self, filter: UserFilter) -> Result<Option<VersionedUser>> {
        let sql = format!(
            "SELECT version, document FROM users WHERE {} ORDER BY id LIMIT 1",
            user_where_clause(&filter)
        );

        let mut query = sqlx::query(&sql);
        if let Some(id) = filter.user_id {
            query = query.bind(id.as_uuid());
        }
        if let Some(email) = filter.email {
            query = query.bind(email);
        }
        if let Some(phone) = filter.phone {
            query = query.bind(phone);
        }

        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn count_users(&self, filter: UserFilter) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM users WHERE {}",
            user_where_clause(&filter)
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(id) = filter.user_id {
            query = query.bind(id.as_uuid());
        }
        if let Some(email) = filter.email {
            query = query.bind(email);
        }
        if let Some(phone) = filter.phone {
            query = query.bind(phone);
        }

        let count = query.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        updates: Vec<UserUpdate>,
        options: UpdateOptions,
    ) -> Result<Version> {
        validate_updates(&updates).map_err(|e| StoreError::InvalidUpdate(e.message))?;

        let mut tx = self.pool.begin().await?;

        // Lock the row for the rest of the transaction
        let row: Option<PgRow> =
            sqlx::query("SELECT version, document FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(row) = row else {
            return Err(StoreError::UserNotFound(user_id));
        };
        let VersionedUser { mut user, version } = Self::row_to_user(&row)?;

        if let Some(expected) = options.expected_version
            && version != expected
        {
            metrics::counter!("document_version_conflicts_total").increment(1);
            return Err(StoreError::ConcurrencyConflict {
                user_id,
                expected,
                actual: version,
            });
        }

        apply_all(&mut user, &updates);
        let new_version = version.next();
        let document = serde_json::to_value(&user)?;

        sqlx::query(
            r#"
            UPDATE users SET document = $2, version = $3
            WHERE id = $1 AND version = $4
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(document)
        .bind(new_version.as_i64())
        .bind(version.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(%user_id, version = %new_version, updates = updates.len(), "user document updated");
        Ok(new_version)
    }

    async fn aggregate(&self, pipeline: Pipeline) -> Result<Vec<AggregateRow>> {
        let rows = sqlx::query(&pipeline_sql(&pipeline))
            .bind(pipeline.match_user.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::map_numeric_overflow(e, &pipeline))?;

        rows.iter()
            .map(|row| {
                Ok(AggregateRow {
                    user_id: UserId::from_uuid(row.try_get("user_id")?),
                    value: row.try_get("value")?,
                })
            })
            .collect()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        let document = serde_json::to_value(&product)?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, document)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(product.product_id.as_uuid())
        .bind(&product.product_name)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, "product"))?;

        Ok(())
    }

    async fn find_product(&self, filter: ProductFilter) -> Result<Option<Product>> {
        Ok(self.list_products(filter).await?.into_iter().next())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT document FROM products WHERE {} ORDER BY created_at ASC, id ASC",
            product_where_clause(&filter)
        );

        let mut query = sqlx::query(&sql);
        if let Some(id) = filter.product_id {
            query = query.bind(id.as_uuid());
        }
        if let Some(fragment) = filter.name_contains {
            query = query.bind(like_pattern(&fragment));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_product).collect()
    }
}

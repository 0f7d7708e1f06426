//! Database connection pool management and query binding.

use anyhow::{Context, Result};
use sea_query::{Value, Values};
use sqlx::Postgres;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::QueryAs;

use crate::config::Config;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    Ok(pool)
}

/// Run embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    Ok(())
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Bind a list of SeaQuery values onto an sqlx query, in order.
///
/// SeaQuery's `build()` produces `$N` placeholders plus the matching values;
/// this bridge turns each value into a real bind parameter so nothing
/// user-supplied is ever part of the SQL text. Integer widths widen to what
/// PostgreSQL can encode.
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    values: Values,
) -> Result<QueryAs<'q, Postgres, O, PgArguments>> {
    for value in values.0 {
        query = match value {
            Value::Bool(v) => query.bind(v),
            Value::TinyInt(v) => query.bind(v.map(i16::from)),
            Value::SmallInt(v) => query.bind(v),
            Value::Int(v) => query.bind(v),
            Value::BigInt(v) => query.bind(v),
            Value::TinyUnsigned(v) => query.bind(v.map(i16::from)),
            Value::SmallUnsigned(v) => query.bind(v.map(i32::from)),
            Value::Unsigned(v) => query.bind(v.map(i64::from)),
            Value::BigUnsigned(v) => query.bind(v.map(|n| n as i64)),
            Value::Float(v) => query.bind(v),
            Value::Double(v) => query.bind(v),
            Value::String(v) => query.bind(v.map(|s| *s)),
            Value::Char(v) => query.bind(v.map(|c| c.to_string())),
            Value::Bytes(v) => query.bind(v.map(|b| *b)),
            Value::BigDecimal(v) => query.bind(v.map(|d| *d)),
            Value::ChronoDateTimeUtc(v) => query.bind(v.map(|d| *d)),
            other => anyhow::bail!("unsupported SQL bind value: {other:?}"),
        };
    }

    Ok(query)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sea_query::{Alias, Expr, ExprTrait, PostgresQueryBuilder, Query};

    #[test]
    fn bind_values_accepts_common_variants() {
        let (sql, values) = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("properties"))
            .and_where(Expr::col(Alias::new("title")).eq("villa"))
            .and_where(Expr::col(Alias::new("bedrooms")).gte(3))
            .and_where(Expr::col(Alias::new("featured")).eq(true))
            .build(PostgresQueryBuilder);

        assert!(sql.contains("$1"));
        assert!(sql.contains("$3"));

        let query = sqlx::query_as::<_, (i64,)>(&sql);
        assert!(bind_values(query, values).is_ok());
    }
}

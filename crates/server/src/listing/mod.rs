//! Property listing engine: filtered pages, counts, and statistics.
//!
//! The query builder produces `(sql, values)` pairs; execution goes through
//! [`crate::db::bind_values`] so every filter value is a bind parameter.

mod query_builder;
mod types;

pub use query_builder::ListingQuery;
pub use types::{ListingPage, Pagination, PropertyFilters, SortField, SortOrder, StatusScope};

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::db::bind_values;
use crate::models::{PropertyStatus, PropertySummary};

/// Fetch one page of the filtered listing together with the total count.
pub async fn fetch_page(
    pool: &PgPool,
    query: &ListingQuery,
    pagination: Pagination,
) -> Result<ListingPage<PropertySummary>> {
    let (sql, values) = query.build(pagination);
    let rows = bind_values(sqlx::query_as::<_, PropertySummary>(&sql), values)?
        .fetch_all(pool)
        .await
        .context("failed to fetch property listing")?;

    let total = fetch_count(pool, query).await?;

    Ok(ListingPage::new(rows, total, pagination.page, pagination.per_page))
}

/// Count all rows matching the query's filter set.
pub async fn fetch_count(pool: &PgPool, query: &ListingQuery) -> Result<u64> {
    let (sql, values) = query.build_count();
    let (count,): (i64,) = bind_values(sqlx::query_as::<_, (i64,)>(&sql), values)?
        .fetch_one(pool)
        .await
        .context("failed to count property listing")?;

    Ok(count.max(0) as u64)
}

/// Featured, available properties, newest first.
pub async fn featured(pool: &PgPool, limit: u32) -> Result<Vec<PropertySummary>> {
    let filters = PropertyFilters {
        featured: Some(true),
        ..Default::default()
    };
    fetch_plain(pool, ListingQuery::new(filters, StatusScope::AvailableOnly), limit).await
}

/// Latest available properties.
pub async fn latest(pool: &PgPool, limit: u32) -> Result<Vec<PropertySummary>> {
    fetch_plain(
        pool,
        ListingQuery::new(PropertyFilters::default(), StatusScope::AvailableOnly),
        limit,
    )
    .await
}

async fn fetch_plain(
    pool: &PgPool,
    query: ListingQuery,
    limit: u32,
) -> Result<Vec<PropertySummary>> {
    let (sql, values) = query.build(Pagination::new(1, limit));
    let rows = bind_values(sqlx::query_as::<_, PropertySummary>(&sql), values)?
        .fetch_all(pool)
        .await
        .context("failed to fetch property listing")?;

    Ok(rows)
}

/// Property count per type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TypeCount {
    pub property_type: String,
    pub count: i64,
}

/// Property count per category. The name is NULL for orphaned rows.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub name: Option<String>,
    pub count: i64,
}

/// Aggregate statistics over the whole properties relation.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyStatistics {
    pub total: u64,
    pub available: u64,
    pub sold: u64,
    pub rented: u64,
    pub featured: u64,
    pub average_price: Option<BigDecimal>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub by_type: Vec<TypeCount>,
    pub by_category: Vec<CategoryCount>,
}

/// Collect listing statistics as a series of independent aggregate queries.
pub async fn statistics(pool: &PgPool) -> Result<PropertyStatistics> {
    let total = count_with(pool, PropertyFilters::default()).await?;
    let available = count_status(pool, PropertyStatus::Available).await?;
    let sold = count_status(pool, PropertyStatus::Sold).await?;
    let rented = count_status(pool, PropertyStatus::Rented).await?;
    let featured = count_with(
        pool,
        PropertyFilters {
            featured: Some(true),
            ..Default::default()
        },
    )
    .await?;

    let (average_price, min_price, max_price): (
        Option<BigDecimal>,
        Option<BigDecimal>,
        Option<BigDecimal>,
    ) = sqlx::query_as("SELECT ROUND(AVG(price), 2), MIN(price), MAX(price) FROM properties")
        .fetch_one(pool)
        .await
        .context("failed to aggregate property prices")?;

    let by_type = sqlx::query_as::<_, TypeCount>(
        r#"
        SELECT property_type, COUNT(*) AS count
        FROM properties
        GROUP BY property_type
        ORDER BY property_type
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to count properties by type")?;

    let by_category = sqlx::query_as::<_, CategoryCount>(
        r#"
        SELECT c.name, COUNT(p.id) AS count
        FROM properties p
        LEFT JOIN categories c ON p.category_id = c.id
        GROUP BY p.category_id, c.name
        ORDER BY count DESC, c.name
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to count properties by category")?;

    Ok(PropertyStatistics {
        total,
        available,
        sold,
        rented,
        featured,
        average_price,
        min_price,
        max_price,
        by_type,
        by_category,
    })
}

async fn count_status(pool: &PgPool, status: PropertyStatus) -> Result<u64> {
    count_with(
        pool,
        PropertyFilters {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

async fn count_with(pool: &PgPool, filters: PropertyFilters) -> Result<u64> {
    fetch_count(pool, &ListingQuery::new(filters, StatusScope::ShowAll)).await
}

//! Property model and CRUD operations.
//!
//! Filtered listing queries live in [`crate::listing`]; this module owns the
//! record types, validated writes, and the single-row status/featured
//! mutations.

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::file::ImageService;

/// Property sale status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 3] = [
        PropertyStatus::Available,
        PropertyStatus::Sold,
        PropertyStatus::Rented,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
        }
    }

    /// Parse a status string; anything outside the allow-list is rejected.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "available" => Some(PropertyStatus::Available),
            "sold" => Some(PropertyStatus::Sold),
            "rented" => Some(PropertyStatus::Rented),
            _ => None,
        }
    }
}

/// Whether a property is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Sale,
    Rent,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Sale => "sale",
            PropertyType::Rent => "rent",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "sale" => Some(PropertyType::Sale),
            "rent" => Some(PropertyType::Rent),
            _ => None,
        }
    }
}

/// Property record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: BigDecimal,
    pub category_id: i64,
    pub property_type: PropertyType,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: BigDecimal,
    pub location: String,
    pub address: Option<String>,
    /// Stored image URI, when one has been uploaded.
    pub image: Option<String>,
    pub featured: bool,
    pub status: PropertyStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Listing row: a property joined with category and agent display fields.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PropertySummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_email: Option<String>,
}

/// Full detail view of a single property.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub summary: PropertySummary,
    pub category_description: Option<String>,
    /// Price divided by area, rounded to cents; zero when area is zero.
    pub price_per_sqm: BigDecimal,
}

/// Input for creating a property.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProperty {
    pub title: String,
    pub description: String,
    pub price: BigDecimal,
    pub category_id: i64,
    pub property_type: PropertyType,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: BigDecimal,
    pub location: String,
    pub address: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub status: PropertyStatus,
    pub created_by: Option<i64>,
}

impl CreateProperty {
    /// Validate required fields, returning every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Property title is required".to_string());
        }
        if self.price < BigDecimal::from(0) {
            errors.push("Please enter a valid price".to_string());
        }
        if self.category_id <= 0 {
            errors.push("Please select a category".to_string());
        }
        if self.location.trim().is_empty() {
            errors.push("Location is required".to_string());
        }
        if self.bedrooms < 0 {
            errors.push("Bedrooms cannot be negative".to_string());
        }
        if self.bathrooms < 0 {
            errors.push("Bathrooms cannot be negative".to_string());
        }
        if self.area < BigDecimal::from(0) {
            errors.push("Area cannot be negative".to_string());
        }

        errors
    }
}

/// Input for updating a property.
///
/// `image` is only written when a replacement was uploaded.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProperty {
    pub title: String,
    pub description: String,
    pub price: BigDecimal,
    pub category_id: i64,
    pub property_type: PropertyType,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: BigDecimal,
    pub location: String,
    pub address: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub status: PropertyStatus,
}

impl UpdateProperty {
    pub fn validate(&self) -> Vec<String> {
        let probe = CreateProperty {
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            category_id: self.category_id,
            property_type: self.property_type,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area.clone(),
            location: self.location.clone(),
            address: self.address.clone(),
            image: self.image.clone(),
            featured: self.featured,
            status: self.status,
            created_by: None,
        };
        probe.validate()
    }
}

/// Outcome of a bulk operation: which ids were touched, which were skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<i64>,
    pub skipped: Vec<i64>,
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    #[sqlx(flatten)]
    summary: PropertySummary,
    category_description: Option<String>,
}

impl Property {
    /// Create a new property and return its id.
    ///
    /// Inputs must already have passed [`CreateProperty::validate`].
    pub async fn create(pool: &PgPool, input: &CreateProperty) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO properties
                (title, description, price, category_id, property_type,
                 bedrooms, bathrooms, area, location, address, image,
                 featured, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.price)
        .bind(input.category_id)
        .bind(input.property_type)
        .bind(input.bedrooms)
        .bind(input.bathrooms)
        .bind(&input.area)
        .bind(&input.location)
        .bind(&input.address)
        .bind(&input.image)
        .bind(input.featured)
        .bind(input.status)
        .bind(input.created_by)
        .fetch_one(pool)
        .await
        .context("failed to create property")?;

        Ok(id)
    }

    /// Fetch a single property with category and agent details.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<PropertyDetail>> {
        let row = sqlx::query_as::<_, DetailRow>(
            r#"
            SELECT p.*,
                   c.name AS category_name,
                   c.icon AS category_icon,
                   c.description AS category_description,
                   u.full_name AS agent_name,
                   u.phone AS agent_phone,
                   u.email AS agent_email
            FROM properties p
            LEFT JOIN categories c ON p.category_id = c.id
            LEFT JOIN users u ON p.created_by = u.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch property")?;

        Ok(row.map(|row| {
            let area = &row.summary.property.area;
            let price_per_sqm = if *area > BigDecimal::from(0) {
                (&row.summary.property.price / area).round(2)
            } else {
                BigDecimal::from(0)
            };
            PropertyDetail {
                summary: row.summary,
                category_description: row.category_description,
                price_per_sqm,
            }
        }))
    }

    /// Update a property. The stored image is only replaced when the input
    /// carries a new one.
    pub async fn update(pool: &PgPool, id: i64, input: &UpdateProperty) -> Result<bool> {
        let result = if let Some(ref image) = input.image {
            sqlx::query(
                r#"
                UPDATE properties SET
                    title = $1, description = $2, price = $3, category_id = $4,
                    property_type = $5, bedrooms = $6, bathrooms = $7, area = $8,
                    location = $9, address = $10, featured = $11, status = $12,
                    image = $13
                WHERE id = $14
                "#,
            )
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.price)
            .bind(input.category_id)
            .bind(input.property_type)
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(&input.area)
            .bind(&input.location)
            .bind(&input.address)
            .bind(input.featured)
            .bind(input.status)
            .bind(image)
            .bind(id)
            .execute(pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE properties SET
                    title = $1, description = $2, price = $3, category_id = $4,
                    property_type = $5, bedrooms = $6, bathrooms = $7, area = $8,
                    location = $9, address = $10, featured = $11, status = $12
                WHERE id = $13
                "#,
            )
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.price)
            .bind(input.category_id)
            .bind(input.property_type)
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(&input.area)
            .bind(&input.location)
            .bind(&input.address)
            .bind(input.featured)
            .bind(input.status)
            .bind(id)
            .execute(pool)
            .await
        }
        .context("failed to update property")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a property, removing its stored image afterwards.
    pub async fn delete(pool: &PgPool, images: &ImageService, id: i64) -> Result<bool> {
        let stored: Option<Option<String>> =
            sqlx::query_scalar("SELECT image FROM properties WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("failed to fetch property image")?;

        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete property")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(Some(uri)) = stored {
            images.remove(&uri).await;
        }

        Ok(true)
    }

    /// Flip the featured flag in place. Two calls restore the original value.
    pub async fn toggle_featured(pool: &PgPool, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE properties SET featured = NOT featured WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to toggle featured")?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the status of a property. The status is validated by construction:
    /// only values of [`PropertyStatus`] reach the statement.
    pub async fn update_status(pool: &PgPool, id: i64, status: PropertyStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE properties SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await
            .context("failed to update property status")?;

        Ok(result.rows_affected() > 0)
    }

    /// Update the status of many properties inside a single transaction.
    ///
    /// Ids that match no row are reported as skipped; they never abort the
    /// batch. A statement failure rolls back everything.
    pub async fn bulk_update_status(
        pool: &PgPool,
        ids: &[i64],
        status: PropertyStatus,
    ) -> Result<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        if ids.is_empty() {
            return Ok(outcome);
        }

        let mut tx = pool.begin().await.context("failed to start transaction")?;

        for &id in ids {
            let result = sqlx::query("UPDATE properties SET status = $1 WHERE id = $2")
                .bind(status)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("failed to update property status in bulk")?;

            if result.rows_affected() > 0 {
                outcome.succeeded.push(id);
            } else {
                outcome.skipped.push(id);
            }
        }

        tx.commit().await.context("failed to commit transaction")?;

        Ok(outcome)
    }

    /// Delete many properties inside a single transaction, then remove their
    /// stored images. Image removal happens after commit so a storage failure
    /// cannot abort the batch.
    pub async fn bulk_delete(
        pool: &PgPool,
        images: &ImageService,
        ids: &[i64],
    ) -> Result<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        if ids.is_empty() {
            return Ok(outcome);
        }

        let mut tx = pool.begin().await.context("failed to start transaction")?;
        let mut stored_images = Vec::new();

        for &id in ids {
            let stored: Option<Option<String>> =
                sqlx::query_scalar("SELECT image FROM properties WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("failed to fetch property image in bulk")?;

            let result = sqlx::query("DELETE FROM properties WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("failed to delete property in bulk")?;

            if result.rows_affected() > 0 {
                outcome.succeeded.push(id);
                if let Some(Some(uri)) = stored {
                    stored_images.push(uri);
                }
            } else {
                outcome.skipped.push(id);
            }
        }

        tx.commit().await.context("failed to commit transaction")?;

        for uri in stored_images {
            images.remove(&uri).await;
        }

        Ok(outcome)
    }

    /// Find properties similar to the given one: same category, available,
    /// price within ±30%, closest price first.
    pub async fn similar(pool: &PgPool, id: i64, limit: i64) -> Result<Vec<PropertySummary>> {
        let Some(detail) = Self::find_by_id(pool, id).await? else {
            return Ok(Vec::new());
        };

        let price = detail.summary.property.price.clone();
        let low = (&price * BigDecimal::from(7) / BigDecimal::from(10)).round(2);
        let high = (&price * BigDecimal::from(13) / BigDecimal::from(10)).round(2);

        let rows = sqlx::query_as::<_, PropertySummary>(
            r#"
            SELECT p.*,
                   c.name AS category_name,
                   c.icon AS category_icon,
                   u.full_name AS agent_name,
                   u.phone AS agent_phone,
                   u.email AS agent_email
            FROM properties p
            LEFT JOIN categories c ON p.category_id = c.id
            LEFT JOIN users u ON p.created_by = u.id
            WHERE p.id <> $1
              AND p.category_id = $2
              AND p.price BETWEEN $3 AND $4
              AND p.status = 'available'
            ORDER BY ABS(p.price - $5)
            LIMIT $6
            "#,
        )
        .bind(id)
        .bind(detail.summary.property.category_id)
        .bind(low)
        .bind(high)
        .bind(price)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("failed to fetch similar properties")?;

        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn valid_input() -> CreateProperty {
        CreateProperty {
            title: "Seaside villa".to_string(),
            description: "Four bedrooms near the beach".to_string(),
            price: BigDecimal::from_str("450000").unwrap(),
            category_id: 1,
            property_type: PropertyType::Sale,
            bedrooms: 4,
            bathrooms: 2,
            area: BigDecimal::from_str("210.5").unwrap(),
            location: "Brighton".to_string(),
            address: Some("12 Marine Parade".to_string()),
            image: None,
            featured: false,
            status: PropertyStatus::Available,
            created_by: Some(1),
        }
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(
            PropertyStatus::parse("available"),
            Some(PropertyStatus::Available)
        );
        assert_eq!(PropertyStatus::parse("sold"), Some(PropertyStatus::Sold));
        assert_eq!(PropertyStatus::parse("rented"), Some(PropertyStatus::Rented));
        assert_eq!(PropertyStatus::parse("archived"), None);
        assert_eq!(PropertyStatus::parse("AVAILABLE"), None);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in PropertyStatus::ALL {
            assert_eq!(PropertyStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn property_type_parse() {
        assert_eq!(PropertyType::parse("sale"), Some(PropertyType::Sale));
        assert_eq!(PropertyType::parse("rent"), Some(PropertyType::Rent));
        assert_eq!(PropertyType::parse("lease"), None);
    }

    #[test]
    fn valid_input_passes_validation() {
        assert!(valid_input().validate().is_empty());
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut input = valid_input();
        input.title = "   ".to_string();
        input.price = BigDecimal::from(-1);
        input.location = String::new();

        let errors = input.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("title")));
        assert!(errors.iter().any(|e| e.contains("price")));
        assert!(errors.iter().any(|e| e.contains("Location")));
    }

    #[test]
    fn zero_price_is_valid() {
        let mut input = valid_input();
        input.price = BigDecimal::from(0);
        assert!(input.validate().is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PropertyStatus::Available).unwrap();
        assert_eq!(json, "\"available\"");
        let json = serde_json::to_string(&PropertyType::Rent).unwrap();
        assert_eq!(json, "\"rent\"");
    }

    #[test]
    fn bulk_outcome_starts_empty() {
        let outcome = BulkOutcome::default();
        assert!(outcome.succeeded.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}

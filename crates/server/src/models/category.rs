//! Category model and CRUD operations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A property category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub description: String,
}

/// Category with the number of properties referencing it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub property_count: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
}

impl CreateCategory {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Category name is required".to_string());
        }
        errors
    }
}

/// Input for updating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

impl Category {
    /// Find a category by id.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>(
            "SELECT id, name, icon, description FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch category")?;

        Ok(category)
    }

    /// List all categories ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Self>(
            "SELECT id, name, icon, description FROM categories ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .context("failed to list categories")?;

        Ok(categories)
    }

    /// List categories with their property counts, for administration.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.icon, c.description, COUNT(p.id) AS property_count
            FROM categories c
            LEFT JOIN properties p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to list categories with counts")?;

        Ok(categories)
    }

    /// Count all categories.
    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(pool)
            .await
            .context("failed to count categories")?;

        Ok(count)
    }

    /// Number of properties referencing this category.
    pub async fn property_count(pool: &PgPool, id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE category_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await
                .context("failed to count properties in category")?;

        Ok(count)
    }

    /// Create a new category.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Self> {
        let category = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO categories (name, icon, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, icon, description
            "#,
        )
        .bind(input.name.trim())
        .bind(input.icon.as_deref().unwrap_or_default())
        .bind(input.description.as_deref().unwrap_or_default())
        .fetch_one(pool)
        .await
        .context("failed to create category")?;

        Ok(category)
    }

    /// Update a category. Absent fields keep their current values.
    pub async fn update(pool: &PgPool, id: i64, input: &UpdateCategory) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let name = input.name.clone().unwrap_or(current.name);
        let icon = input.icon.clone().unwrap_or(current.icon);
        let description = input.description.clone().unwrap_or(current.description);

        sqlx::query("UPDATE categories SET name = $1, icon = $2, description = $3 WHERE id = $4")
            .bind(&name)
            .bind(&icon)
            .bind(&description)
            .bind(id)
            .execute(pool)
            .await
            .context("failed to update category")?;

        Self::find_by_id(pool, id).await
    }

    /// Delete a category. Callers must check [`Self::property_count`] first;
    /// the foreign key rejects deletion while properties still reference it.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete category")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn create_input_requires_name() {
        let input = CreateCategory {
            name: "  ".to_string(),
            icon: None,
            description: None,
        };
        assert_eq!(input.validate().len(), 1);

        let input = CreateCategory {
            name: "Apartments".to_string(),
            icon: Some("building".to_string()),
            description: None,
        };
        assert!(input.validate().is_empty());
    }

    #[test]
    fn category_serialization() {
        let category = Category {
            id: 3,
            name: "Villas".to_string(),
            icon: "castle".to_string(),
            description: "Luxury villas".to_string(),
        };

        let json = serde_json::to_string(&category).unwrap();
        assert!(json.contains("Villas"));

        let parsed: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "Villas");
    }
}

//! Listing query builder using SeaQuery.
//!
//! Generates the filtered/sorted/paginated listing query, the matching
//! count query, and nothing else. Every filter value becomes a bind
//! parameter; the sort column and direction enter the SQL only through the
//! [`SortField`]/[`SortOrder`] enums.

use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, Func, Iden, Order, PostgresQueryBuilder, Query,
    SelectStatement, Values,
};

use super::types::{Pagination, PropertyFilters, SortField, SortOrder, StatusScope};
use crate::models::PropertyStatus;

#[derive(Iden)]
enum Properties {
    Table,
    Title,
    Description,
    Price,
    CategoryId,
    PropertyType,
    Bedrooms,
    Bathrooms,
    Area,
    Location,
    Address,
    Featured,
    Status,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    Icon,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    FullName,
    Phone,
    Email,
}

/// A fully specified listing query: filters, status scope, and sort.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    filters: PropertyFilters,
    scope: StatusScope,
    sort: SortField,
    order: SortOrder,
}

impl ListingQuery {
    /// Create a query with the default sort (newest first).
    pub fn new(filters: PropertyFilters, scope: StatusScope) -> Self {
        Self {
            filters,
            scope,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }

    /// Override the sort field and direction.
    pub fn with_sort(mut self, sort: SortField, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    /// Build the listing SELECT: properties joined with category and agent
    /// display fields, filtered, sorted, and windowed.
    pub fn build(&self, pagination: Pagination) -> (String, Values) {
        let mut query = Query::select();

        query
            .column((Properties::Table, Asterisk))
            .expr_as(
                Expr::col((Categories::Table, Categories::Name)),
                Alias::new("category_name"),
            )
            .expr_as(
                Expr::col((Categories::Table, Categories::Icon)),
                Alias::new("category_icon"),
            )
            .expr_as(
                Expr::col((Users::Table, Users::FullName)),
                Alias::new("agent_name"),
            )
            .expr_as(
                Expr::col((Users::Table, Users::Phone)),
                Alias::new("agent_phone"),
            )
            .expr_as(
                Expr::col((Users::Table, Users::Email)),
                Alias::new("agent_email"),
            )
            .from(Properties::Table)
            .left_join(
                Categories::Table,
                Expr::col((Properties::Table, Properties::CategoryId))
                    .equals((Categories::Table, Categories::Id)),
            )
            .left_join(
                Users::Table,
                Expr::col((Properties::Table, Properties::CreatedBy))
                    .equals((Users::Table, Users::Id)),
            );

        self.apply_filters(&mut query);

        let sort_col = match self.sort {
            SortField::CreatedAt => Properties::CreatedAt,
            SortField::Price => Properties::Price,
            SortField::Title => Properties::Title,
            SortField::Bedrooms => Properties::Bedrooms,
            SortField::Bathrooms => Properties::Bathrooms,
            SortField::Area => Properties::Area,
        };
        let order = match self.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        query.order_by((Properties::Table, sort_col), order);

        query.limit(pagination.limit());
        query.offset(pagination.offset());

        query.build(PostgresQueryBuilder)
    }

    /// Build the COUNT query. Applies exactly the same predicates as
    /// [`Self::build`] so pagination totals agree with the listed rows.
    pub fn build_count(&self) -> (String, Values) {
        let mut query = Query::select();

        query.expr(Expr::col(Asterisk).count());
        query.from(Properties::Table);

        self.apply_filters(&mut query);

        query.build(PostgresQueryBuilder)
    }

    /// Append WHERE predicates in a fixed order. One predicate per present
    /// filter; absent filters contribute nothing.
    fn apply_filters(&self, query: &mut SelectStatement) {
        let filters = &self.filters;

        if let Some(term) = filters.search.as_deref() {
            let term = term.trim();
            if !term.is_empty() {
                let pattern = format!("%{}%", escape_like_wildcards(&term.to_lowercase()));
                let mut cond = Cond::any();
                for col in [
                    Properties::Title,
                    Properties::Description,
                    Properties::Location,
                    Properties::Address,
                ] {
                    cond = cond.add(
                        Expr::expr(Func::lower(Expr::col((Properties::Table, col))))
                            .like(pattern.clone()),
                    );
                }
                query.and_where(cond.into());
            }
        }

        if let Some(category_id) = filters.category_id {
            query.and_where(
                Expr::col((Properties::Table, Properties::CategoryId)).eq(category_id),
            );
        }

        if let Some(property_type) = filters.property_type {
            query.and_where(
                Expr::col((Properties::Table, Properties::PropertyType))
                    .eq(property_type.as_str()),
            );
        }

        // An explicit status filter wins; otherwise the caller's scope decides.
        match (filters.status, self.scope) {
            (Some(status), _) => {
                query.and_where(
                    Expr::col((Properties::Table, Properties::Status)).eq(status.as_str()),
                );
            }
            (None, StatusScope::AvailableOnly) => {
                query.and_where(
                    Expr::col((Properties::Table, Properties::Status))
                        .eq(PropertyStatus::Available.as_str()),
                );
            }
            (None, StatusScope::ShowAll) => {}
        }

        if let Some(featured) = filters.featured {
            query.and_where(Expr::col((Properties::Table, Properties::Featured)).eq(featured));
        }

        if let Some(ref price_min) = filters.price_min {
            query.and_where(
                Expr::col((Properties::Table, Properties::Price)).gte(price_min.clone()),
            );
        }

        if let Some(ref price_max) = filters.price_max {
            query.and_where(
                Expr::col((Properties::Table, Properties::Price)).lte(price_max.clone()),
            );
        }

        if let Some(bedrooms_min) = filters.bedrooms_min {
            query.and_where(
                Expr::col((Properties::Table, Properties::Bedrooms)).gte(bedrooms_min),
            );
        }

        if let Some(bathrooms_min) = filters.bathrooms_min {
            query.and_where(
                Expr::col((Properties::Table, Properties::Bathrooms)).gte(bathrooms_min),
            );
        }

        if let Some(ref area_min) = filters.area_min {
            query.and_where(Expr::col((Properties::Table, Properties::Area)).gte(area_min.clone()));
        }

        if let Some(ref area_max) = filters.area_max {
            query.and_where(Expr::col((Properties::Table, Properties::Area)).lte(area_max.clone()));
        }
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn page() -> Pagination {
        Pagination::new(1, 10)
    }

    /// The WHERE clause of a built query, stripped of trailing ORDER/LIMIT.
    fn where_clause(sql: &str) -> &str {
        let start = sql.find("WHERE").unwrap_or(sql.len());
        let end = sql.find(" ORDER BY").unwrap_or(sql.len());
        &sql[start..end]
    }

    #[test]
    fn no_filters_show_all_has_no_where() {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll);
        let (sql, values) = query.build(page());

        assert!(!sql.contains("WHERE"), "unexpected WHERE: {sql}");
        assert!(sql.contains("LEFT JOIN"));
        assert!(sql.contains("ORDER BY"));
        // Only limit and offset are bound.
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn available_only_scope_adds_status_predicate() {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::AvailableOnly);
        let (sql, _) = query.build(page());

        assert!(sql.contains("\"status\""), "missing status predicate: {sql}");
        assert!(!sql.contains("'available'"), "status must be bound: {sql}");
    }

    #[test]
    fn explicit_status_overrides_scope() {
        let filters = PropertyFilters {
            status: Some(PropertyStatus::Sold),
            ..Default::default()
        };
        let query = ListingQuery::new(filters, StatusScope::AvailableOnly);
        let (sql, _) = query.build(page());

        // Exactly one status predicate.
        assert_eq!(sql.matches("\"status\"").count(), 1, "{sql}");
    }

    #[test]
    fn each_filter_appends_one_predicate() {
        let filters = PropertyFilters {
            category_id: Some(4),
            property_type: Some(PropertyType::Rent),
            featured: Some(true),
            bedrooms_min: Some(3),
            bathrooms_min: Some(2),
            ..Default::default()
        };
        let query = ListingQuery::new(filters, StatusScope::ShowAll);
        let (sql, values) = query.build(page());

        assert!(sql.contains("\"category_id\" = $"));
        assert!(sql.contains("\"property_type\" = $"));
        assert!(sql.contains("\"featured\" = $"));
        assert!(sql.contains("\"bedrooms\" >= $"));
        assert!(sql.contains("\"bathrooms\" >= $"));
        // Five filters plus limit and offset.
        assert_eq!(values.0.len(), 7);
    }

    #[test]
    fn price_range_binds_both_bounds() {
        let filters = PropertyFilters {
            price_min: Some(BigDecimal::from_str("100000").unwrap()),
            price_max: Some(BigDecimal::from_str("200000").unwrap()),
            ..Default::default()
        };
        let query = ListingQuery::new(filters, StatusScope::ShowAll);
        let (sql, values) = query.build(page());

        assert!(sql.contains("\"price\" >= $"));
        assert!(sql.contains("\"price\" <= $"));
        assert!(!sql.contains("100000"), "bounds must be bound, not inlined: {sql}");
        assert_eq!(values.0.len(), 4);
    }

    #[test]
    fn search_matches_four_columns_case_insensitively() {
        let filters = PropertyFilters {
            search: Some("Villa".to_string()),
            ..Default::default()
        };
        let query = ListingQuery::new(filters, StatusScope::ShowAll);
        let (sql, values) = query.build(page());

        assert_eq!(sql.matches("LIKE").count(), 4, "{sql}");
        assert_eq!(sql.matches("LOWER").count(), 4, "{sql}");
        assert!(sql.contains("\"title\""));
        assert!(sql.contains("\"description\""));
        assert!(sql.contains("\"location\""));
        assert!(sql.contains("\"address\""));
        // The same lowered, wildcard-wrapped term is bound for each clause.
        let bound: Vec<String> = values
            .0
            .iter()
            .take(4)
            .map(|v| format!("{v:?}"))
            .collect();
        assert!(bound.iter().all(|v| v.contains("%villa%")), "{bound:?}");
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let filters = PropertyFilters {
            search: Some("100%_done".to_string()),
            ..Default::default()
        };
        let query = ListingQuery::new(filters, StatusScope::ShowAll);
        let (_, values) = query.build(page());

        let first = format!("{:?}", values.0[0]);
        assert!(first.contains("\\\\%"), "{first}");
        assert!(first.contains("\\\\_"), "{first}");
    }

    #[test]
    fn blank_search_is_skipped() {
        let filters = PropertyFilters {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        let query = ListingQuery::new(filters, StatusScope::ShowAll);
        let (sql, _) = query.build(page());

        assert!(!sql.contains("LIKE"), "{sql}");
    }

    #[test]
    fn sort_uses_allow_listed_column() {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll)
            .with_sort(SortField::Price, SortOrder::Asc);
        let (sql, _) = query.build(page());

        assert!(sql.contains("ORDER BY \"properties\".\"price\" ASC"), "{sql}");
    }

    #[test]
    fn sort_injection_falls_back_to_created_at() {
        let field = SortField::parse("price; DROP TABLE properties --");
        let order = SortOrder::parse("DESC; --");
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll)
            .with_sort(field, order);
        let (sql, _) = query.build(page());

        assert!(
            sql.contains("ORDER BY \"properties\".\"created_at\" DESC"),
            "{sql}"
        );
        assert!(!sql.contains("DROP TABLE"), "{sql}");
    }

    #[test]
    fn pagination_is_bound_not_inlined() {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll);
        let (sql, values) = query.build(Pagination::new(3, 10));

        assert!(sql.contains("LIMIT $"), "{sql}");
        assert!(sql.contains("OFFSET $"), "{sql}");
        let rendered = format!("{:?}", values.0);
        assert!(rendered.contains("20"), "offset 20 expected: {rendered}");
    }

    #[test]
    fn count_mirrors_listing_predicates() {
        let filters = PropertyFilters {
            search: Some("garden".to_string()),
            category_id: Some(2),
            property_type: Some(PropertyType::Sale),
            featured: Some(false),
            price_min: Some(BigDecimal::from_str("50000").unwrap()),
            price_max: Some(BigDecimal::from_str("250000").unwrap()),
            bedrooms_min: Some(2),
            bathrooms_min: Some(1),
            area_min: Some(BigDecimal::from_str("40").unwrap()),
            area_max: Some(BigDecimal::from_str("160").unwrap()),
            status: None,
        };
        let query = ListingQuery::new(filters, StatusScope::AvailableOnly);

        let (listing_sql, listing_values) = query.build(page());
        let (count_sql, count_values) = query.build_count();

        assert_eq!(
            where_clause(&listing_sql),
            where_clause(&count_sql),
            "count must apply the same predicates"
        );
        assert!(count_sql.contains("COUNT(*)"));
        assert!(!count_sql.contains("LIMIT"));
        assert!(!count_sql.contains("ORDER BY"));
        // Listing binds the same values plus limit and offset.
        assert_eq!(listing_values.0.len(), count_values.0.len() + 2);
    }

    #[test]
    fn count_show_all_without_filters_is_bare() {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll);
        let (sql, values) = query.build_count();

        assert!(sql.contains("COUNT(*)"));
        assert!(!sql.contains("WHERE"));
        assert!(values.0.is_empty());
    }

    #[test]
    fn listing_selects_joined_display_fields() {
        let query = ListingQuery::new(PropertyFilters::default(), StatusScope::ShowAll);
        let (sql, _) = query.build(page());

        for alias in [
            "category_name",
            "category_icon",
            "agent_name",
            "agent_phone",
            "agent_email",
        ] {
            assert!(sql.contains(alias), "missing {alias}: {sql}");
        }
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
    }
}

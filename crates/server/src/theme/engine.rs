//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use anyhow::{Context, Result};
use tera::Tera;
use tracing::debug;

/// Built-in page layout used when no template directory provides one.
const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }} — {{ site_name }}</title>
</head>
<body class="{% if is_admin %}admin{% else %}public{% endif %}">
<header>
<nav>
<a href="/">{{ site_name }}</a>
<a href="/properties">Properties</a>
{% if user_authenticated %}<a href="/admin">Admin</a>
<form method="post" action="/user/logout" class="inline"><button type="submit">Log out</button></form>
{% else %}<a href="/user/login">Log in</a>{% endif %}
</nav>
</header>
<main>
<h1>{{ title }}</h1>
{{ content | safe }}
</main>
</body>
</html>
"#;

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: RwLock<HashMap<String, String>>,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    ///
    /// The directory is optional; without one, only the built-in page layout
    /// is available.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let mut tera = if template_dir.is_dir() {
            let pattern = template_dir.join("**/*.html");
            let pattern_str = pattern
                .to_str()
                .context("invalid template directory path")?;
            Tera::new(pattern_str).context("failed to initialize Tera templates")?
        } else {
            Tera::default()
        };

        Self::register_filters(&mut tera);

        if tera.get_template("page.html").is_err() {
            tera.add_raw_template("page.html", FALLBACK_PAGE)
                .context("failed to register built-in page template")?;
        }

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self {
            tera,
            suggestion_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Create a theme engine with only the built-in layout (for testing).
    pub fn empty() -> Result<Self> {
        let mut tera = Tera::default();
        Self::register_filters(&mut tera);
        tera.add_raw_template("page.html", FALLBACK_PAGE)
            .context("failed to register built-in page template")?;

        Ok(Self {
            tera,
            suggestion_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // Format an RFC 3339 timestamp as a human-readable date.
        tera.register_filter(
            "format_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let formatted = match value {
                    tera::Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                        .map(|dt| dt.format("%B %-d, %Y").to_string())
                        .unwrap_or_default(),
                    tera::Value::Number(n) => n
                        .as_i64()
                        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                        .map(|dt| dt.format("%B %-d, %Y").to_string())
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                Ok(tera::Value::String(formatted))
            },
        );

        // Format a decimal amount as dollars with thousands separators.
        tera.register_filter(
            "money",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let raw = match value {
                    tera::Value::String(s) => s.clone(),
                    tera::Value::Number(n) => n.to_string(),
                    _ => return Ok(tera::Value::String(String::new())),
                };
                Ok(tera::Value::String(format_money(&raw)))
            },
        );
    }

    /// Get the underlying Tera instance for custom operations.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached.
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");

        if let Ok(cache) = self.suggestion_cache.read() {
            if let Some(cached) = cache.get(&cache_key) {
                return Some(cached.clone());
            }
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                if let Ok(mut cache) = self.suggestion_cache.write() {
                    cache.insert(cache_key, template_name.clone());
                }
                return Some(template_name);
            }
        }

        // No match; don't cache negative results so new templates are found
        // after a restart-free template drop-in.
        None
    }

    /// Check if a path is an admin path.
    pub fn is_admin_path(path: &str) -> bool {
        path.starts_with("/admin")
    }

    /// Get page template suggestions based on path.
    ///
    /// `/admin/properties` -> `["page--admin--properties", "page--admin", "page"]`
    pub fn page_suggestions(path: &str) -> Vec<String> {
        let mut suggestions = Vec::new();

        let normalized = path.trim_start_matches('/').replace('/', "--");
        if !normalized.is_empty() {
            suggestions.push(format!("page--{normalized}"));
        }

        if Self::is_admin_path(path) {
            suggestions.push("page--admin".to_string());
        }

        suggestions.push("page".to_string());

        suggestions
    }

    /// Render a full page with content.
    pub fn render_page(
        &self,
        path: &str,
        title: &str,
        content: &str,
        context: &mut tera::Context,
    ) -> Result<String> {
        let suggestions = Self::page_suggestions(path);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let template = self
            .resolve_template(&suggestion_refs)
            .unwrap_or_else(|| "page.html".to_string());

        context.insert("title", title);
        context.insert("content", content);
        context.insert("path", path);
        context.insert("is_admin", &Self::is_admin_path(path));
        if context.get("site_name").is_none() {
            context.insert("site_name", "Dimora");
        }
        if context.get("user_authenticated").is_none() {
            context.insert("user_authenticated", &false);
        }

        self.tera
            .render(&template, context)
            .context("failed to render page template")
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .finish()
    }
}

/// Format a decimal string as a dollar amount with thousands separators.
///
/// `"450000.5"` becomes `"$450,000.50"`. Unparseable input is returned
/// prefixed as-is rather than dropped.
pub fn format_money(raw: &str) -> String {
    let trimmed = raw.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return format!("${trimmed}");
    }

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut cents: String = frac_part.chars().filter(|c| c.is_ascii_digit()).collect();
    cents.truncate(2);
    while cents.len() < 2 {
        cents.push('0');
    }

    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin_path() {
        assert!(ThemeEngine::is_admin_path("/admin"));
        assert!(ThemeEngine::is_admin_path("/admin/properties"));
        assert!(!ThemeEngine::is_admin_path("/properties"));
        assert!(!ThemeEngine::is_admin_path("/"));
    }

    #[test]
    fn test_page_suggestions() {
        let suggestions = ThemeEngine::page_suggestions("/admin/properties");
        assert_eq!(
            suggestions,
            vec!["page--admin--properties", "page--admin", "page"]
        );

        let suggestions = ThemeEngine::page_suggestions("/properties");
        assert_eq!(suggestions, vec!["page--properties", "page"]);
    }

    #[test]
    fn render_page_falls_back_to_builtin_layout() {
        let engine = ThemeEngine::empty().unwrap();
        let mut context = tera::Context::new();
        let html = engine
            .render_page("/properties", "Properties", "<p>listing</p>", &mut context)
            .unwrap();

        assert!(html.contains("<p>listing</p>"));
        assert!(html.contains("Properties — Dimora"));
        assert!(html.contains("public"));
    }

    #[test]
    fn render_admin_page_gets_admin_class() {
        let engine = ThemeEngine::empty().unwrap();
        let mut context = tera::Context::new();
        let html = engine
            .render_page("/admin", "Dashboard", "", &mut context)
            .unwrap();

        assert!(html.contains("class=\"admin\""));
    }

    #[test]
    fn money_filter_groups_thousands() {
        assert_eq!(format_money("450000"), "$450,000.00");
        assert_eq!(format_money("450000.5"), "$450,000.50");
        assert_eq!(format_money("999.99"), "$999.99");
        assert_eq!(format_money("1234567.891"), "$1,234,567.89");
        assert_eq!(format_money("-1200"), "-$1,200.00");
        assert_eq!(format_money("0"), "$0.00");
    }

    #[test]
    fn money_filter_passes_through_garbage() {
        assert_eq!(format_money("n/a"), "$n/a");
    }

    #[test]
    fn format_date_filter_renders_rfc3339() {
        let mut tera = Tera::default();
        ThemeEngine::register_filters(&mut tera);
        tera.add_raw_template("t", "{{ ts | format_date }}").unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("ts", "2026-02-15T00:00:00Z");
        assert_eq!(tera.render("t", &ctx).unwrap(), "February 15, 2026");
    }

    #[test]
    fn format_date_filter_with_unparseable_input() {
        let mut tera = Tera::default();
        ThemeEngine::register_filters(&mut tera);
        tera.add_raw_template("t", "{{ ts | format_date }}").unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("ts", "not a date");
        assert_eq!(tera.render("t", &ctx).unwrap(), "");
    }
}

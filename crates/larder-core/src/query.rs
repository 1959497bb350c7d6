//! Search query builder: filter, sort and paginate recipe records.
//!
//! A [`SearchRequest`] is the raw, untrusted input from either search route.
//! [`SearchRequest::into_query`] enforces the input policy and produces a
//! [`SearchQuery`], which can render parameterised PostgreSQL or evaluate
//! itself over an in-memory collection with the same semantics.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::schema::{Recipe, RecipePage};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Table holding recipe records.
pub const RECIPE_TABLE: &str = "recipes";

/// Column list in [`Recipe`] field order.
pub const RECIPE_COLUMNS: &str = "recipe_id, name, ingredients, instructions, prep_time, \
     cook_time, servings, image_url, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid sort field '{0}'. Allowed fields: name, created_at, prep_time")]
    InvalidSortField(String),

    #[error("Invalid sort order '{0}'. Allowed values: asc, desc")]
    InvalidSortOrder(String),

    #[error("page must be a positive integer, got {0}")]
    InvalidPage(i64),

    #[error("page_size must be between 1 and 100, got {0}")]
    InvalidPageSize(i64),
}

/// Fields a search may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    CreatedAt,
    PrepTime,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Name, SortField::CreatedAt, SortField::PrepTime];

    pub fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::PrepTime => "prep_time",
        }
    }

    fn collation(self) -> &'static str {
        match self {
            SortField::Name | SortField::PrepTime => " COLLATE \"C\"",
            SortField::CreatedAt => "",
        }
    }
}

impl FromStr for SortField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.column() == s)
            .ok_or_else(|| QueryError::InvalidSortField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(QueryError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Raw search input, shared by the query-string and JSON-body routes.
///
/// `page` and `page_size` are signed so that every out-of-range number,
/// negative ones included, is rejected by [`SearchRequest::into_query`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl SearchRequest {
    /// Apply defaults and enforce the input policy.
    pub fn into_query(self) -> Result<SearchQuery, QueryError> {
        let page = match self.page {
            None => DEFAULT_PAGE,
            Some(raw) => u32::try_from(raw)
                .ok()
                .filter(|&p| p > 0)
                .ok_or(QueryError::InvalidPage(raw))?,
        };

        let page_size = match self.page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => u32::try_from(raw)
                .ok()
                .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
                .ok_or(QueryError::InvalidPageSize(raw))?,
        };

        let sort_by = self
            .sort_by
            .as_deref()
            .map(str::parse::<SortField>)
            .transpose()?;
        let sort_order = self
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()?
            .unwrap_or_default();

        Ok(SearchQuery {
            search: self.search.filter(|s| !s.is_empty()),
            sort_by,
            sort_order,
            page,
            page_size,
        })
    }
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            sort_order: SortOrder::Asc,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Escape LIKE metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn cmp_nullable(a: Option<&str>, b: Option<&str>) -> Ordering {
    // NULLs sort after every value, as PostgreSQL does for ASC.
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl SearchQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Bind value for the `$1` placeholder of the WHERE clause, if any.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|term| format!("%{}%", escape_like(term)))
    }

    /// WHERE clause (with leading space) or an empty string.
    pub fn where_clause(&self) -> String {
        if self.search.is_none() {
            return String::new();
        }
        let parts: Vec<String> = ["name", "ingredients", "instructions"]
            .iter()
            .map(|col| format!("{} ILIKE $1 ESCAPE '\\'", col))
            .collect();
        format!(" WHERE ({})", parts.join(" OR "))
    }

    /// ORDER BY clause; `recipe_id` always breaks ties so paging is stable.
    ///
    /// Text columns compare with the "C" collation, i.e. by byte value, so
    /// the database agrees with [`Self::compare`] whatever its locale.
    pub fn order_by_clause(&self) -> String {
        match self.sort_by {
            Some(field) => format!(
                " ORDER BY {}{} {}, recipe_id COLLATE \"C\" ASC",
                field.column(),
                field.collation(),
                self.sort_order.sql()
            ),
            None => " ORDER BY recipe_id COLLATE \"C\" ASC".to_string(),
        }
    }

    /// Count of all matching rows, ignoring pagination.
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}{}", RECIPE_TABLE, self.where_clause())
    }

    /// One page of matching rows. Binds: the search pattern (when present),
    /// then LIMIT, then OFFSET.
    pub fn page_sql(&self) -> String {
        let first = if self.search.is_some() { 2 } else { 1 };
        format!(
            "SELECT {} FROM {}{}{} LIMIT ${} OFFSET ${}",
            RECIPE_COLUMNS,
            RECIPE_TABLE,
            self.where_clause(),
            self.order_by_clause(),
            first,
            first + 1
        )
    }

    /// Whether `recipe` passes the search filter.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.to_lowercase();
        [&recipe.name, &recipe.ingredients, &recipe.instructions]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Total order over records, the in-memory twin of [`Self::order_by_clause`].
    /// Strings compare by byte value.
    pub fn compare(&self, a: &Recipe, b: &Recipe) -> Ordering {
        let primary = match self.sort_by {
            Some(SortField::Name) => a.name.cmp(&b.name),
            Some(SortField::CreatedAt) => a.created_at.cmp(&b.created_at),
            Some(SortField::PrepTime) => {
                cmp_nullable(a.prep_time.as_deref(), b.prep_time.as_deref())
            }
            None => Ordering::Equal,
        };
        let primary = match self.sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.recipe_id.cmp(&b.recipe_id))
    }

    /// Filter, count, sort and slice an in-memory collection.
    pub fn evaluate<'a, I>(&self, records: I) -> RecipePage
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let mut matched: Vec<&Recipe> = records.into_iter().filter(|r| self.matches(r)).collect();
        let total = matched.len() as u64;
        matched.sort_by(|a, b| self.compare(a, b));

        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let recipes = matched
            .into_iter()
            .skip(offset)
            .take(self.page_size as usize)
            .cloned()
            .collect();

        RecipePage {
            total,
            page: self.page,
            page_size: self.page_size,
            recipes,
        }
    }
}

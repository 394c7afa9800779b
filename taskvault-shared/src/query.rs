/// Ownership-scoped task query construction
///
/// A [`TaskQuery`] is the only way to list tasks: it cannot be built without
/// an owner, so the scope predicate is structurally mandatory rather than a
/// convention handlers have to remember.
///
/// The raw HTTP query parameters arrive as text and are coerced leniently:
///
/// - `isCompleted` present means "filter"; the value `"true"` selects
///   completed tasks, any other value selects open ones
/// - `sortBy` is `field:direction`; an unrecognized direction falls back to
///   ascending, an unrecognized field to the engine default ordering
/// - `limit`/`skip` that fail to parse (or are negative) degenerate to
///   "no limit"/"no skip" instead of raising an error

use serde::Deserialize;
use uuid::Uuid;

/// Fields tasks can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl SortField {
    /// Parses a wire-format field name
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "description" => Some(SortField::Description),
            "isCompleted" => Some(SortField::Completed),
            _ => None,
        }
    }

    /// Column name for SQL-backed engines
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Description => "description",
            SortField::Completed => "is_completed",
        }
    }
}

/// Sort direction; anything that is not `desc` sorts ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Self {
        if raw == "desc" {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    /// SQL keyword for this direction
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Parsed `field:direction` sort specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parses `"field"` or `"field:direction"`
    ///
    /// Returns `None` for an unrecognized field, which degrades to the
    /// engine default ordering rather than an error.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(2, ':');
        let field = SortField::parse(parts.next().unwrap_or_default())?;
        let direction = SortDirection::parse(parts.next().unwrap_or(""));
        Some(SortSpec { field, direction })
    }
}

/// Raw, untrusted list parameters as they arrive on the query string
///
/// Everything is kept textual so that coercion stays lenient: a limit of
/// `"ten"` must degrade to "no limit", not produce a 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub is_completed: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
}

/// Fully-built task listing query
///
/// The owner predicate is mandatory and implicit in construction; there is
/// no way to express "list everyone's tasks".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Scope: only tasks owned by this user are eligible
    pub owner_id: Uuid,

    /// Completion filter; `None` means no filter
    pub completed: Option<bool>,

    /// Requested ordering; `None` means engine default (creation order)
    pub sort: Option<SortSpec>,

    /// Maximum number of rows; `None` means no limit
    pub limit: Option<i64>,

    /// Rows to skip; `None` means no skip
    pub skip: Option<i64>,
}

impl TaskQuery {
    /// A bare owner-scoped query with no filters
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            completed: None,
            sort: None,
            limit: None,
            skip: None,
        }
    }

    /// Builds a query from raw request parameters
    pub fn from_params(owner_id: Uuid, params: &ListParams) -> Self {
        Self {
            owner_id,
            completed: params.is_completed.as_deref().map(|v| v == "true"),
            sort: params.sort_by.as_deref().and_then(SortSpec::parse),
            limit: lenient_count(params.limit.as_deref()),
            skip: lenient_count(params.skip.as_deref()),
        }
    }
}

/// Lenient numeric coercion: parse failures and negatives mean "absent"
fn lenient_count(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.parse::<i64>().ok()).filter(|n| *n >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        is_completed: Option<&str>,
        sort_by: Option<&str>,
        limit: Option<&str>,
        skip: Option<&str>,
    ) -> ListParams {
        ListParams {
            is_completed: is_completed.map(str::to_string),
            sort_by: sort_by.map(str::to_string),
            limit: limit.map(str::to_string),
            skip: skip.map(str::to_string),
        }
    }

    #[test]
    fn test_completed_flag_coercion() {
        let owner = Uuid::new_v4();
        let q = TaskQuery::from_params(owner, &params(Some("true"), None, None, None));
        assert_eq!(q.completed, Some(true));

        let q = TaskQuery::from_params(owner, &params(Some("false"), None, None, None));
        assert_eq!(q.completed, Some(false));

        // Anything other than the literal "true" means false, like the flag
        // coming off a query string
        let q = TaskQuery::from_params(owner, &params(Some("yes"), None, None, None));
        assert_eq!(q.completed, Some(false));

        let q = TaskQuery::from_params(owner, &params(None, None, None, None));
        assert_eq!(q.completed, None);
    }

    #[test]
    fn test_sort_spec_parsing() {
        let spec = SortSpec::parse("createdAt:desc").unwrap();
        assert_eq!(spec.field, SortField::CreatedAt);
        assert_eq!(spec.direction, SortDirection::Descending);

        let spec = SortSpec::parse("description").unwrap();
        assert_eq!(spec.direction, SortDirection::Ascending);

        // Unrecognized direction falls back to ascending
        let spec = SortSpec::parse("updatedAt:sideways").unwrap();
        assert_eq!(spec.direction, SortDirection::Ascending);

        // Unrecognized field degrades to default ordering
        assert!(SortSpec::parse("priority:desc").is_none());
    }

    #[test]
    fn test_lenient_pagination() {
        let owner = Uuid::new_v4();
        let q = TaskQuery::from_params(owner, &params(None, None, Some("10"), Some("5")));
        assert_eq!(q.limit, Some(10));
        assert_eq!(q.skip, Some(5));

        // Parse failures must degrade to absence, never error
        let q = TaskQuery::from_params(owner, &params(None, None, Some("ten"), Some("")));
        assert_eq!(q.limit, None);
        assert_eq!(q.skip, None);

        // Negative values are treated as absent
        let q = TaskQuery::from_params(owner, &params(None, None, Some("-3"), None));
        assert_eq!(q.limit, None);
    }

    #[test]
    fn test_owner_is_always_carried() {
        let owner = Uuid::new_v4();
        let q = TaskQuery::from_params(owner, &ListParams::default());
        assert_eq!(q.owner_id, owner);
    }
}

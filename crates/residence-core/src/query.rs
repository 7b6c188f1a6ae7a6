//! List queries: exact-match filters, free-text search and ordering.
//!
//! Each record type declares which of its fields may be filtered, searched,
//! and ordered on through a static [`ListSpec`]. [`ListQuery::parse`] turns
//! raw query-string pairs into a backend-neutral query, silently ignoring
//! parameters that are not declared.

use chrono::NaiveDate;

use crate::validation::ValidationErrors;

pub const SEARCH_PARAM: &str = "search";
pub const ORDERING_PARAM: &str = "ordering";

// ─── Declarations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Integer,
  Text,
  Date,
}

/// A field exposed to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  /// Name used in query strings and JSON bodies.
  pub name:   &'static str,
  /// Backend column the field maps to.
  pub column: &'static str,
  pub kind:   FieldKind,
}

impl Field {
  pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
    Self { name, column, kind }
  }
}

/// The list capabilities declared by one record type.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
  pub filters:  &'static [Field],
  pub search:   &'static [Field],
  pub ordering: &'static [Field],
}

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  Integer(i64),
  Text(String),
  Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
  pub column: &'static str,
  pub value:  FilterValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
  /// Every term must occur in at least one of `columns`.
  pub terms:   Vec<String>,
  pub columns: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
  pub column:     &'static str,
  pub descending: bool,
}

/// A parsed list request. The default value lists everything ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
  pub filters:  Vec<Filter>,
  pub search:   Option<Search>,
  pub ordering: Vec<Order>,
}

impl ListQuery {
  /// Build a query from raw `(name, value)` pairs.
  ///
  /// Empty filter values and undeclared names are ignored. A filter value
  /// that does not parse for its field type is a validation error.
  pub fn parse(
    spec: &ListSpec,
    params: &[(String, String)],
  ) -> Result<Self, ValidationErrors> {
    let mut query  = ListQuery::default();
    let mut errors = ValidationErrors::new();
    let mut terms  = Vec::new();

    for (name, value) in params {
      match name.as_str() {
        SEARCH_PARAM => terms.extend(
          value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_owned),
        ),
        ORDERING_PARAM => {
          for part in value.split(',').map(str::trim) {
            let (descending, field_name) = match part.strip_prefix('-') {
              Some(rest) => (true, rest),
              None => (false, part),
            };
            if let Some(field) = spec.ordering.iter().find(|f| f.name == field_name) {
              query.ordering.push(Order { column: field.column, descending });
            }
          }
        }
        _ => {
          let Some(field) = spec.filters.iter().find(|f| f.name == name) else {
            continue;
          };
          if value.is_empty() {
            continue;
          }
          match parse_value(field.kind, value) {
            Ok(value) => query.filters.push(Filter { column: field.column, value }),
            Err(message) => errors.add(field.name, message),
          }
        }
      }
    }

    if !terms.is_empty() && !spec.search.is_empty() {
      query.search = Some(Search {
        terms,
        columns: spec.search.iter().map(|f| f.column).collect(),
      });
    }

    errors.into_result().map(|()| query)
  }
}

fn parse_value(kind: FieldKind, raw: &str) -> Result<FilterValue, &'static str> {
  match kind {
    FieldKind::Integer => raw
      .trim()
      .parse()
      .map(FilterValue::Integer)
      .map_err(|_| "Enter a whole number."),
    FieldKind::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
      .map(FilterValue::Date)
      .map_err(|_| "Enter a valid date."),
    FieldKind::Text => Ok(FilterValue::Text(raw.to_owned())),
  }
}

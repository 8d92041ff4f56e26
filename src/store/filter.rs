use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A typed bind parameter. Filters are only ever authored by handlers with
/// static column names, so the value side carries the type information both
/// stores need (SQL placeholder binding, in-memory comparison).
#[derive(Debug, Clone)]
pub enum Bind {
    Uuid(Uuid),
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<Uuid> for Bind {
    fn from(v: Uuid) -> Self {
        Bind::Uuid(v)
    }
}
impl From<&str> for Bind {
    fn from(v: &str) -> Self {
        Bind::Text(v.to_string())
    }
}
impl From<String> for Bind {
    fn from(v: String) -> Self {
        Bind::Text(v)
    }
}
impl From<i64> for Bind {
    fn from(v: i64) -> Self {
        Bind::Int(v)
    }
}
impl From<f64> for Bind {
    fn from(v: f64) -> Self {
        Bind::Float(v)
    }
}
impl From<bool> for Bind {
    fn from(v: bool) -> Self {
        Bind::Bool(v)
    }
}
impl From<DateTime<Utc>> for Bind {
    fn from(v: DateTime<Utc>) -> Self {
        Bind::Timestamp(v)
    }
}

impl Bind {
    /// Compare a JSON row value against this bind. `None` means the values
    /// are incomparable (missing field, type mismatch), which excludes the
    /// row the same way SQL three-valued logic would.
    fn compare(&self, value: &Value) -> Option<Ordering> {
        match self {
            Bind::Uuid(u) => value.as_str().map(|s| s.cmp(u.to_string().as_str())),
            Bind::Text(t) => value.as_str().map(|s| s.cmp(t.as_str())),
            Bind::Int(i) => value.as_i64().map(|v| v.cmp(i)),
            Bind::Float(f) => value.as_f64().and_then(|v| v.partial_cmp(f)),
            Bind::Bool(b) => value.as_bool().map(|v| v.cmp(b)),
            Bind::Timestamp(t) => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc).cmp(t)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Cond {
    Eq(&'static str, Bind),
    Ne(&'static str, Bind),
    Gte(&'static str, Bind),
    Lte(&'static str, Bind),
    IsNull(&'static str),
    In(&'static str, Vec<Bind>),
}

impl Cond {
    fn matches(&self, row: &Value) -> bool {
        let field = |col: &str| row.get(col);
        match self {
            Cond::Eq(col, bind) => {
                matches!(field(col).and_then(|v| bind.compare(v)), Some(Ordering::Equal))
            }
            Cond::Ne(col, bind) => matches!(
                field(col).and_then(|v| bind.compare(v)),
                Some(Ordering::Less) | Some(Ordering::Greater)
            ),
            Cond::Gte(col, bind) => matches!(
                field(col).and_then(|v| bind.compare(v)),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            Cond::Lte(col, bind) => matches!(
                field(col).and_then(|v| bind.compare(v)),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            Cond::IsNull(col) => match field(col) {
                None | Some(Value::Null) => true,
                _ => false,
            },
            Cond::In(col, binds) => field(col).map_or(false, |v| {
                binds.iter().any(|b| b.compare(v) == Some(Ordering::Equal))
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Row selection criteria shared by both store implementations. Soft-deleted
/// rows are excluded unless `include_deleted()` is called, mirroring the
/// convention that every default read filters on `is_deleted`.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<Cond>,
    include_deleted: bool,
    order: Option<(&'static str, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Bind>) -> Self {
        self.conds.push(Cond::Eq(column, value.into()));
        self
    }

    pub fn ne(mut self, column: &'static str, value: impl Into<Bind>) -> Self {
        self.conds.push(Cond::Ne(column, value.into()));
        self
    }

    pub fn gte(mut self, column: &'static str, value: impl Into<Bind>) -> Self {
        self.conds.push(Cond::Gte(column, value.into()));
        self
    }

    pub fn lte(mut self, column: &'static str, value: impl Into<Bind>) -> Self {
        self.conds.push(Cond::Lte(column, value.into()));
        self
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.conds.push(Cond::IsNull(column));
        self
    }

    pub fn any_of(mut self, column: &'static str, values: Vec<Bind>) -> Self {
        self.conds.push(Cond::In(column, values));
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn order_asc(mut self, column: &'static str) -> Self {
        self.order = Some((column, SortDirection::Asc));
        self
    }

    pub fn order_desc(mut self, column: &'static str) -> Self {
        self.order = Some((column, SortDirection::Desc));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset.max(0));
        self
    }

    /// WHERE clause body with `$n` placeholders starting at 1, plus the bind
    /// parameters in placeholder order. Empty string when unconditioned.
    pub(crate) fn sql_where(&self, soft_delete: bool) -> (String, Vec<Bind>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Bind> = Vec::new();
        let mut idx = 1usize;

        if soft_delete && !self.include_deleted {
            clauses.push("\"is_deleted\" = FALSE".to_string());
        }

        for cond in &self.conds {
            match cond {
                Cond::Eq(col, bind) => {
                    clauses.push(format!("\"{}\" = ${}", col, idx));
                    params.push(bind.clone());
                    idx += 1;
                }
                Cond::Ne(col, bind) => {
                    clauses.push(format!("\"{}\" <> ${}", col, idx));
                    params.push(bind.clone());
                    idx += 1;
                }
                Cond::Gte(col, bind) => {
                    clauses.push(format!("\"{}\" >= ${}", col, idx));
                    params.push(bind.clone());
                    idx += 1;
                }
                Cond::Lte(col, bind) => {
                    clauses.push(format!("\"{}\" <= ${}", col, idx));
                    params.push(bind.clone());
                    idx += 1;
                }
                Cond::IsNull(col) => {
                    clauses.push(format!("\"{}\" IS NULL", col));
                }
                Cond::In(col, binds) => {
                    if binds.is_empty() {
                        // IN () matches nothing
                        clauses.push("FALSE".to_string());
                    } else {
                        let placeholders: Vec<String> = binds
                            .iter()
                            .map(|b| {
                                params.push(b.clone());
                                let p = format!("${}", idx);
                                idx += 1;
                                p
                            })
                            .collect();
                        clauses.push(format!("\"{}\" IN ({})", col, placeholders.join(", ")));
                    }
                }
            }
        }

        (clauses.join(" AND "), params)
    }

    /// ORDER BY / LIMIT / OFFSET suffix.
    pub(crate) fn sql_suffix(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some((col, dir)) = self.order {
            parts.push(format!("ORDER BY \"{}\" {}", col, dir.to_sql()));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }
        parts.join(" ")
    }

    pub(crate) fn matches(&self, row: &Value, soft_delete: bool) -> bool {
        if soft_delete
            && !self.include_deleted
            && row.get("is_deleted").and_then(Value::as_bool).unwrap_or(false)
        {
            return false;
        }
        self.conds.iter().all(|c| c.matches(row))
    }

    pub(crate) fn order_spec(&self) -> Option<(&'static str, SortDirection)> {
        self.order
    }

    pub(crate) fn limit_spec(&self) -> Option<i64> {
        self.limit
    }

    pub(crate) fn offset_spec(&self) -> Option<i64> {
        self.offset
    }
}

/// Ordering between two JSON values of the same column, for in-memory sorts.
/// Timestamp-looking strings compare chronologically.
pub(crate) fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => {
            match (
                DateTime::parse_from_rfc3339(sa),
                DateTime::parse_from_rfc3339(sb),
            ) {
                (Ok(da), Ok(db)) => da.cmp(&db),
                _ => sa.cmp(sb),
            }
        }
        (Value::Number(na), Value::Number(nb)) => na
            .as_f64()
            .partial_cmp(&nb.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(ba), Value::Bool(bb)) => ba.cmp(bb),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

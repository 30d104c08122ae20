//! Positional SQL assembly
//!
//! Queries are built from a static select, a list of predicates and their
//! bound values, and an optional ordering and row cap. Predicate fragments
//! are `&'static str` with `?` markers; values never enter the SQL text.

use chrono::NaiveDateTime;

/// SQL flavour of a monitored database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Placeholder for the 1-based parameter `index`
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Target type for casting aggregates to a 64-bit integer
    pub fn bigint(self) -> &'static str {
        match self {
            Dialect::MySql => "SIGNED",
            Dialect::Postgres | Dialect::Sqlite => "BIGINT",
        }
    }
}

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Timestamp(NaiveDateTime),
}

impl SqlParam {
    /// `LIKE` pattern matching `value` anywhere
    pub fn contains(value: &str) -> Self {
        SqlParam::Text(format!("%{}%", value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        SqlParam::Text(value.into())
    }
}

/// Rendered statement with its parameters in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

#[derive(Debug, Clone)]
struct Predicate {
    fragment: &'static str,
    params: Vec<SqlParam>,
}

/// Accumulates `(fragment, parameters)` pairs and renders them joined by `AND`
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    dialect: Dialect,
    select: String,
    predicates: Vec<Predicate>,
    order_by: Option<&'static str>,
    limit: Option<u32>,
}

impl SqlBuilder {
    pub fn new(dialect: Dialect, select: impl Into<String>) -> Self {
        Self {
            dialect,
            select: select.into(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Add a predicate; the number of `?` markers must equal `params.len()`
    pub fn and(mut self, fragment: &'static str, params: Vec<SqlParam>) -> Self {
        debug_assert_eq!(
            fragment.matches('?').count(),
            params.len(),
            "placeholder count mismatch in '{}'",
            fragment
        );
        self.predicates.push(Predicate { fragment, params });
        self
    }

    /// Add a single-parameter predicate only when `value` is present
    pub fn and_opt(self, fragment: &'static str, value: Option<SqlParam>) -> Self {
        match value {
            Some(value) => self.and(fragment, vec![value]),
            None => self,
        }
    }

    pub fn order_by(mut self, order_by: &'static str) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn build(self) -> SqlQuery {
        let mut sql = self.select;
        let mut params = Vec::new();

        for (i, predicate) in self.predicates.into_iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let mut index = params.len();
            for ch in predicate.fragment.chars() {
                if ch == '?' {
                    index += 1;
                    sql.push_str(&self.dialect.placeholder(index));
                } else {
                    sql.push(ch);
                }
            }
            params.extend(predicate.params);
        }

        if let Some(order_by) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        SqlQuery { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SELECT: &str = "SELECT a FROM t";

    #[test]
    fn test_no_predicates() {
        let query = SqlBuilder::new(Dialect::Sqlite, SELECT)
            .order_by("a DESC")
            .limit(10)
            .build();
        assert_eq!(query.sql(), "SELECT a FROM t ORDER BY a DESC LIMIT 10");
        assert!(query.params().is_empty());
    }

    #[test]
    fn test_question_mark_placeholders() {
        let query = SqlBuilder::new(Dialect::MySql, SELECT)
            .and("name LIKE ?", vec![SqlParam::contains("load")])
            .and("status = ?", vec![SqlParam::text("FAILED")])
            .build();
        assert_eq!(query.sql(), "SELECT a FROM t WHERE name LIKE ? AND status = ?");
        assert_eq!(
            query.params(),
            &[SqlParam::text("%load%"), SqlParam::text("FAILED")]
        );
    }

    #[test]
    fn test_numbered_placeholders_continue_across_predicates() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let query = SqlBuilder::new(Dialect::Postgres, SELECT)
            .and("start >= ?", vec![SqlParam::Timestamp(at)])
            .and("(name LIKE ? OR msg LIKE ?)", vec![SqlParam::contains("x"), SqlParam::contains("x")])
            .and("id = ?", vec![SqlParam::Int(7)])
            .build();
        assert_eq!(
            query.sql(),
            "SELECT a FROM t WHERE start >= $1 AND (name LIKE $2 OR msg LIKE $3) AND id = $4"
        );
        assert_eq!(query.params().len(), 4);
        assert_eq!(query.params()[0], SqlParam::Timestamp(at));
        assert_eq!(query.params()[3], SqlParam::Int(7));
    }

    #[test]
    fn test_and_opt_skips_absent_values() {
        let builder = SqlBuilder::new(Dialect::Sqlite, SELECT)
            .and_opt("status = ?", None)
            .and_opt("id = ?", Some(SqlParam::Int(1)));
        assert_eq!(builder.predicate_count(), 1);
        assert_eq!(builder.build().sql(), "SELECT a FROM t WHERE id = ?");
    }

    #[test]
    fn test_values_never_rendered_into_sql() {
        let query = SqlBuilder::new(Dialect::Sqlite, SELECT)
            .and("name LIKE ?", vec![SqlParam::contains("'; DROP TABLE t; --")])
            .build();
        assert!(!query.sql().contains("DROP"));
    }
}

//! Typed SQL query builder scoped to one model.
//!
//! # Responsibility
//! - Accumulate predicates, ordering and pagination for `SELECT`s over a
//!   model table.
//! - Render SQL with positional binds only.
//!
//! # Invariants
//! - Column names are resolved against the model before they enter SQL.
//! - Results are always ordered; `id ASC` is appended as the final
//!   tiebreak unless `id` is already ordered explicitly.

use crate::model::{
    resolve_column, select_columns, Fields, Model, DELETED_AT_COLUMN, EPOCH, ID_COLUMN,
};
use crate::repo::crud_repo::RepoResult;
use rusqlite::types::Value;
use std::marker::PhantomData;

/// Sort direction for `Query::order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Eq(&'static str, Value),
    IsNull(&'static str),
    NotNull(&'static str),
    In(&'static str, Vec<Value>),
    Gt(&'static str, Value),
    Lt(&'static str, Value),
}

/// A not-yet-executed `SELECT` over `M`'s table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<M> {
    predicates: Vec<Predicate>,
    order: Vec<(&'static str, Direction)>,
    offset: Option<u64>,
    limit: Option<u64>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Default for Query<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Query<M> {
    /// Unfiltered query over the whole table, soft-deleted rows included.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            order: Vec::new(),
            offset: None,
            limit: None,
            _model: PhantomData,
        }
    }

    /// Adds the live-row predicate `deleted_at = EPOCH`.
    ///
    /// Callers must only use this for soft-delete models.
    pub(crate) fn exclude_deleted(mut self) -> Self {
        self.predicates
            .push(Predicate::Eq(DELETED_AT_COLUMN, Value::Integer(EPOCH)));
        self
    }

    /// `column = value`; a `Null` value compiles to `IS NULL`.
    pub fn filter_eq(mut self, column: &str, value: impl Into<Value>) -> RepoResult<Self> {
        let column = resolve_column::<M>(column)?;
        let predicate = match value.into() {
            Value::Null => Predicate::IsNull(column),
            value => Predicate::Eq(column, value),
        };
        self.predicates.push(predicate);
        Ok(self)
    }

    /// Conjunction of `filter_eq` over every entry of `filters`.
    pub fn filter_by(self, filters: &Fields) -> RepoResult<Self> {
        filters
            .iter()
            .try_fold(self, |query, (column, value)| {
                query.filter_eq(column, value.clone())
            })
    }

    /// `column IN (values)`; an empty list matches nothing.
    pub fn filter_in<I, V>(mut self, column: &str, values: I) -> RepoResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = resolve_column::<M>(column)?;
        self.predicates.push(Predicate::In(
            column,
            values.into_iter().map(Into::into).collect(),
        ));
        Ok(self)
    }

    pub fn filter_gt(mut self, column: &str, value: impl Into<Value>) -> RepoResult<Self> {
        let column = resolve_column::<M>(column)?;
        self.predicates.push(Predicate::Gt(column, value.into()));
        Ok(self)
    }

    pub fn filter_lt(mut self, column: &str, value: impl Into<Value>) -> RepoResult<Self> {
        let column = resolve_column::<M>(column)?;
        self.predicates.push(Predicate::Lt(column, value.into()));
        Ok(self)
    }

    pub fn filter_null(mut self, column: &str) -> RepoResult<Self> {
        let column = resolve_column::<M>(column)?;
        self.predicates.push(Predicate::IsNull(column));
        Ok(self)
    }

    pub fn filter_not_null(mut self, column: &str) -> RepoResult<Self> {
        let column = resolve_column::<M>(column)?;
        self.predicates.push(Predicate::NotNull(column));
        Ok(self)
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> RepoResult<Self> {
        let column = resolve_column::<M>(column)?;
        self.order.push((column, direction));
        Ok(self)
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the `SELECT` and its bind values.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut binds = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE 1 = 1",
            select_columns::<M>().join(", "),
            M::TABLE
        );

        for predicate in &self.predicates {
            match predicate {
                Predicate::Eq(column, value) => {
                    sql.push_str(&format!(" AND {column} = ?"));
                    binds.push(value.clone());
                }
                Predicate::IsNull(column) => sql.push_str(&format!(" AND {column} IS NULL")),
                Predicate::NotNull(column) => {
                    sql.push_str(&format!(" AND {column} IS NOT NULL"))
                }
                Predicate::In(_, values) if values.is_empty() => sql.push_str(" AND 1 = 0"),
                Predicate::In(column, values) => {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&format!(" AND {column} IN ({placeholders})"));
                    binds.extend(values.iter().cloned());
                }
                Predicate::Gt(column, value) => {
                    sql.push_str(&format!(" AND {column} > ?"));
                    binds.push(value.clone());
                }
                Predicate::Lt(column, value) => {
                    sql.push_str(&format!(" AND {column} < ?"));
                    binds.push(value.clone());
                }
            }
        }

        let mut order: Vec<String> = self
            .order
            .iter()
            .map(|(column, direction)| format!("{column} {}", direction.as_sql()))
            .collect();
        if !self.order.iter().any(|(column, _)| *column == ID_COLUMN) {
            order.push(format!("{ID_COLUMN} ASC"));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ?");
                binds.push(Value::Integer(clamp_to_i64(limit)));
                if let Some(offset) = offset.filter(|offset| *offset > 0) {
                    sql.push_str(" OFFSET ?");
                    binds.push(Value::Integer(clamp_to_i64(offset)));
                }
            }
            (None, Some(offset)) if offset > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                binds.push(Value::Integer(clamp_to_i64(offset)));
            }
            (None, _) => {}
        }

        (sql, binds)
    }

    /// Renders `SELECT COUNT(*)` wrapped around this query.
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let (inner, binds) = self.to_sql();
        (format!("SELECT COUNT(*) FROM ({inner})"), binds)
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{Direction, Query};
    use crate::model::language::Language;
    use crate::model::skill::Skill;
    use crate::repo::crud_repo::RepoError;
    use rusqlite::types::Value;

    #[test]
    fn renders_predicates_in_order_with_default_id_tiebreak() {
        let query = Query::<Skill>::new()
            .filter_eq("name", "rust".to_string())
            .unwrap()
            .filter_eq("description", Value::Null)
            .unwrap()
            .filter_gt("id", 3)
            .unwrap()
            .limit(10);

        let (sql, binds) = query.to_sql();
        assert_eq!(
            sql,
            "SELECT id, deleted_at, created_by_id, updated_by_id, name, description FROM skills \
             WHERE 1 = 1 AND name = ? AND description IS NULL AND id > ? ORDER BY id ASC LIMIT ?"
        );
        assert_eq!(
            binds,
            vec![
                Value::Text("rust".to_string()),
                Value::Integer(3),
                Value::Integer(10)
            ]
        );
    }

    #[test]
    fn renders_lt_and_null_checks_without_extra_binds() {
        let (sql, binds) = Query::<Language>::new()
            .filter_lt("id", 3)
            .unwrap()
            .filter_not_null("code")
            .unwrap()
            .filter_null("name")
            .unwrap()
            .to_sql();
        assert_eq!(
            sql,
            "SELECT id, name, code FROM languages \
             WHERE 1 = 1 AND id < ? AND code IS NOT NULL AND name IS NULL ORDER BY id ASC"
        );
        assert_eq!(binds, vec![Value::Integer(3)]);
    }

    #[test]
    fn newest_first_cursor_orders_before_limit() {
        let (sql, binds) = Query::<Language>::new()
            .filter_lt("id", 40)
            .unwrap()
            .order_by("id", Direction::Desc)
            .unwrap()
            .limit(20)
            .to_sql();
        assert!(sql.ends_with("AND id < ? ORDER BY id DESC LIMIT ?"));
        assert_eq!(binds, vec![Value::Integer(40), Value::Integer(20)]);
    }

    #[test]
    fn null_checks_resolve_columns() {
        assert!(Query::<Language>::new().filter_null("missing").is_err());
        assert!(Query::<Language>::new().filter_not_null("missing").is_err());
        assert!(Query::<Language>::new().filter_lt("missing", 1).is_err());
    }

    #[test]
    fn offset_without_limit_uses_unbounded_limit() {
        let (sql, binds) = Query::<Language>::new().offset(4).to_sql();
        assert!(sql.ends_with("ORDER BY id ASC LIMIT -1 OFFSET ?"));
        assert_eq!(binds, vec![Value::Integer(4)]);
    }

    #[test]
    fn explicit_id_ordering_replaces_tiebreak() {
        let (sql, _) = Query::<Language>::new()
            .order_by("id", Direction::Desc)
            .unwrap()
            .to_sql();
        assert!(sql.ends_with("ORDER BY id DESC"));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let (sql, binds) = Query::<Language>::new()
            .filter_in("name", Vec::<String>::new())
            .unwrap()
            .to_sql();
        assert!(sql.contains("AND 1 = 0"));
        assert!(binds.is_empty());
    }

    #[test]
    fn unknown_and_capability_gated_columns_are_rejected() {
        let err = Query::<Language>::new()
            .filter_eq("name; DROP TABLE languages", 1)
            .unwrap_err();
        assert!(matches!(err, RepoError::UnknownField { table: "languages", .. }));

        // Languages have no tombstone column.
        assert!(Query::<Language>::new().filter_eq("deleted_at", 0).is_err());
    }

    #[test]
    fn count_wraps_query_as_subquery() {
        let (sql, _) = Query::<Language>::new().to_count_sql();
        assert!(sql.starts_with("SELECT COUNT(*) FROM (SELECT id, name, code FROM languages"));
        assert!(sql.ends_with(")"));
    }
}

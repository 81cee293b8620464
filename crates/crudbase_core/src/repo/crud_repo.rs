//! Generic CRUD repository over any `Model`.
//!
//! # Responsibility
//! - Build filtered queries for a bound model, applying soft-delete and
//!   ownership rules declared by the model's `Capabilities`.
//! - Run them on the caller's connection and map rows back to models.
//! - Funnel every write through one persist/commit/refresh path.
//!
//! # Invariants
//! - Not-found is `Ok(None)`, never an error.
//! - `RepoError::MoreThanOne` is the only domain failure; storage errors
//!   propagate unchanged.
//! - The connection must be in autocommit mode; each write commits its own
//!   transaction.
//! - Returned models always reflect the committed row.

use crate::db::DbError;
use crate::model::user::User;
use crate::model::{
    unknown_field, Fields, Model, RecordMeta, RowId, CREATED_BY_COLUMN, DELETED_AT_COLUMN,
    EPOCH, ID_COLUMN, UPDATED_BY_COLUMN,
};
use crate::repo::query::Query;
use crate::schema::{Input, Schema};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

/// Page size used when callers do not pick one.
pub const DEFAULT_LIMIT: u64 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for query construction, persistence and row mapping.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A find-or-create filter matched several rows.
    MoreThanOne { table: &'static str, matches: u64 },
    UnknownField { table: &'static str, field: String },
    /// A row disappeared between write and refresh.
    NotFound { table: &'static str, id: RowId },
    InvalidData(String),
    Serialization(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MoreThanOne { table, matches } => {
                write!(f, "expected at most one `{table}` row, found {matches}")
            }
            Self::UnknownField { table, field } => {
                write!(f, "unknown field `{field}` for `{table}`")
            }
            Self::NotFound { table, id } => write!(f, "`{table}` row not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid data: {message}"),
            Self::Serialization(err) => write!(f, "schema serialization failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::MoreThanOne { .. }
            | Self::UnknownField { .. }
            | Self::NotFound { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// CRUD operations for model `M` with create schema `C` and update schema `U`.
///
/// The repository is stateless apart from the two capability flags copied
/// from `M::CAPABILITIES`; the connection is passed to every call.
pub struct CrudRepository<M, C, U> {
    soft_delete: bool,
    ownership: bool,
    _types: PhantomData<fn() -> (M, C, U)>,
}

impl<M: Model, C: Schema, U: Schema> Default for CrudRepository<M, C, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model, C: Schema, U: Schema> CrudRepository<M, C, U> {
    pub fn new() -> Self {
        Self {
            soft_delete: M::CAPABILITIES.soft_delete,
            ownership: M::CAPABILITIES.ownership,
            _types: PhantomData,
        }
    }

    pub fn soft_delete_enabled(&self) -> bool {
        self.soft_delete
    }

    pub fn ownership_enabled(&self) -> bool {
        self.ownership
    }

    /// Query over the model table, excluding tombstoned rows when the model
    /// supports soft delete.
    pub fn base_query(&self) -> Query<M> {
        let query = Query::new();
        if self.soft_delete {
            query.exclude_deleted()
        } else {
            query
        }
    }

    /// All live rows, restricted to `user`'s rows when ownership applies.
    pub fn get_all(&self, session: &Connection, user: Option<&User>) -> RepoResult<Vec<M>> {
        let mut query = self.base_query();
        if let Some(user) = user.filter(|_| self.ownership) {
            query = query.filter_eq(CREATED_BY_COLUMN, user.id())?;
        }
        self.execute_all(session, &query)
    }

    pub fn execute_all(&self, session: &Connection, query: &Query<M>) -> RepoResult<Vec<M>> {
        let (sql, binds) = query.to_sql();
        let mut stmt = session.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut models = Vec::new();

        while let Some(row) = rows.next()? {
            models.push(read_row::<M>(row)?);
        }

        Ok(models)
    }

    /// First row of `query`, or `None`.
    pub fn execute_one(&self, session: &Connection, query: &Query<M>) -> RepoResult<Option<M>> {
        let (sql, binds) = query.to_sql();
        let mut stmt = session.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_row::<M>(row)?)),
            None => Ok(None),
        }
    }

    pub fn count(&self, session: &Connection, query: &Query<M>) -> RepoResult<u64> {
        let (sql, binds) = query.to_count_sql();
        let count: i64 = session.query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative count {count} from `{}`", M::TABLE)))
    }

    /// Primary-key lookup. Tombstoned rows are still returned.
    pub fn get(&self, session: &Connection, id: RowId) -> RepoResult<Option<M>> {
        let query = Query::new().filter_eq(ID_COLUMN, id)?;
        self.execute_one(session, &query)
    }

    /// Live rows matching every `column = value` in `filters`.
    pub fn get_multi(&self, filters: &Fields) -> RepoResult<Query<M>> {
        self.base_query().filter_by(filters)
    }

    pub fn get_multi_limit(&self, skip: u64, limit: u64, filters: &Fields) -> RepoResult<Query<M>> {
        Ok(self.get_multi(filters)?.offset(skip).limit(limit))
    }

    /// Cursor page: rows with `id > since_id`.
    pub fn get_multi_since(
        &self,
        since_id: RowId,
        limit: u64,
        filters: &Fields,
    ) -> RepoResult<Query<M>> {
        Ok(self
            .get_multi(filters)?
            .filter_gt(ID_COLUMN, since_id)?
            .limit(limit))
    }

    pub fn get_by_name(&self, session: &Connection, name: &str) -> RepoResult<Option<M>> {
        let query = self.base_query().filter_eq("name", name.to_string())?;
        self.execute_one(session, &query)
    }

    pub fn get_by_names<S: AsRef<str>>(
        &self,
        session: &Connection,
        names: &[S],
    ) -> RepoResult<Vec<M>> {
        let query = self
            .base_query()
            .filter_in("name", names.iter().map(|name| name.as_ref().to_string()))?;
        self.execute_all(session, &query)
    }

    /// Inserts or updates `obj`, commits, and returns the row as stored.
    pub fn commit_and_refresh(&self, session: &Connection, mut obj: M) -> RepoResult<M> {
        let tx = session.unchecked_transaction()?;
        let id = self.persist(&tx, &mut obj)?;
        tx.commit()?;
        self.refresh(session, id)
    }

    /// Creates a row from `input`, attributed to `user` when ownership applies.
    ///
    /// # Errors
    /// - `RepoError::UnknownField` when `input` carries a key that is not a
    ///   data column of `M`.
    pub fn create(
        &self,
        session: &Connection,
        input: &Input<C>,
        user: Option<&User>,
    ) -> RepoResult<M> {
        let data = input.to_fields()?;
        ensure_data_columns::<M>(&data)?;
        let mut obj = M::from_fields(RecordMeta::default(), &data)?;
        if self.ownership {
            obj.meta_mut().created_by_id = user.and_then(User::id);
        }
        let created = self.commit_and_refresh(session, obj)?;
        info!(
            "event=crud_create module=repo status=ok table={} id={}",
            M::TABLE,
            created.id().unwrap_or_default()
        );
        Ok(created)
    }

    /// Returns the row identified or matched by `input`, creating it when
    /// nothing matches.
    ///
    /// A non-empty `id` in `input` short-circuits to `get` and never creates.
    /// Otherwise the remaining fields are an equality filter; the count and
    /// the insert share one `IMMEDIATE` transaction so concurrent writers on
    /// the same database cannot both insert.
    ///
    /// # Errors
    /// - `RepoError::MoreThanOne` when the filter matches several live rows.
    /// - `RepoError::UnknownField` when nothing matches and the filter holds a
    ///   key that is not a data column of `M`.
    pub fn get_or_create(
        &self,
        session: &Connection,
        input: &Input<C>,
        user: Option<&User>,
    ) -> RepoResult<Option<M>> {
        let mut data = input.to_fields()?;
        if let Some(id) = requested_id(data.get(ID_COLUMN))? {
            return self.get(session, id);
        }
        data.remove(ID_COLUMN);

        let query = self.get_multi(&data)?;
        let tx = Transaction::new_unchecked(session, TransactionBehavior::Immediate)?;
        match self.count(&tx, &query)? {
            0 => {
                ensure_data_columns::<M>(&data)?;
                let mut obj = M::from_fields(RecordMeta::default(), &data)?;
                if self.ownership {
                    obj.meta_mut().created_by_id = user.and_then(User::id);
                }
                let id = self.persist(&tx, &mut obj)?;
                tx.commit()?;
                info!(
                    "event=crud_get_or_create module=repo status=ok table={} outcome=created id={id}",
                    M::TABLE
                );
                self.refresh(session, id).map(Some)
            }
            1 => {
                let found = self.execute_one(&tx, &query)?;
                tx.commit()?;
                Ok(found)
            }
            matches => {
                warn!(
                    "event=crud_get_or_create module=repo status=error table={} error_code=more_than_one matches={matches}",
                    M::TABLE
                );
                Err(RepoError::MoreThanOne {
                    table: M::TABLE,
                    matches,
                })
            }
        }
    }

    /// Applies the explicitly set fields of `input` to `db_obj` and persists it.
    ///
    /// Input keys that are not data columns of `M` are ignored. Metadata
    /// (`id`, `deleted_at`, attribution) is never taken from `input`; use
    /// `restore` to clear a tombstone.
    pub fn update(
        &self,
        session: &Connection,
        mut db_obj: M,
        input: &Input<U>,
        user: Option<&User>,
    ) -> RepoResult<M> {
        let current = db_obj.to_fields();
        for (column, value) in input.explicit_fields()? {
            if current.contains_key(&column) {
                db_obj.set_field(&column, value)?;
            }
        }
        if self.ownership {
            db_obj.meta_mut().updated_by_id = user.and_then(User::id);
        }

        let updated = self.commit_and_refresh(session, db_obj)?;
        info!(
            "event=crud_update module=repo status=ok table={} id={}",
            M::TABLE,
            updated.id().unwrap_or_default()
        );
        Ok(updated)
    }

    /// Soft-deletes the row when the model supports it, hard-deletes otherwise.
    ///
    /// After a hard delete the returned model is detached from storage.
    pub fn delete(&self, session: &Connection, id: RowId) -> RepoResult<Option<M>> {
        let Some(mut obj) = self.get(session, id)? else {
            return Ok(None);
        };

        if self.soft_delete {
            obj.meta_mut().soft_delete();
            let deleted = self.commit_and_refresh(session, obj)?;
            info!(
                "event=crud_delete module=repo status=ok table={} id={id} mode=soft",
                M::TABLE
            );
            return Ok(Some(deleted));
        }

        self.remove(session, id)?;
        info!(
            "event=crud_delete module=repo status=ok table={} id={id} mode=hard",
            M::TABLE
        );
        Ok(Some(obj))
    }

    /// Clears the tombstone of a soft-deleted row.
    ///
    /// Live rows and models without soft delete are returned as stored.
    pub fn restore(&self, session: &Connection, id: RowId) -> RepoResult<Option<M>> {
        let Some(mut obj) = self.get(session, id)? else {
            return Ok(None);
        };
        if !self.soft_delete || !obj.meta().is_deleted() {
            return Ok(Some(obj));
        }

        obj.meta_mut().restore();
        let restored = self.commit_and_refresh(session, obj)?;
        info!(
            "event=crud_restore module=repo status=ok table={} id={id}",
            M::TABLE
        );
        Ok(Some(restored))
    }

    /// Permanently removes the row, tombstoned or not.
    pub fn purge(&self, session: &Connection, id: RowId) -> RepoResult<Option<M>> {
        let Some(obj) = self.get(session, id)? else {
            return Ok(None);
        };
        self.remove(session, id)?;
        info!(
            "event=crud_purge module=repo status=ok table={} id={id}",
            M::TABLE
        );
        Ok(Some(obj))
    }

    fn refresh(&self, session: &Connection, id: RowId) -> RepoResult<M> {
        self.get(session, id)?
            .ok_or(RepoError::NotFound { table: M::TABLE, id })
    }

    fn remove(&self, session: &Connection, id: RowId) -> RepoResult<()> {
        let tx = session.unchecked_transaction()?;
        tx.execute(
            &format!("DELETE FROM {} WHERE {ID_COLUMN} = ?1;", M::TABLE),
            [id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Writes `obj` without committing and records its id.
    fn persist(&self, conn: &Connection, obj: &mut M) -> RepoResult<RowId> {
        let mut values = obj.to_fields();
        let mut columns: Vec<&'static str> = M::COLUMNS.to_vec();
        let mut binds: Vec<Value> = M::COLUMNS
            .iter()
            .map(|column| values.remove(*column).unwrap_or(Value::Null))
            .collect();

        let meta = obj.meta();
        let existing_id = meta.id;
        if self.soft_delete {
            columns.push(DELETED_AT_COLUMN);
            binds.push(Value::Integer(meta.deleted_at));
        }
        if self.ownership {
            columns.push(CREATED_BY_COLUMN);
            binds.push(meta.created_by_id.into());
            columns.push(UPDATED_BY_COLUMN);
            binds.push(meta.updated_by_id.into());
        }

        match existing_id {
            Some(id) => {
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|column| format!("{column} = ?"))
                    .collect();
                binds.push(Value::Integer(id));
                let changed = conn.execute(
                    &format!(
                        "UPDATE {} SET {} WHERE {ID_COLUMN} = ?;",
                        M::TABLE,
                        assignments.join(", ")
                    ),
                    params_from_iter(binds),
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound { table: M::TABLE, id });
                }
                Ok(id)
            }
            None => {
                let placeholders = vec!["?"; columns.len()].join(", ");
                conn.execute(
                    &format!(
                        "INSERT INTO {} ({}) VALUES ({placeholders});",
                        M::TABLE,
                        columns.join(", ")
                    ),
                    params_from_iter(binds),
                )?;
                let id = conn.last_insert_rowid();
                obj.meta_mut().id = Some(id);
                Ok(id)
            }
        }
    }
}

fn read_row<M: Model>(row: &Row<'_>) -> RepoResult<M> {
    let capabilities = M::CAPABILITIES;
    let meta = RecordMeta {
        id: Some(row.get(ID_COLUMN)?),
        deleted_at: if capabilities.soft_delete {
            row.get(DELETED_AT_COLUMN)?
        } else {
            EPOCH
        },
        created_by_id: if capabilities.ownership {
            row.get(CREATED_BY_COLUMN)?
        } else {
            None
        },
        updated_by_id: if capabilities.ownership {
            row.get(UPDATED_BY_COLUMN)?
        } else {
            None
        },
    };

    let mut fields = Fields::new();
    for column in M::COLUMNS {
        fields.insert(column.to_string(), row.get::<_, Value>(*column)?);
    }
    M::from_fields(meta, &fields)
}

/// Rejects input keys that are not data columns of `M`.
fn ensure_data_columns<M: Model>(data: &Fields) -> RepoResult<()> {
    match data
        .keys()
        .find(|key| !M::COLUMNS.contains(&key.as_str()))
    {
        Some(key) => Err(unknown_field(M::TABLE, key)),
        None => Ok(()),
    }
}

/// Interprets an input `id` the way find-or-create expects: missing, null,
/// zero or empty text mean "no id"; anything else is a lookup key.
fn requested_id(value: Option<&Value>) -> RepoResult<Option<RowId>> {
    match value {
        None | Some(Value::Null) | Some(Value::Integer(0)) => Ok(None),
        Some(Value::Integer(id)) => Ok(Some(*id)),
        Some(Value::Text(text)) if text.is_empty() => Ok(None),
        Some(Value::Text(text)) => text
            .parse::<RowId>()
            .map(Some)
            .map_err(|_| RepoError::InvalidData(format!("id must be an integer, got `{text}`"))),
        Some(other) => Err(RepoError::InvalidData(format!(
            "id must be an integer, got {:?}",
            other.data_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_data_columns, requested_id, RepoError};
    use crate::model::fields;
    use crate::model::skill::Skill;
    use rusqlite::types::Value;

    #[test]
    fn data_column_check_names_the_first_unknown_key() {
        let ok = fields([("name", "rust".to_string()), ("description", "x".to_string())]);
        assert!(ensure_data_columns::<Skill>(&ok).is_ok());

        let metadata = fields([
            ("name", Value::Text("rust".to_string())),
            ("deleted_at", Value::Integer(0)),
        ]);
        let err = ensure_data_columns::<Skill>(&metadata).unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnknownField { table: "skills", ref field } if field == "deleted_at"
        ));
    }

    #[test]
    fn requested_id_treats_empty_values_as_absent() {
        assert_eq!(requested_id(None).unwrap(), None);
        assert_eq!(requested_id(Some(&Value::Null)).unwrap(), None);
        assert_eq!(requested_id(Some(&Value::Integer(0))).unwrap(), None);
        assert_eq!(requested_id(Some(&Value::Text(String::new()))).unwrap(), None);
        assert_eq!(requested_id(Some(&Value::Integer(7))).unwrap(), Some(7));
        assert_eq!(requested_id(Some(&Value::Text("12".to_string()))).unwrap(), Some(12));
        assert!(requested_id(Some(&Value::Text("abc".to_string()))).is_err());
        assert!(requested_id(Some(&Value::Real(1.5))).is_err());
    }
}

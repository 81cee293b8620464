//! Persistence model contracts shared by every repository.
//!
//! # Responsibility
//! - Define the `Model` contract a record type implements to be stored by
//!   `CrudRepository`.
//! - Declare per-model capabilities (soft delete, ownership) explicitly
//!   instead of discovering them at runtime.
//! - Own the row metadata (`id`, tombstone, attribution) common to all
//!   models.
//!
//! # Invariants
//! - `EPOCH` (0) in `deleted_at` means "not deleted"; any other value is a
//!   tombstone timestamp in Unix epoch milliseconds.
//! - Ascending `id` is creation order.
//! - `Model::COLUMNS` lists data columns only; metadata columns are owned by
//!   the repository.

use crate::repo::crud_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod language;
pub mod location;
pub mod skill;
pub mod user;

/// Primary key of every persisted row.
pub type RowId = i64;

/// Ordered column-name to value mapping used for inputs and row snapshots.
pub type Fields = BTreeMap<String, Value>;

/// Tombstone sentinel meaning "not deleted".
pub const EPOCH: i64 = 0;

pub const ID_COLUMN: &str = "id";
pub const DELETED_AT_COLUMN: &str = "deleted_at";
pub const CREATED_BY_COLUMN: &str = "created_by_id";
pub const UPDATED_BY_COLUMN: &str = "updated_by_id";

/// Optional behaviors a model opts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Model has a `deleted_at` column and is tombstoned instead of removed.
    pub soft_delete: bool,
    /// Model has `created_by_id`/`updated_by_id` columns referencing users.
    pub ownership: bool,
}

impl Capabilities {
    pub const NONE: Self = Self::new(false, false);

    pub const fn new(soft_delete: bool, ownership: bool) -> Self {
        Self {
            soft_delete,
            ownership,
        }
    }
}

/// Row metadata managed by the repository rather than the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    /// `None` until the row has been inserted.
    pub id: Option<RowId>,
    /// Epoch milliseconds of the soft delete, or `EPOCH`.
    pub deleted_at: i64,
    pub created_by_id: Option<RowId>,
    pub updated_by_id: Option<RowId>,
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self {
            id: None,
            deleted_at: EPOCH,
            created_by_id: None,
            updated_by_id: None,
        }
    }
}

impl RecordMeta {
    /// Tombstones the row at the current time.
    ///
    /// Already-deleted rows keep their original timestamp.
    pub fn soft_delete(&mut self) {
        if !self.is_deleted() {
            self.deleted_at = now_epoch_ms();
        }
    }

    /// Clears the tombstone.
    pub fn restore(&mut self) {
        self.deleted_at = EPOCH;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at != EPOCH
    }
}

/// Contract for a record type persisted by `CrudRepository`.
///
/// Implementations map between their typed fields and a `Fields` mapping
/// with explicit per-field setters.
pub trait Model: Sized {
    /// Backing table name.
    const TABLE: &'static str;
    /// Data columns, in insert order.
    const COLUMNS: &'static [&'static str];
    const CAPABILITIES: Capabilities;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Builds a record from metadata plus data-column values.
    ///
    /// Keys that are not data columns are ignored.
    fn from_fields(meta: RecordMeta, fields: &Fields) -> RepoResult<Self>;

    /// Snapshot of the data columns.
    fn to_fields(&self) -> Fields;

    /// Assigns one data column.
    ///
    /// # Errors
    /// - `RepoError::UnknownField` when `column` is not a data column.
    /// - `RepoError::InvalidData` when `value` has the wrong type.
    fn set_field(&mut self, column: &str, value: Value) -> RepoResult<()>;

    fn id(&self) -> Option<RowId> {
        self.meta().id
    }
}

/// Returns every column the repository selects for `M`, metadata first.
pub fn select_columns<M: Model>() -> Vec<&'static str> {
    let mut columns = vec![ID_COLUMN];
    if M::CAPABILITIES.soft_delete {
        columns.push(DELETED_AT_COLUMN);
    }
    if M::CAPABILITIES.ownership {
        columns.push(CREATED_BY_COLUMN);
        columns.push(UPDATED_BY_COLUMN);
    }
    columns.extend_from_slice(M::COLUMNS);
    columns
}

/// Resolves a caller-supplied column name to the static name known for `M`.
///
/// Only names returned by `select_columns::<M>()` are accepted, so query SQL
/// never embeds caller text.
pub fn resolve_column<M: Model>(name: &str) -> RepoResult<&'static str> {
    select_columns::<M>()
        .into_iter()
        .find(|column| *column == name)
        .ok_or_else(|| RepoError::UnknownField {
            table: M::TABLE,
            field: name.to_string(),
        })
}

/// Builds a `Fields` mapping from name/value pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Reads a required text column from `fields`.
pub fn required_text(table: &'static str, fields: &Fields, column: &str) -> RepoResult<String> {
    match fields.get(column) {
        Some(value) => into_text(table, column, value.clone()),
        None => Err(RepoError::InvalidData(format!(
            "missing required field `{column}` for `{table}`"
        ))),
    }
}

/// Reads a nullable text column from `fields`; absent keys read as `None`.
pub fn optional_text(
    table: &'static str,
    fields: &Fields,
    column: &str,
) -> RepoResult<Option<String>> {
    match fields.get(column) {
        Some(value) => into_optional_text(table, column, value.clone()),
        None => Ok(None),
    }
}

pub fn into_text(table: &'static str, column: &str, value: Value) -> RepoResult<String> {
    match value {
        Value::Text(text) => Ok(text),
        other => Err(RepoError::InvalidData(format!(
            "expected text for `{table}.{column}`, got {:?}",
            other.data_type()
        ))),
    }
}

pub fn into_optional_text(
    table: &'static str,
    column: &str,
    value: Value,
) -> RepoResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        other => into_text(table, column, other).map(Some),
    }
}

pub(crate) fn unknown_field(table: &'static str, column: &str) -> RepoError {
    RepoError::UnknownField {
        table,
        field: column.to_string(),
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    // A clock at or before 1970 must still produce a tombstone.
    i64::try_from(millis).unwrap_or(i64::MAX).max(EPOCH + 1)
}

#[cfg(test)]
mod tests {
    use super::{fields, optional_text, required_text, RecordMeta, EPOCH};
    use rusqlite::types::Value;

    #[test]
    fn soft_delete_sets_non_sentinel_timestamp_once() {
        let mut meta = RecordMeta::default();
        assert!(!meta.is_deleted());

        meta.soft_delete();
        let first = meta.deleted_at;
        assert_ne!(first, EPOCH);

        meta.soft_delete();
        assert_eq!(meta.deleted_at, first);

        meta.restore();
        assert!(!meta.is_deleted());
    }

    #[test]
    fn text_helpers_distinguish_missing_null_and_wrong_type() {
        let input = fields([
            ("name", Value::Text("rust".to_string())),
            ("note", Value::Null),
            ("count", Value::Integer(3)),
        ]);

        assert_eq!(required_text("t", &input, "name").unwrap(), "rust");
        assert_eq!(optional_text("t", &input, "note").unwrap(), None);
        assert_eq!(optional_text("t", &input, "absent").unwrap(), None);
        assert!(required_text("t", &input, "absent").is_err());
        assert!(required_text("t", &input, "count").is_err());
    }
}

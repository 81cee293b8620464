//! User identity model.
//!
//! # Responsibility
//! - Identify who created or last updated owned rows.
//! - Carry a stable external `uid` independent of the storage row id.
//!
//! # Invariants
//! - `uid` is generated once and never reused for another user.
//! - Users are soft-deleted so attribution references stay resolvable.

use crate::model::{
    into_optional_text, into_text, optional_text, required_text, unknown_field, Capabilities,
    Fields, Model, RecordMeta,
};
use crate::repo::crud_repo::RepoResult;
use crate::schema::Schema;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub meta: RecordMeta,
    pub uid: String,
    pub name: String,
    pub email: Option<String>,
}

impl Model for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["uid", "name", "email"];
    const CAPABILITIES: Capabilities = Capabilities::new(true, false);

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn from_fields(meta: RecordMeta, fields: &Fields) -> RepoResult<Self> {
        Ok(Self {
            meta,
            uid: required_text(Self::TABLE, fields, "uid")?,
            name: required_text(Self::TABLE, fields, "name")?,
            email: optional_text(Self::TABLE, fields, "email")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::from([
            ("uid".to_string(), Value::Text(self.uid.clone())),
            ("name".to_string(), Value::Text(self.name.clone())),
            ("email".to_string(), self.email.clone().into()),
        ])
    }

    fn set_field(&mut self, column: &str, value: Value) -> RepoResult<()> {
        match column {
            "uid" => self.uid = into_text(Self::TABLE, column, value)?,
            "name" => self.name = into_text(Self::TABLE, column, value)?,
            "email" => self.email = into_optional_text(Self::TABLE, column, value)?,
            other => return Err(unknown_field(Self::TABLE, other)),
        }
        Ok(())
    }
}

/// Input for registering a user. A fresh `uid` is assigned on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub uid: String,
    pub name: String,
    pub email: Option<String>,
}

impl UserCreate {
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            name: name.into(),
            email,
        }
    }
}

impl Schema for UserCreate {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
}

impl Schema for UserUpdate {}

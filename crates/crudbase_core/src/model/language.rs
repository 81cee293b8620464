//! Language catalog model.
//!
//! Languages carry no tombstone or attribution columns; deleting one removes
//! the row.

use crate::model::{
    into_optional_text, into_text, optional_text, required_text, unknown_field, Capabilities,
    Fields, Model, RecordMeta,
};
use crate::repo::crud_repo::RepoResult;
use crate::schema::Schema;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub meta: RecordMeta,
    pub name: String,
    /// ISO 639 code when known.
    pub code: Option<String>,
}

impl Model for Language {
    const TABLE: &'static str = "languages";
    const COLUMNS: &'static [&'static str] = &["name", "code"];
    const CAPABILITIES: Capabilities = Capabilities::NONE;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn from_fields(meta: RecordMeta, fields: &Fields) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: required_text(Self::TABLE, fields, "name")?,
            code: optional_text(Self::TABLE, fields, "code")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::from([
            ("name".to_string(), Value::Text(self.name.clone())),
            ("code".to_string(), self.code.clone().into()),
        ])
    }

    fn set_field(&mut self, column: &str, value: Value) -> RepoResult<()> {
        match column {
            "name" => self.name = into_text(Self::TABLE, column, value)?,
            "code" => self.code = into_optional_text(Self::TABLE, column, value)?,
            other => return Err(unknown_field(Self::TABLE, other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCreate {
    pub name: String,
    pub code: Option<String>,
}

impl Schema for LanguageCreate {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Option<String>>,
}

impl Schema for LanguageUpdate {}

//! Skill catalog model.
//!
//! Skills are shared catalog rows that users create on the fly, so they are
//! both soft-deletable and attributed to their creator.

use crate::model::{
    into_optional_text, into_text, optional_text, required_text, unknown_field, Capabilities,
    Fields, Model, RecordMeta,
};
use crate::repo::crud_repo::RepoResult;
use crate::schema::Schema;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub meta: RecordMeta,
    pub name: String,
    pub description: Option<String>,
}

impl Skill {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::default(),
            name: name.into(),
            description: None,
        }
    }
}

impl Model for Skill {
    const TABLE: &'static str = "skills";
    const COLUMNS: &'static [&'static str] = &["name", "description"];
    const CAPABILITIES: Capabilities = Capabilities::new(true, true);

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
            description: optional_text(Self::TABLE, fields, "description")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::from([
            ("name".to_string(), Value::Text(self.name.clone())),
            ("description".to_string(), self.description.clone().into()),
        ])
    }

    fn set_field(&mut self, column: &str, value: Value) -> RepoResult<()> {
        match column {
            "name" => self.name = into_text(Self::TABLE, column, value)?,
            "description" => self.description = into_optional_text(Self::TABLE, column, value)?,
            other => return Err(unknown_field(Self::TABLE, other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCreate {
    pub name: String,
    pub description: Option<String>,
}

impl Schema for SkillCreate {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl Schema for SkillUpdate {}

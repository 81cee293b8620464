//! Location model (city/state/country triple).

use crate::model::{
    into_optional_text, into_text, optional_text, required_text, unknown_field, Capabilities,
    Fields, Model, RecordMeta,
};
use crate::repo::crud_repo::RepoResult;
use crate::schema::Schema;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub meta: RecordMeta,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
}

impl Model for Location {
    const TABLE: &'static str = "locations";
    const COLUMNS: &'static [&'static str] = &["city", "state", "country"];
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
            city: optional_text(Self::TABLE, fields, "city")?,
            state: optional_text(Self::TABLE, fields, "state")?,
            country: required_text(Self::TABLE, fields, "country")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::from([
            ("city".to_string(), self.city.clone().into()),
            ("state".to_string(), self.state.clone().into()),
            ("country".to_string(), Value::Text(self.country.clone())),
        ])
    }

    fn set_field(&mut self, column: &str, value: Value) -> RepoResult<()> {
        match column {
            "city" => self.city = into_optional_text(Self::TABLE, column, value)?,
            "state" => self.state = into_optional_text(Self::TABLE, column, value)?,
            "country" => self.country = into_text(Self::TABLE, column, value)?,
            other => return Err(unknown_field(Self::TABLE, other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCreate {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
}

impl Schema for LocationCreate {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Schema for LocationUpdate {}

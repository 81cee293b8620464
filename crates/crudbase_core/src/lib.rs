//! Generic CRUD data access over SQLite.
//! Models declare their columns and capabilities; one repository type
//! serves all of them.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::language::{Language, LanguageCreate, LanguageUpdate};
pub use model::location::{Location, LocationCreate, LocationUpdate};
pub use model::skill::{Skill, SkillCreate, SkillUpdate};
pub use model::user::{User, UserCreate, UserUpdate};
pub use model::{fields, Capabilities, Fields, Model, RecordMeta, RowId, EPOCH};
pub use repo::crud_repo::{CrudRepository, RepoError, RepoResult, DEFAULT_LIMIT};
pub use repo::location_repo::LocationRepository;
pub use repo::query::{Direction, Query};
pub use repo::user_repo::UserRepository;
pub use repo::{LanguageRepository, SkillRepository};
pub use schema::{Input, Schema};

/// Health probe used by the CLI smoke binary.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

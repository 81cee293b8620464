//! Repository layer: generic CRUD plus per-model extensions.
//!
//! # Responsibility
//! - Keep SQL details inside the persistence boundary.
//! - Expose one generic `CrudRepository` that concrete models reuse
//!   without repeating query, insert, update or delete code.
//!
//! # Invariants
//! - Lookups report absence as `None`, not as an error.
//! - Soft-deleted rows never appear in list, count or paginated reads.

pub mod crud_repo;
pub mod location_repo;
pub mod query;
pub mod user_repo;

use crate::model::language::{Language, LanguageCreate, LanguageUpdate};
use crate::model::skill::{Skill, SkillCreate, SkillUpdate};
use crud_repo::CrudRepository;

pub type SkillRepository = CrudRepository<Skill, SkillCreate, SkillUpdate>;
pub type LanguageRepository = CrudRepository<Language, LanguageCreate, LanguageUpdate>;

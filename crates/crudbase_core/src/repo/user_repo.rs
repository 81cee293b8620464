//! User lookups beyond the generic CRUD surface.

use crate::model::user::{User, UserCreate, UserUpdate};
use crate::repo::crud_repo::{CrudRepository, RepoResult};
use rusqlite::Connection;

pub type UserRepository = CrudRepository<User, UserCreate, UserUpdate>;

impl CrudRepository<User, UserCreate, UserUpdate> {
    /// Live user with the given email, if any.
    pub fn get_by_email(&self, session: &Connection, email: &str) -> RepoResult<Option<User>> {
        let query = self.base_query().filter_eq("email", email.to_string())?;
        self.execute_one(session, &query)
    }

    /// Live user with the given external `uid`, if any.
    pub fn get_by_uid(&self, session: &Connection, uid: &str) -> RepoResult<Option<User>> {
        let query = self.base_query().filter_eq("uid", uid.to_string())?;
        self.execute_one(session, &query)
    }
}

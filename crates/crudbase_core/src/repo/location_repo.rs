//! Location search built on the generic repository.

use crate::model::location::{Location, LocationCreate, LocationUpdate};
use crate::repo::crud_repo::{CrudRepository, RepoResult};
use crate::repo::query::Query;

pub type LocationRepository = CrudRepository<Location, LocationCreate, LocationUpdate>;

impl CrudRepository<Location, LocationCreate, LocationUpdate> {
    /// Live locations matching each provided component.
    ///
    /// `None` and empty strings leave that component unconstrained.
    pub fn query_by_location(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> RepoResult<Query<Location>> {
        [("city", city), ("state", state), ("country", country)]
            .into_iter()
            .filter_map(|(column, value)| {
                value
                    .filter(|value| !value.is_empty())
                    .map(|value| (column, value))
            })
            .try_fold(self.base_query(), |query, (column, value)| {
                query.filter_eq(column, value.to_string())
            })
    }
}

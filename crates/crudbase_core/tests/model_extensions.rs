use crudbase_core::db::open_db_in_memory;
use crudbase_core::{
    Direction, Input, LocationCreate, LocationRepository, Model, UserCreate, UserRepository,
    UserUpdate,
};

#[test]
fn users_are_found_by_email_and_uid_while_live() {
    let conn = open_db_in_memory().unwrap();
    let repo = UserRepository::new();
    let create = UserCreate::new("Ada", Some("ada@example.com".to_string()));
    let uid = create.uid.clone();
    let ada = repo.create(&conn, &Input::Schema(create), None).unwrap();

    assert_eq!(
        repo.get_by_email(&conn, "ada@example.com").unwrap(),
        Some(ada.clone())
    );
    assert_eq!(repo.get_by_uid(&conn, &uid).unwrap(), Some(ada.clone()));

    repo.delete(&conn, ada.id().unwrap()).unwrap();
    assert!(repo.get_by_email(&conn, "ada@example.com").unwrap().is_none());
    assert!(repo.get_by_uid(&conn, &uid).unwrap().is_none());
}

#[test]
fn user_uids_are_unique_per_registration() {
    let first = UserCreate::new("a", None);
    let second = UserCreate::new("a", None);
    assert_ne!(first.uid, second.uid);
}

#[test]
fn user_update_clears_email_explicitly() {
    let conn = open_db_in_memory().unwrap();
    let repo = UserRepository::new();
    let user = repo
        .create(
            &conn,
            &Input::Schema(UserCreate::new("Grace", Some("g@example.com".to_string()))),
            None,
        )
        .unwrap();

    let updated = repo
        .update(
            &conn,
            user,
            &Input::Schema(UserUpdate {
                name: None,
                email: Some(None),
            }),
            None,
        )
        .unwrap();
    assert_eq!(updated.name, "Grace");
    assert_eq!(updated.email, None);
}

#[test]
fn location_query_applies_only_provided_components() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocationRepository::new();
    for (city, state, country) in [
        (Some("Austin"), Some("TX"), "US"),
        (Some("Dallas"), Some("TX"), "US"),
        (Some("Portland"), Some("OR"), "US"),
        (Some("Lyon"), None, "FR"),
    ] {
        repo.create(
            &conn,
            &Input::Schema(LocationCreate {
                city: city.map(str::to_string),
                state: state.map(str::to_string),
                country: country.to_string(),
            }),
            None,
        )
        .unwrap();
    }

    let texas = repo.query_by_location(None, Some("TX"), Some("US")).unwrap();
    assert_eq!(repo.count(&conn, &texas).unwrap(), 2);

    let everything = repo.query_by_location(None, Some(""), None).unwrap();
    assert_eq!(repo.count(&conn, &everything).unwrap(), 4);

    let newest_first = repo
        .query_by_location(None, None, Some("US"))
        .unwrap()
        .order_by("id", Direction::Desc)
        .unwrap();
    let cities: Vec<_> = repo
        .execute_all(&conn, &newest_first)
        .unwrap()
        .into_iter()
        .filter_map(|location| location.city)
        .collect();
    assert_eq!(cities, vec!["Portland", "Dallas", "Austin"]);
}

#[test]
fn location_query_excludes_soft_deleted_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocationRepository::new();
    let lyon = repo
        .create(
            &conn,
            &Input::Schema(LocationCreate {
                city: Some("Lyon".to_string()),
                state: None,
                country: "FR".to_string(),
            }),
            None,
        )
        .unwrap();
    repo.delete(&conn, lyon.id().unwrap()).unwrap();

    let france = repo.query_by_location(Some("Lyon"), None, Some("FR")).unwrap();
    assert!(repo.execute_all(&conn, &france).unwrap().is_empty());
    assert!(repo.get(&conn, lyon.id().unwrap()).unwrap().is_some());
}

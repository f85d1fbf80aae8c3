mod common;

use common::ensure_test_db;

#[test]
#[should_panic(expected = "DATABASE_URL is required for tests")]
fn test_missing_database_url_fails_loudly() {
    ensure_test_db(None);
}

#[test]
#[should_panic(expected = "*_test database")]
fn test_non_test_database_is_refused() {
    ensure_test_db(Some("postgres://auction:pw@localhost/auction".to_string()));
}

#[test]
fn test_test_database_is_accepted() {
    let url = "postgres://auction:pw@localhost/auction_test".to_string();
    assert_eq!(ensure_test_db(Some(url.clone())), url);
}

//! Tests for the file-backed credential store

use std::fs;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use gtask::infrastructure::auth::Token;
use gtask::infrastructure::credentials::FileCredentialStore;
use gtask::infrastructure::traits::CredentialStore;

fn sample_token() -> Token {
    Token {
        access_token: "ya29.access".to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expiry: Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()),
        scope: Some("https://www.googleapis.com/auth/tasks".to_string()),
    }
}

#[test]
fn given_no_file_when_loading_then_none() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::new(dir.path().join("token.json"));

    assert!(store.load().unwrap().is_none());
}

#[test]
fn given_saved_token_when_loading_then_same_token() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::new(dir.path().join("token.json"));

    // Act
    store.save(&sample_token()).unwrap();
    let loaded = store.load().unwrap();

    // Assert
    assert_eq!(loaded, Some(sample_token()));
}

#[test]
fn given_missing_parent_directory_when_saving_then_it_is_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("gtask").join("token.json");
    let store = FileCredentialStore::new(&path);

    store.save(&sample_token()).unwrap();

    assert!(path.exists());
}

#[test]
fn given_existing_token_when_saving_then_it_is_replaced() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::new(dir.path().join("token.json"));
    store.save(&sample_token()).unwrap();

    let newer = Token {
        access_token: "ya29.newer".to_string(),
        ..sample_token()
    };
    store.save(&newer).unwrap();

    assert_eq!(store.load().unwrap().unwrap().access_token, "ya29.newer");
}

#[cfg(unix)]
#[test]
fn given_saved_token_when_inspecting_file_then_only_owner_can_read() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    let store = FileCredentialStore::new(&path);

    store.save(&sample_token()).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn given_malformed_file_when_loading_then_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    fs::write(&path, "{ not json").unwrap();
    let store = FileCredentialStore::new(&path);

    assert!(store.load().unwrap().is_none());
}

#[test]
fn given_token_written_by_other_tools_when_loading_then_fields_are_read() {
    // Layout of tokens cached by Go's oauth2 package
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    fs::write(
        &path,
        r#"{"access_token":"abc","token_type":"Bearer","refresh_token":"def","expiry":"2030-01-02T03:04:05.123456+01:00"}"#,
    )
    .unwrap();
    let store = FileCredentialStore::new(&path);

    let token = store.load().unwrap().unwrap();

    assert_eq!(token.access_token, "abc");
    assert_eq!(token.refresh_token.as_deref(), Some("def"));
    assert!(token.expiry.is_some());
    assert_eq!(token.scope, None);
}

#[test]
fn given_store_when_asking_location_then_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    let store = FileCredentialStore::new(&path);

    assert_eq!(store.location(), path.display().to_string());
}

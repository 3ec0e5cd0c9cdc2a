//! Integration tests for configuration files.

use irontrack::records::GearPolicy;
use irontrack::storage::config::{load_config_from, save_config_to, AppConfig};
use irontrack::storage::Database;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.storage.database_path = Some(PathBuf::from("/srv/irontrack/train.db"));
    config.gear.policy = GearPolicy::Required;
    config.display.recent_limit = 25;
    config.logging.level = "irontrack=debug".to_string();

    save_config_to(&config, &path).unwrap();
    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[display]\nrecent_limit = \"many\"\n").unwrap();
    assert!(load_config_from(&path).is_err());
}

#[test]
fn test_config_drives_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[storage]\ndatabase_path = {:?}\n\n[gear]\npolicy = \"required\"\n",
            dir.path().join("train.db")
        ),
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    let db = Database::open(&config.database_path())
        .unwrap()
        .with_gear_policy(config.gear.policy);

    assert_eq!(db.gear_policy(), GearPolicy::Required);
    assert!(dir.path().join("train.db").exists());
}

//! Exercises `ProjectConfig` against a realistic on-disk project layout:
//! loading an overridden config file, deriving the api/suite/testcase/env
//! paths from it, and feeding documents discovered under those paths into
//! the Definition Store — the shape the CLI's own loading step relies on.

use apirun_core::definitions::DefinitionStore;
use apirun_config::ProjectConfig;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn project_config_directs_a_full_discovery_and_registration_pass() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("apirun.yml"),
        "working_dir: .\napi_dir: definitions/api\nsuite_dir: definitions/suite\n",
    );
    write(
        &dir.path().join("definitions/api/login.yml"),
        "- api:\n    def: api_login(username,password)\n    request:\n      method: POST\n      url: /login\n",
    );
    write(
        &dir.path().join("definitions/suite/smoke.yml"),
        "- config:\n    def: smoke_suite()\n- test:\n    name: sign in\n    api: api_login($u,$p)\n",
    );

    let mut config = ProjectConfig::load(dir.path().join("apirun.yml")).unwrap();
    config.working_dir = dir.path().to_path_buf();

    assert_eq!(config.api_path(), dir.path().join("definitions/api"));
    assert_eq!(config.suite_path(), dir.path().join("definitions/suite"));
    assert_eq!(config.testcase_path(), dir.path().join("testcases"), "unset fields still fall back to defaults");

    let mut store = DefinitionStore::new();
    for entry in fs::read_dir(config.api_path()).unwrap() {
        let path = entry.unwrap().path();
        let raw = fs::read_to_string(&path).unwrap();
        let value: Value = serde_yaml::from_str(&raw).unwrap();
        for item in value.as_array().unwrap() {
            let block = item.get("api").unwrap().as_object().unwrap().clone();
            let def = block.get("def").unwrap().as_str().unwrap().to_string();
            store.insert_api(&def, block).unwrap();
        }
    }
    assert!(store.get_api("api_login").is_ok());
}

#[test]
fn missing_config_file_load_surfaces_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProjectConfig::load(dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, apirun_config::ConfigError::Read { .. }));
}

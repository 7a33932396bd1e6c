// tests/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use dayplan::config::load_and_validate;
use dayplan::errors::PlannerError;
use dayplan_test_utils::builders::ConfigFileBuilder;

#[test]
fn out_of_range_budget_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[planner]
daily_minutes = 2000
"#
    )
    .unwrap();

    let err = load_and_validate(file.path()).unwrap_err();
    match err {
        PlannerError::ConfigError(msg) => assert!(msg.contains("daily_minutes")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[planner\ndaily_minutes = 60").unwrap();

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, PlannerError::TomlDe(_)));
}

#[test]
fn builder_config_maps_to_planner_settings() {
    let cfg = ConfigFileBuilder::new()
        .daily_minutes(300)
        .horizon_days(14)
        .store_path("plan.toml")
        .build();

    let settings = cfg.planner_settings();
    assert_eq!(settings.daily_minutes, 300);
    assert_eq!(settings.horizon_days, 14);
    assert_eq!(cfg.store.path.to_str(), Some("plan.toml"));
}

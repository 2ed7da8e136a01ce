//! Tests for configuration module.

use super::*;

#[test_log::test]
fn test_search_config_defaults() {
    tracing::debug!("Testing search config defaults");

    let search = SearchConfig::default();
    assert_eq!(search.window_days, 1825);
    assert_eq!(search.window_multiple, 4);
    assert!(search.validate().is_ok());
}

#[test]
fn test_search_config_rejects_empty_window() {
    let search = SearchConfig {
        window_days: 0,
        window_multiple: 3,
    };

    let err = search.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigError(_)));
}

#[test]
fn test_search_config_rejects_zero_multiple() {
    let search = SearchConfig {
        window_days: 30,
        window_multiple: 0,
    };

    assert!(search.validate().is_err());
}

#[test]
fn test_calendar_config_default_prodid() {
    let calendar = CalendarConfig::default();
    assert_eq!(calendar.prodid, "-//cadence//NONSGML v1.0//EN");
    assert_eq!(calendar.default_timezone, "UTC");
}

#[test]
fn test_settings_deserialize_from_toml_source() {
    let settings = Config::builder()
        .add_source(config::File::from_str(
            r#"
            [search]
            window_days = 30
            window_multiple = 2

            [calendar]
            prodid = "-//example//EN"
            default_timezone = "Europe/Berlin"

            [logging]
            level = "trace"
            "#,
            config::FileFormat::Toml,
        ))
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap();

    assert_eq!(settings.search.window_days, 30);
    assert_eq!(settings.search.window_multiple, 2);
    assert_eq!(settings.calendar.prodid, "-//example//EN");
    assert_eq!(settings.calendar.default_timezone, "Europe/Berlin");
    assert_eq!(settings.logging.level, "trace");
}

#[test_log::test]
fn test_environment_overrides_config_file() {
    let file = config::File::from_str(
        r#"
        [search]
        window_days = 30
        window_multiple = 2

        [logging]
        level = "trace"
        "#,
        config::FileFormat::Toml,
    );
    let vars = config::Map::from([
        ("CADENCE_SEARCH__WINDOW_DAYS".to_owned(), "90".to_owned()),
        ("CADENCE_LOGGING__LEVEL".to_owned(), "warn".to_owned()),
    ]);

    let settings = Settings::load_from(file, environment().source(Some(vars))).unwrap();

    assert_eq!(settings.search.window_days, 90);
    assert_eq!(settings.search.window_multiple, 2);
    assert_eq!(settings.logging.level, "warn");
    assert_eq!(settings.calendar.default_timezone, "UTC");
}

#[test]
fn test_environment_zero_window_rejected() {
    let vars = config::Map::from([("CADENCE_SEARCH__WINDOW_MULTIPLE".to_owned(), "0".to_owned())]);
    let file = config::File::from_str("", config::FileFormat::Toml);

    assert!(Settings::load_from(file, environment().source(Some(vars))).is_err());
}

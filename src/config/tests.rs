use super::loading::parse_config;
use super::validation::validate_config;
use super::*;
use crate::constants::test_constants::*;
use crate::constants::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn create_test_config(duration_minutes: u32, on_percent: u32, min: u32, max: u32) -> Config {
    Config {
        use_sunset: false,
        duration_minutes,
        on_percent,
        min_sequences: min,
        max_sequences: max,
        max_jitter_minutes: TEST_STANDARD_JITTER,
        ..Config::default()
    }
}

fn with_config_home<T>(dir: &std::path::Path, f: impl FnOnce() -> T) -> T {
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", dir);
    }

    let result = f();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
    result
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("plugtimer").join("plugtimer.toml");

    let result = with_config_home(temp_dir.path(), Config::load);

    if let Err(e) = &result {
        eprintln!("Config::load() failed: {:?}", e);
    }
    assert_eq!(result.unwrap(), Config::default());
    assert!(config_path.exists());
}

#[test]
#[serial]
fn test_config_load_existing_file() {
    let temp_dir = tempdir().unwrap();
    let dir = temp_dir.path().join("plugtimer");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("plugtimer.toml"),
        "use_sunset = false\nstart_hour = 20\n\n[[outlets]]\nname = \"hall\"\naddress = \"10.0.0.9\"\n",
    )
    .unwrap();

    let config = with_config_home(temp_dir.path(), Config::load).unwrap();
    assert!(!config.use_sunset);
    assert_eq!(config.start_hour, 20);
    assert_eq!(config.outlets.len(), 1);
    assert_eq!(config.outlets[0].name, "hall");
}

#[test]
fn test_default_config_file_roundtrips_through_loader() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("plugtimer.toml");

    create_default_config(&path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("#[Schedule]"));
    assert!(content.contains("#[Location]"));
    assert!(content.contains("#[Devices]"));

    assert_eq!(load_from_path(&path).unwrap(), Config::default());
}

#[test]
fn test_save_preserves_outlets_and_strings() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("plugtimer.toml");
    let config = Config {
        transport: Transport::Tasmota,
        ntp_server: String::new(),
        dst_region: "NA".into(),
        utc_offset_hours: -5,
        latitude: TEST_NEW_YORK_LATITUDE,
        longitude: TEST_NEW_YORK_LONGITUDE,
        outlets: vec![
            OutletConfig {
                name: "porch \"front\"".into(),
                address: "10.0.0.2".into(),
                child_id: Some("8006ABC01".into()),
                inverted: true,
            },
            OutletConfig::default(),
        ],
        ..Config::default()
    };

    save_to_path(&config, &path).unwrap();
    assert_eq!(load_from_path(&path).unwrap(), config);
}

#[test]
fn test_parse_missing_keys_use_defaults() {
    let config = parse_config("on_percent = 50\n").unwrap();
    assert_eq!(config.on_percent, 50);
    assert_eq!(config.duration_minutes, DEFAULT_DURATION_MINUTES);
    assert_eq!(config.outlets, vec![OutletConfig::default()]);
}

#[test]
fn test_parse_rejects_invalid_toml_and_values() {
    assert!(parse_config("on_percent = ").is_err());
    assert!(parse_config("transport = \"zigbee\"").is_err());
    let err = parse_config("on_percent = 100").unwrap_err();
    assert!(format!("{err:#}").contains("on_percent"));
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&Config::default()).is_ok());
    assert!(validate_config(&create_test_config(60, 80, 1, 3)).is_ok());
}

#[test]
fn test_config_validation_ranges() {
    let cases = [
        create_test_config(0, 80, 1, 1),
        create_test_config(721, 80, 1, 1),
        create_test_config(60, 0, 1, 1),
        create_test_config(60, 100, 1, 1),
        create_test_config(60, 80, 0, 1),
        create_test_config(60, 80, 1, 11),
    ];
    for config in cases {
        assert!(
            matches!(validate_config(&config), Err(ConfigError::OutOfRange { .. })),
            "{config:?} should be out of range"
        );
    }
}

#[test]
fn test_config_validation_sequence_order() {
    assert_eq!(
        validate_config(&create_test_config(60, 80, 4, 2)),
        Err(ConfigError::SequenceOrder { min: 4, max: 2 })
    );
}

#[test]
fn test_config_validation_location_and_region() {
    let bad_lat = Config {
        latitude: 91.0,
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&bad_lat),
        Err(ConfigError::OutOfRange { field: "latitude", .. })
    ));

    let nan_lon = Config {
        longitude: f64::NAN,
        ..Config::default()
    };
    assert!(validate_config(&nan_lon).is_err());

    let bad_region = Config {
        dst_region: "AU".into(),
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&bad_region),
        Err(ConfigError::UnsupportedRegion(_))
    ));
}

#[test]
fn test_config_validation_outlets() {
    let none = Config {
        outlets: Vec::new(),
        ..Config::default()
    };
    assert_eq!(validate_config(&none), Err(ConfigError::NoOutlets));

    let blank = Config {
        outlets: vec![OutletConfig {
            address: "  ".into(),
            ..OutletConfig::default()
        }],
        ..Config::default()
    };
    assert!(validate_config(&blank).is_err());
}

#[test]
fn test_with_updates_applies_and_validates() {
    let config = Config::default();
    let updated = config
        .with_updates(&[("on_percent", "60"), ("use_sunset", "off"), ("transport", "tasmota")])
        .unwrap();
    assert_eq!(updated.on_percent, 60);
    assert!(!updated.use_sunset);
    assert_eq!(updated.transport, Transport::Tasmota);
    // Original untouched
    assert_eq!(config, Config::default());
}

#[test]
fn test_with_updates_rejects_non_numeric() {
    let err = Config::default()
        .with_updates(&[("duration_minutes", "an hour")])
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidValue {
            field: "duration_minutes".into(),
            value: "an hour".into(),
        }
    );
}

#[test]
fn test_with_updates_rejects_unknown_field() {
    let err = Config::default().with_updates(&[("colour", "red")]).unwrap_err();
    assert_eq!(err, ConfigError::UnknownField("colour".into()));
}

#[test]
fn test_with_updates_validates_combination() {
    let err = Config::default()
        .with_updates(&[("min_sequences", "5"), ("max_sequences", "4")])
        .unwrap_err();
    assert_eq!(err, ConfigError::SequenceOrder { min: 5, max: 4 });
}

#[test]
fn test_with_updates_same_values_is_equal() {
    let config = Config::default();
    let same = config
        .with_updates(&[("on_percent", &config.on_percent.to_string())])
        .unwrap();
    assert_eq!(same, config);
}

#[test]
fn test_every_updatable_field_is_accepted() {
    let config = Config::default();
    for field in UPDATABLE_FIELDS {
        let value = match *field {
            "use_sunset" => "true".to_string(),
            "dst_region" => "EU".to_string(),
            "ntp_server" => "time.example.org".to_string(),
            "transport" => "kasa".to_string(),
            "latitude" => "51.5".to_string(),
            "longitude" => "-0.126".to_string(),
            "utc_offset_hours" => "0".to_string(),
            "min_sequences" | "max_sequences" => "2".to_string(),
            _ => "5".to_string(),
        };
        assert!(
            config.with_updates(&[(*field, value.as_str())]).is_ok(),
            "{field} rejected"
        );
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: values inside the documented ranges always validate
        #[test]
        fn prop_in_range_values_validate(
            duration in MINIMUM_DURATION_MINUTES..=MAXIMUM_DURATION_MINUTES,
            on_percent in MINIMUM_ON_PERCENT..=MAXIMUM_ON_PERCENT,
            jitter in MINIMUM_JITTER_MINUTES..=MAXIMUM_JITTER_MINUTES,
            (min, max) in (MINIMUM_SEQUENCES..=MAXIMUM_SEQUENCES)
                .prop_flat_map(|min| (Just(min), min..=MAXIMUM_SEQUENCES)),
            latitude in MINIMUM_LATITUDE..=MAXIMUM_LATITUDE,
            longitude in MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE,
        ) {
            let config = Config {
                duration_minutes: duration,
                on_percent,
                max_jitter_minutes: jitter,
                min_sequences: min,
                max_sequences: max,
                latitude,
                longitude,
                ..Config::default()
            };
            prop_assert!(validate_config(&config).is_ok());
        }

        /// Property: on_percent outside 1..=99 is always rejected
        #[test]
        fn prop_on_percent_out_of_range_rejected(on_percent in prop_oneof![Just(0u32), 100u32..1000]) {
            let config = Config { on_percent, ..Config::default() };
            prop_assert!(validate_config(&config).is_err());
        }
    }
}

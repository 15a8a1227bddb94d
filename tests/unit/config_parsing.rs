//! Unit tests for TOML configuration parsing.

use servo_motion::config::units::{Degrees, PulseWidth, Seconds, ServoId};
use servo_motion::config::{parse_config, ConfigUpdate, HoldMode, ServoConfig, SystemConfig};
use servo_motion::error::{ConfigError, Error};

/// Test parsing a complete configuration.
#[test]
fn test_parse_full_config() {
    let toml_str = r#"
[servo]
detach_enabled = true
hold_time = 0.5
min_pulse_width = 0.0006
max_pulse_width = 0.0024
hold_mode = "auto"
smooth_enabled = true
smooth_steps = 12
smooth_delay = 0.03

[[channels]]
id = 1
pin = 13
name = "base"

[[channels]]
id = 2
pin = 18
name = "shoulder"
initial_angle = 45.0
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");

    assert_eq!(config.servo.hold_time, Seconds(0.5));
    assert_eq!(config.servo.min_pulse_width, PulseWidth(0.0006));
    assert_eq!(config.servo.max_pulse_width, PulseWidth(0.0024));
    assert!(config.servo.smooth_enabled);
    assert_eq!(config.servo.smooth_steps, 12);
    assert_eq!(config.servo.smooth_delay, Seconds(0.03));

    assert_eq!(config.channels.len(), 2);
    let shoulder = config.channel(ServoId(2)).unwrap();
    assert_eq!(shoulder.pin, 18);
    assert_eq!(shoulder.name.as_str(), "shoulder");
    assert_eq!(shoulder.initial_angle, Degrees(45.0));
}

/// Test that missing keys take their defaults.
#[test]
fn test_parse_defaults() {
    let toml_str = r#"
[[channels]]
id = 7
pin = 26
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");
    assert_eq!(config.servo, ServoConfig::default());

    let channel = &config.channels[0];
    assert_eq!(channel.initial_angle, Degrees::CENTER);
    assert!(channel.name.is_empty());
}

/// Test parsing each hold mode.
#[test]
fn test_parse_hold_modes() {
    for (text, mode) in [
        ("auto", HoldMode::Auto),
        ("hold", HoldMode::Hold),
        ("release", HoldMode::Release),
    ] {
        let toml_str = format!("[servo]\nhold_mode = \"{}\"\n", text);
        let config = parse_config(&toml_str).expect("Failed to parse TOML");
        assert_eq!(config.servo.hold_mode, mode);
    }
}

/// Test that an unknown hold mode is a parse error.
#[test]
fn test_parse_unknown_hold_mode() {
    let result = parse_config("[servo]\nhold_mode = \"sometimes\"\n");
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test that malformed TOML is a parse error.
#[test]
fn test_parse_malformed() {
    let result = parse_config("[servo\nhold_time = ");
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test that parsed values are validated.
#[test]
fn test_parse_validates() {
    let result = parse_config("[servo]\nhold_time = 30.0\n");
    assert_eq!(
        result,
        Err(Error::Config(ConfigError::HoldTimeOutOfRange(30.0)))
    );
}

/// Test more than sixteen channels is rejected.
#[test]
fn test_parse_too_many_channels() {
    let mut toml_str = String::new();
    for i in 0..17 {
        toml_str.push_str(&format!("[[channels]]\nid = {}\npin = {}\n", i, i));
    }
    assert!(parse_config(&toml_str).is_err());
}

/// Test a partial update only carries the keys it names.
#[test]
fn test_parse_config_update() {
    let update: ConfigUpdate =
        toml::from_str("hold_time = 2.0\nhold_mode = \"hold\"\n").expect("Failed to parse TOML");

    assert_eq!(update.hold_time, Some(Seconds(2.0)));
    assert_eq!(update.hold_mode, Some(HoldMode::Hold));
    assert_eq!(update.detach_enabled, None);
    assert!(!update.is_empty());
}

/// Test unknown keys in a partial update are rejected.
#[test]
fn test_parse_config_update_unknown_key() {
    let result: Result<ConfigUpdate, _> = toml::from_str("hold_tim = 2.0\n");
    assert!(result.is_err());
}

/// Test rendering and re-reading a configuration.
#[test]
fn test_toml_round_trip() {
    let config = parse_config(
        r#"
[servo]
hold_mode = "release"

[[channels]]
id = 3
pin = 19
name = "wrist"
"#,
    )
    .unwrap();

    let rendered = servo_motion::config::to_toml_string(&config).unwrap();
    let reparsed: SystemConfig = parse_config(&rendered).unwrap();
    assert_eq!(reparsed, config);
}

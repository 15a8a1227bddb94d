//! Unit tests for configuration validation.

use servo_motion::config::units::{Degrees, PulseWidth, Seconds};
use servo_motion::config::{
    validate_config, validate_servo_config, ChannelConfig, ConfigUpdate, ServoConfig,
    SystemConfig,
};
use servo_motion::error::{ConfigError, Error, ErrorKind};

fn system(channels: &[ChannelConfig]) -> SystemConfig {
    let mut config = SystemConfig::default();
    for channel in channels {
        config.channels.push(channel.clone()).unwrap();
    }
    config
}

/// Test the defaults are valid.
#[test]
fn test_default_config_is_valid() {
    assert!(validate_servo_config(&ServoConfig::default()).is_ok());
}

/// Test bounds are inclusive.
#[test]
fn test_bounds_inclusive() {
    let config = ServoConfig {
        hold_time: Seconds(0.1),
        min_pulse_width: PulseWidth(0.0001),
        max_pulse_width: PulseWidth(0.003),
        smooth_steps: 50,
        smooth_delay: Seconds(0.2),
        ..Default::default()
    };
    assert!(validate_servo_config(&config).is_ok());

    let config = ServoConfig {
        hold_time: Seconds(10.0),
        smooth_steps: 3,
        smooth_delay: Seconds(0.01),
        ..Default::default()
    };
    assert!(validate_servo_config(&config).is_ok());
}

/// Test hold time bounds.
#[test]
fn test_hold_time_out_of_range() {
    for value in [0.05, 10.5, f32::NAN] {
        let config = ServoConfig {
            hold_time: Seconds(value),
            ..Default::default()
        };
        let result = validate_servo_config(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::HoldTimeOutOfRange(_)))
        ));
    }
}

/// Test pulse width bounds.
#[test]
fn test_pulse_width_out_of_range() {
    let config = ServoConfig {
        min_pulse_width: PulseWidth(0.00005),
        ..Default::default()
    };
    assert!(matches!(
        validate_servo_config(&config),
        Err(Error::Config(ConfigError::MinPulseWidthOutOfRange(_)))
    ));

    let config = ServoConfig {
        max_pulse_width: PulseWidth(0.0035),
        ..Default::default()
    };
    assert!(matches!(
        validate_servo_config(&config),
        Err(Error::Config(ConfigError::MaxPulseWidthOutOfRange(_)))
    ));
}

/// Test min pulse must be strictly below max pulse.
#[test]
fn test_pulse_width_order() {
    let config = ServoConfig {
        min_pulse_width: PulseWidth(0.002),
        max_pulse_width: PulseWidth(0.002),
        ..Default::default()
    };
    assert!(matches!(
        validate_servo_config(&config),
        Err(Error::Config(ConfigError::PulseWidthOrder { .. }))
    ));
}

/// Test smoothing bounds.
#[test]
fn test_smoothing_out_of_range() {
    let config = ServoConfig {
        smooth_steps: 51,
        ..Default::default()
    };
    assert_eq!(
        validate_servo_config(&config),
        Err(Error::Config(ConfigError::SmoothStepsOutOfRange(51)))
    );

    let config = ServoConfig {
        smooth_delay: Seconds(0.005),
        ..Default::default()
    };
    assert!(matches!(
        validate_servo_config(&config),
        Err(Error::Config(ConfigError::SmoothDelayOutOfRange(_)))
    ));
}

/// Test a rejected update leaves the original untouched.
#[test]
fn test_merged_update_is_atomic() {
    let current = ServoConfig::default();
    let update = ConfigUpdate {
        detach_enabled: Some(false),
        hold_time: Some(Seconds(99.0)),
        ..Default::default()
    };

    let result = current.merged(&update);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidConfig);
    assert!(current.detach_enabled);
}

/// Test a valid update is applied field by field.
#[test]
fn test_merged_update() {
    let update = ConfigUpdate {
        smooth_enabled: Some(true),
        smooth_steps: Some(5),
        ..Default::default()
    };

    let merged = ServoConfig::default().merged(&update).unwrap();
    assert!(merged.smooth_enabled);
    assert_eq!(merged.smooth_steps, 5);
    assert_eq!(merged.hold_time, Seconds(1.0));
}

/// Test duplicate ids and pins are rejected.
#[test]
fn test_duplicate_channels() {
    let config = system(&[ChannelConfig::new(1, 13), ChannelConfig::new(1, 18)]);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicateServoId(_)))
    ));

    let config = system(&[ChannelConfig::new(1, 13), ChannelConfig::new(2, 13)]);
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicatePin(13)))
    );
}

/// Test initial angles must be commandable.
#[test]
fn test_invalid_initial_angle() {
    let config = system(&[ChannelConfig::new(4, 26).with_initial_angle(Degrees(200.0))]);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidInitialAngle { angle, .. })) if angle == 200.0
    ));
}

/// Test a valid four-servo layout.
#[test]
fn test_valid_system() {
    let config = system(&[
        ChannelConfig::new(1, 13).with_name("base"),
        ChannelConfig::new(2, 18).with_name("shoulder"),
        ChannelConfig::new(3, 19).with_name("elbow"),
        ChannelConfig::new(4, 26).with_name("gripper"),
    ]);
    assert!(validate_config(&config).is_ok());
}

//! Example: Interactive servo console.
//!
//! This example demonstrates how to:
//! - Load servo and channel configuration from TOML
//! - Build a ServoRegistry with one PWM output per channel
//! - Move, hold and release servos and watch them auto-detach
//! - Change settings live and save them back to disk
//!
//! Outputs are in-memory recorders, so no hardware is needed.
//!
//! Run with: `cargo run --example console -- [config.toml]`
//! Set `RUST_LOG=debug` to see every step written.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::thread;

use tracing_subscriber::EnvFilter;

use servo_motion::{
    config::{load_config, parse_config, save_config, ConfigUpdate, SystemConfig},
    error::{Error, Result, ServoError},
    servo::{BatchReport, PwmWrite, RecordingPwm, ServoRegistry},
    ServoId,
};

const DEFAULT_CONFIG: &str = include_str!("servos.toml");

const HELP: &str = "\
commands:
  move <id> <angle>     move one servo (0-180), also `<id> <angle>`
  all <angle>           move every servo
  center [id]           move to 90 degrees
  hold [id]             keep the signal on
  release [id]          cut the signal now
  status [id]           show servo status, `list` for all
  config                show active settings
  set <key> <value>     change a setting, e.g. `set hold_mode \"hold\"`
  save <path>           write settings and channels to a TOML file
  log <id>              show PWM commands sent to a servo
  help                  show this text
  quit                  exit";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let system = match std::env::args().nth(1) {
        Some(path) => load_config(path)?,
        None => parse_config(DEFAULT_CONFIG)?,
    };

    let mut outputs = BTreeMap::new();
    let registry = ServoRegistry::from_config(&system, |channel| {
        let output = RecordingPwm::new();
        outputs.insert(channel.id, output.clone());
        Ok(output)
    })?;

    // Print every change as it happens
    let events = registry.subscribe();
    thread::spawn(move || {
        for event in events {
            println!(
                "  [servo {}] {:?}: {} {:?}",
                event.servo_id, event.cause, event.current_angle, event.power_state
            );
        }
    });

    println!("=== Servo Console ({} servos) ===", registry.len());
    println!("{}", HELP);

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        if command == "quit" || command == "exit" {
            break;
        }

        match run(&registry, &system, &outputs, command, args) {
            Ok(()) => {}
            Err(Failure::Usage(msg)) => println!("{}", msg),
            Err(Failure::Servo(e)) => println!("error ({:?}): {}", e.kind(), e),
        }
    }

    registry.shutdown();
    Ok(())
}

/// Why a console command did nothing.
enum Failure {
    /// The command line itself was malformed.
    Usage(String),
    /// The servos rejected the command.
    Servo(Error),
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Failure::Servo(e)
    }
}

fn run(
    registry: &ServoRegistry,
    system: &SystemConfig,
    outputs: &BTreeMap<ServoId, RecordingPwm>,
    command: &str,
    args: &[&str],
) -> std::result::Result<(), Failure> {
    match (command, args) {
        ("move", [id, angle]) => registry.move_servo(servo_id(id)?, number(angle)?)?,
        (id, [angle]) if id.parse::<u8>().is_ok() => {
            registry.move_servo(servo_id(id)?, number(angle)?)?
        }
        ("all", [angle]) => report(registry.move_all(number(angle)?)?),
        ("center", []) => report(registry.center_all()),
        ("center", [id]) => registry.center(servo_id(id)?)?,
        ("hold", []) => report(registry.hold_all()),
        ("hold", [id]) => registry.hold(servo_id(id)?)?,
        ("release", []) => report(registry.release_all()),
        ("release", [id]) => registry.release(servo_id(id)?)?,
        ("status", []) | ("status", [_]) | ("list", []) => {
            let id = args.first().map(|id| servo_id(id)).transpose()?;
            for status in registry.status(id)? {
                println!(
                    "  servo {} ({}) pin {}: {} {:?}{}{}",
                    status.id,
                    status.name,
                    status.pin,
                    status.current_angle,
                    status.power_state,
                    if status.moving { " moving" } else { "" },
                    if status.active { "" } else { " inactive" }
                );
            }
        }
        ("config", []) => println!("{:#?}", registry.get_config()),
        ("set", [key, value @ ..]) if !value.is_empty() => {
            let update: ConfigUpdate = toml::from_str(&format!("{} = {}", key, value.join(" ")))
                .map_err(|e| Failure::Usage(format!("bad setting: {}", e.message())))?;
            let active = registry.update_config(&update)?;
            println!("{:#?}", active);
        }
        ("save", [path]) => {
            let config = SystemConfig {
                servo: (*registry.get_config()).clone(),
                channels: system.channels.clone(),
            };
            save_config(path, &config)?;
            println!("  saved to {}", path);
        }
        ("log", [id]) => {
            let id = servo_id(id)?;
            let output = outputs
                .get(&id)
                .ok_or(Error::Servo(ServoError::UnknownServoId(id)))?;
            for write in output.writes() {
                match write {
                    PwmWrite::Pulse(pulse) => println!("  pulse {}", pulse),
                    PwmWrite::Disable => println!("  disable"),
                }
            }
        }
        ("help", _) => println!("{}", HELP),
        _ => println!("unknown command, try `help`"),
    }
    Ok(())
}

fn report(report: BatchReport) {
    println!("  ok: {:?}", report.succeeded);
    for (id, error) in &report.failed {
        println!("  servo {} failed: {}", id, error);
    }
    if !report.skipped.is_empty() {
        println!("  skipped inactive: {:?}", report.skipped);
    }
}

fn servo_id(text: &str) -> std::result::Result<ServoId, Failure> {
    text.parse::<u8>()
        .map(ServoId)
        .map_err(|_| Failure::Usage(format!("bad servo id `{}`, expected 0-255", text)))
}

fn number(text: &str) -> std::result::Result<f32, Failure> {
    text.parse::<f32>()
        .map_err(|_| Failure::Usage(format!("bad angle `{}`, expected a number", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> (ServoRegistry, SystemConfig, BTreeMap<ServoId, RecordingPwm>) {
        let system = parse_config(DEFAULT_CONFIG).unwrap();
        let mut outputs = BTreeMap::new();
        let registry = ServoRegistry::from_config(&system, |channel| {
            let output = RecordingPwm::new();
            outputs.insert(channel.id, output.clone());
            Ok(output)
        })
        .unwrap();
        (registry, system, outputs)
    }

    #[test]
    fn test_typos_are_usage_errors() {
        let (registry, system, outputs) = console();
        let id = registry.ids()[0].to_string();

        for args in [[id.as_str(), "abc"], ["x", "45"]] {
            match run(&registry, &system, &outputs, "move", &args) {
                Err(Failure::Usage(msg)) => assert!(msg.starts_with("bad ")),
                _ => panic!("expected a usage error for {:?}", args),
            }
        }
        assert!(matches!(
            run(&registry, &system, &outputs, "set", &["hold_mode", "sideways"]),
            Err(Failure::Usage(_))
        ));
        assert!(outputs.values().all(|o| o.writes().is_empty()));
    }

    #[test]
    fn test_out_of_range_angle_reported_by_servo() {
        let (registry, system, outputs) = console();
        let id = registry.ids()[0].to_string();

        match run(&registry, &system, &outputs, "move", &[id.as_str(), "200"]) {
            Err(Failure::Servo(e)) => {
                assert_eq!(e.kind(), servo_motion::ErrorKind::InvalidAngle)
            }
            _ => panic!("expected an invalid angle"),
        }
        registry.shutdown();
    }
}

//! Morse receiver utility: decodes pulses on a GPIO input to stdout.
//!
//! The default mode captures edges on a dedicated thread into a
//! bounded queue and decodes on the consuming side; `--poll` runs the
//! coarser sampling loop with the idle timeout instead, for setups
//! where fine-grained capture is not available.
//!
//! Usage: morse-recv [--pin <gpio>] [--speed <chars/sec>] [--params <file.json>] [--poll]

use std::env;
use std::fs;
use std::io;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use morselink_cli::gpio::SysfsInput;
use morselink_core::{
    edge_queue, Decoder, Edge, EdgeProducer, PolledSource, PulseEvent, Receiver, SymbolTable,
    TimingConfig, TimingParams, DEFAULT_QUEUE_CAPACITY,
};

const DEFAULT_PIN: u32 = 27;
// Fine-grained capture period for queue mode; the host stand-in for an
// edge interrupt.
const CAPTURE_PERIOD: Duration = Duration::from_millis(1);
// Sample period for the polled fallback.
const POLL_PERIOD: Duration = Duration::from_millis(10);

#[derive(Debug, PartialEq)]
struct Args {
    pin: u32,
    speed: Option<f64>,
    poll: bool,
    params_file: Option<String>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [--pin <gpio>] [--speed <chars/sec>] [--params <file.json>] [--poll]"
    )
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut args = Args {
        pin: DEFAULT_PIN,
        speed: None,
        poll: false,
        params_file: None,
    };

    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pin" => {
                let value = iter.next().ok_or("--pin requires a value")?;
                args.pin = value.parse().map_err(|_| format!("invalid pin: {value}"))?;
            }
            "--speed" => {
                let value = iter.next().ok_or("--speed requires a value")?;
                let speed: f64 = value
                    .parse()
                    .map_err(|_| format!("invalid speed: {value}"))?;
                if speed <= 0.0 {
                    return Err("speed must be positive".to_string());
                }
                args.speed = Some(speed);
            }
            "--params" => {
                let value = iter.next().ok_or("--params requires a file path")?;
                args.params_file = Some(value.clone());
            }
            "--poll" => args.poll = true,
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(args)
}

/// Edge capture loop feeding the bounded queue: timestamp + enqueue
/// only, nothing else happens on this thread.
fn capture_edges(mut line: SysfsInput, producer: EdgeProducer) {
    let started = Instant::now();
    let mut last_level = false;

    loop {
        thread::sleep(CAPTURE_PERIOD);
        let level = match line.read_level() {
            Ok(level) => level,
            Err(_) => break,
        };
        if level != last_level {
            last_level = level;
            producer.offer(PulseEvent {
                edge: if level { Edge::Rising } else { Edge::Falling },
                timestamp_us: started.elapsed().as_micros() as u64,
            });
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv[1..]) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("{}", usage(&argv[0]));
            process::exit(1);
        }
    };

    let mut params = match &args.params_file {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading params file {path}"))?;
            TimingParams::from_json(&text).map_err(anyhow::Error::msg)?
        }
        None => TimingParams::default(),
    };
    if let Some(speed) = args.speed {
        params.speed = speed;
    }
    let timing = TimingConfig::from_params(&params).map_err(anyhow::Error::msg)?;

    let decoder = Decoder::new(SymbolTable::standard(), timing);
    let line = SysfsInput::open(args.pin)
        .with_context(|| format!("failed to acquire GPIO {}", args.pin))?;

    info!(
        "listening on GPIO {} in {} mode at {} chars/sec",
        args.pin,
        if args.poll { "polled" } else { "queue" },
        params.speed
    );

    let stats = if args.poll {
        let source = PolledSource::new(line, POLL_PERIOD);
        Receiver::new(source, decoder, io::stdout()).run()?
    } else {
        let (producer, source) = edge_queue(DEFAULT_QUEUE_CAPACITY);
        thread::spawn(move || capture_edges(line, producer));
        Receiver::new(source, decoder, io::stdout()).run()?
    };

    println!();
    info!(
        "decoded {} letter(s), {} unknown, {} noise pulse(s), {} overflowed mark(s)",
        stats.letters, stats.unknown, stats.noise_pulses, stats.overflowed_marks
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        let argv: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        parse_args(&argv)
    }

    #[test]
    fn defaults_need_no_arguments() {
        let parsed = args(&[]).unwrap();
        assert_eq!(
            parsed,
            Args {
                pin: DEFAULT_PIN,
                speed: None,
                poll: false,
                params_file: None,
            }
        );
    }

    #[test]
    fn parses_every_flag() {
        let parsed = args(&["--pin", "4", "--speed", "2.0", "--params", "recv.json", "--poll"])
            .unwrap();
        assert_eq!(parsed.pin, 4);
        assert_eq!(parsed.speed, Some(2.0));
        assert_eq!(parsed.params_file.as_deref(), Some("recv.json"));
        assert!(parsed.poll);
    }

    #[test]
    fn rejects_unknown_arguments_and_bad_values() {
        assert!(args(&["extra"]).is_err());
        assert!(args(&["--speed", "0"]).is_err());
        assert!(args(&["--pin", "abc"]).is_err());
        assert!(args(&["--params"]).is_err());
    }
}

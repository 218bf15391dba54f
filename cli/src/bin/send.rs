//! Morse transmitter utility: blinks a message on a GPIO LED.
//!
//! Usage: morse-send [--speed <chars/sec>] [--pin <gpio>] <repetitions> <message>

use std::env;
use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use morselink_cli::gpio::SysfsOutput;
use morselink_core::{
    encode_message, render_patterns, LineSignal, SymbolTable, TimingConfig, TimingParams,
};

const DEFAULT_PIN: u32 = 17;
const DEFAULT_SPEED: f64 = 10.0;

#[derive(Debug, PartialEq)]
struct Args {
    repetitions: u32,
    message: String,
    speed: f64,
    pin: u32,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [--speed <chars/sec>] [--pin <gpio>] <repetitions> <message>\n\
         Example: {program} 4 \"hello esp32\""
    )
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut speed = DEFAULT_SPEED;
    let mut pin = DEFAULT_PIN;
    let mut positional = Vec::new();

    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--speed" => {
                let value = iter.next().ok_or("--speed requires a value")?;
                speed = value
                    .parse()
                    .map_err(|_| format!("invalid speed: {value}"))?;
                if speed <= 0.0 {
                    return Err("speed must be positive".to_string());
                }
            }
            "--pin" => {
                let value = iter.next().ok_or("--pin requires a value")?;
                pin = value.parse().map_err(|_| format!("invalid pin: {value}"))?;
            }
            _ => positional.push(arg.clone()),
        }
    }

    if positional.len() != 2 {
        return Err("expected <repetitions> and <message>".to_string());
    }
    let repetitions: u32 = positional[0]
        .parse()
        .map_err(|_| format!("invalid repetition count: {}", positional[0]))?;
    if repetitions == 0 {
        return Err("repetitions must be a positive integer".to_string());
    }

    Ok(Args {
        repetitions,
        message: positional[1].clone(),
        speed,
        pin,
    })
}

/// Play the signal sequence on the line. Writes after acquisition are
/// treated as infallible in the sense that no partial-message recovery
/// is attempted; any error aborts the process.
fn play(signals: &[LineSignal], line: &mut SysfsOutput) -> Result<()> {
    for signal in signals {
        line.set(signal.on)?;
        thread::sleep(Duration::from_micros(signal.micros));
    }
    line.set(false)
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

    let table = SymbolTable::standard();
    let timing = TimingConfig::from_params(&TimingParams::with_speed(args.speed))
        .map_err(anyhow::Error::msg)?;
    let signals = encode_message(&args.message, &timing, &table);

    // Acquire the line before transmitting anything; a failure here
    // means no partial message was ever on the air.
    let mut line = SysfsOutput::open(args.pin)
        .with_context(|| format!("failed to acquire GPIO {}", args.pin))?;

    println!("{}", args.message);
    println!("{}", render_patterns(&args.message, &table));
    info!(
        "sending {} repetition(s) at {} chars/sec on GPIO {}",
        args.repetitions, args.speed, args.pin
    );

    for repetition in 0..args.repetitions {
        play(&signals, &mut line)?;
        if repetition + 1 < args.repetitions {
            thread::sleep(Duration::from_micros(timing.word_gap_us()));
        }
    }

    Ok(())
}

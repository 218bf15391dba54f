use log::info;

use crate::patterns::SymbolTable;
use crate::types::{LineSignal, Mark, TimingParams};

// ITU timing structure: a dash and the inter-letter gap are 3 units,
// the inter-word gap is 7 units, the intra-symbol gap is 1 unit.
const UNITS_PER_DASH: u64 = 3;
const UNITS_PER_LETTER_GAP: u64 = 3;
const UNITS_PER_WORD_GAP: u64 = 7;
// Average Morse units per character including gaps; converts a
// chars/sec speed into the base unit duration.
const UNITS_PER_CHAR: f64 = 10.0;

/// Classification of a measured ON pulse width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseClass {
    Dot,
    Dash,
    /// Outside both tolerance bands; discarded by the decoder.
    Noise,
}

/// Classification of a measured OFF gap duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapClass {
    /// Still within the same letter.
    Intra,
    /// Letter boundary.
    Letter,
    /// Word boundary.
    Word,
}

/// Validated, derived timing: emission durations for the encoder and
/// classification bands for the decoder, all in microseconds.
///
/// Boundary convention, applied uniformly on both the pulse and the
/// gap axis: every band bound is inclusive, and the larger class is
/// tested first, so a width or gap that lands exactly on a shared
/// threshold resolves to the larger class.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    unit_us: u64,
    dot_min_us: u64,
    dot_max_us: u64,
    dash_min_us: u64,
    dash_max_us: u64,
    letter_gap_min_us: u64,
    word_gap_min_us: u64,
    idle_timeout_us: u64,
}

impl TimingConfig {
    /// Derive and validate the full timing set from parameters.
    pub fn from_params(params: &TimingParams) -> Result<Self, String> {
        if !(params.speed > 0.0) {
            return Err("speed must be positive".to_string());
        }
        if !(params.tolerance >= 0.0) {
            return Err("tolerance must be non-negative".to_string());
        }

        let unit_us = (1_000_000.0 / (params.speed * UNITS_PER_CHAR)).round() as u64;
        if unit_us == 0 {
            return Err("speed too fast for microsecond timing".to_string());
        }

        let unit = unit_us as f64;
        let tol = params.tolerance;
        let dash = unit * UNITS_PER_DASH as f64;

        let config = Self {
            unit_us,
            dot_min_us: (unit * (1.0 - tol)).round() as u64,
            dot_max_us: (unit * (1.0 + tol)).round() as u64,
            dash_min_us: (dash * (1.0 - tol)).round() as u64,
            dash_max_us: (dash * (1.0 + tol)).round() as u64,
            letter_gap_min_us: (unit * params.letter_gap_units).round() as u64,
            word_gap_min_us: (unit * params.word_gap_units).round() as u64,
            idle_timeout_us: (unit * params.idle_timeout_units).round() as u64,
        };

        if config.dot_max_us >= config.dash_min_us {
            return Err("dot and dash bands overlap; tolerance must be below 0.5".to_string());
        }
        if config.letter_gap_min_us <= config.unit_us {
            return Err("letter gap threshold must exceed the intra-symbol gap".to_string());
        }
        if config.word_gap_min_us <= config.letter_gap_min_us {
            return Err("word gap threshold must exceed the letter gap threshold".to_string());
        }
        if config.idle_timeout_us <= config.word_gap_min_us {
            return Err("idle timeout must exceed the word gap threshold".to_string());
        }

        info!(
            "timing: unit={}us dot={}..{}us dash={}..{}us letter>={}us word>={}us",
            config.unit_us,
            config.dot_min_us,
            config.dot_max_us,
            config.dash_min_us,
            config.dash_max_us,
            config.letter_gap_min_us,
            config.word_gap_min_us,
        );

        Ok(config)
    }

    /// Default parameters at the given speed.
    pub fn from_speed(speed: f64) -> Result<Self, String> {
        Self::from_params(&TimingParams::with_speed(speed))
    }

    pub fn unit_us(&self) -> u64 {
        self.unit_us
    }

    pub fn dot_us(&self) -> u64 {
        self.unit_us
    }

    pub fn dash_us(&self) -> u64 {
        self.unit_us * UNITS_PER_DASH
    }

    pub fn intra_gap_us(&self) -> u64 {
        self.unit_us
    }

    pub fn letter_gap_us(&self) -> u64 {
        self.unit_us * UNITS_PER_LETTER_GAP
    }

    pub fn word_gap_us(&self) -> u64 {
        self.unit_us * UNITS_PER_WORD_GAP
    }

    pub fn dot_max_us(&self) -> u64 {
        self.dot_max_us
    }

    pub fn dash_min_us(&self) -> u64 {
        self.dash_min_us
    }

    pub fn idle_timeout_us(&self) -> u64 {
        self.idle_timeout_us
    }

    /// Classify an ON pulse width. Dash is tested first so a width on
    /// a shared bound goes to the larger class.
    pub fn classify_pulse(&self, width_us: u64) -> PulseClass {
        if width_us >= self.dash_min_us && width_us <= self.dash_max_us {
            PulseClass::Dash
        } else if width_us >= self.dot_min_us && width_us <= self.dot_max_us {
            PulseClass::Dot
        } else {
            PulseClass::Noise
        }
    }

    /// Classify an OFF gap duration. Word is tested before letter so a
    /// gap past both thresholds is a word boundary.
    pub fn classify_gap(&self, gap_us: u64) -> GapClass {
        if gap_us >= self.word_gap_min_us {
            GapClass::Word
        } else if gap_us >= self.letter_gap_min_us {
            GapClass::Letter
        } else {
            GapClass::Intra
        }
    }
}

/// Encode a message into the (level, duration) sequence that
/// reproduces its Morse signal when played back exactly.
///
/// Unsupported characters are skipped silently. Every mark is followed
/// by an OFF; the OFF after a letter's last mark is the 3-unit letter
/// gap (also after the final letter), and a space stretches the
/// preceding gap to the 7-unit word gap.
pub fn encode_message(text: &str, timing: &TimingConfig, table: &SymbolTable) -> Vec<LineSignal> {
    let mut signals: Vec<LineSignal> = Vec::new();

    for ch in text.chars() {
        if ch == ' ' {
            // A leading space has no signal to separate; runs of
            // spaces stay a single word gap.
            if let Some(last) = signals.last_mut() {
                if !last.on {
                    last.micros = last.micros.max(timing.word_gap_us());
                }
            }
            continue;
        }

        if let Some(pattern) = table.pattern(ch) {
            for &mark in pattern {
                let micros = match mark {
                    Mark::Dot => timing.dot_us(),
                    Mark::Dash => timing.dash_us(),
                };
                signals.push(LineSignal { on: true, micros });
                signals.push(LineSignal {
                    on: false,
                    micros: timing.intra_gap_us(),
                });
            }
            // The last intra-symbol gap stretches to the letter gap.
            if let Some(last) = signals.last_mut() {
                last.micros = timing.letter_gap_us();
            }
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TimingConfig {
        TimingConfig::from_speed(10.0).unwrap()
    }

    #[test]
    fn unit_duration_follows_speed() {
        assert_eq!(config().unit_us(), 10_000);
        assert_eq!(TimingConfig::from_speed(0.5).unwrap().unit_us(), 200_000);
    }

    #[test]
    fn doubling_speed_halves_every_duration() {
        let slow = TimingConfig::from_speed(10.0).unwrap();
        let fast = TimingConfig::from_speed(20.0).unwrap();
        assert_eq!(slow.dot_us(), fast.dot_us() * 2);
        assert_eq!(slow.dash_us(), fast.dash_us() * 2);
        assert_eq!(slow.intra_gap_us(), fast.intra_gap_us() * 2);
        assert_eq!(slow.letter_gap_us(), fast.letter_gap_us() * 2);
        assert_eq!(slow.word_gap_us(), fast.word_gap_us() * 2);
        assert_eq!(slow.idle_timeout_us(), fast.idle_timeout_us() * 2);
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(TimingConfig::from_speed(0.0).is_err());
        assert!(TimingConfig::from_speed(-3.0).is_err());

        // Touching bands: tolerance 0.5 puts dot_max == dash_min.
        let mut params = TimingParams::default();
        params.tolerance = 0.5;
        assert!(TimingConfig::from_params(&params).is_err());

        let mut params = TimingParams::default();
        params.letter_gap_units = 1.0;
        assert!(TimingConfig::from_params(&params).is_err());

        let mut params = TimingParams::default();
        params.word_gap_units = 2.0;
        assert!(TimingConfig::from_params(&params).is_err());

        let mut params = TimingParams::default();
        params.idle_timeout_units = 5.0;
        assert!(TimingConfig::from_params(&params).is_err());
    }

    #[test]
    fn pulse_bands_are_inclusive_with_noise_between() {
        let timing = config();
        // unit 10ms, tolerance 0.4: dot 6..14ms, dash 18..42ms.
        assert_eq!(timing.classify_pulse(6_000), PulseClass::Dot);
        assert_eq!(timing.classify_pulse(timing.dot_max_us()), PulseClass::Dot);
        assert_eq!(timing.classify_pulse(timing.dot_max_us() + 1), PulseClass::Noise);
        assert_eq!(timing.classify_pulse(timing.dash_min_us() - 1), PulseClass::Noise);
        assert_eq!(timing.classify_pulse(timing.dash_min_us()), PulseClass::Dash);
        assert_eq!(timing.classify_pulse(42_000), PulseClass::Dash);
        assert_eq!(timing.classify_pulse(42_001), PulseClass::Noise);
        assert_eq!(timing.classify_pulse(100), PulseClass::Noise);
    }

    #[test]
    fn gap_thresholds_are_inclusive_and_word_wins() {
        let timing = config();
        assert_eq!(timing.classify_gap(10_000), GapClass::Intra);
        assert_eq!(timing.classify_gap(29_999), GapClass::Intra);
        assert_eq!(timing.classify_gap(30_000), GapClass::Letter);
        assert_eq!(timing.classify_gap(69_999), GapClass::Letter);
        assert_eq!(timing.classify_gap(70_000), GapClass::Word);
        // Past both thresholds the word boundary applies.
        assert_eq!(timing.classify_gap(500_000), GapClass::Word);
    }

    #[test]
    fn encode_single_letter() {
        let table = SymbolTable::standard();
        let timing = config();
        // A = .-
        let signals = encode_message("A", &timing, &table);
        assert_eq!(
            signals,
            vec![
                LineSignal { on: true, micros: 10_000 },
                LineSignal { on: false, micros: 10_000 },
                LineSignal { on: true, micros: 30_000 },
                LineSignal { on: false, micros: 30_000 },
            ]
        );
    }

    #[test]
    fn unsupported_characters_are_dropped() {
        let table = SymbolTable::standard();
        let timing = config();
        assert_eq!(
            encode_message("A!B", &timing, &table),
            encode_message("AB", &timing, &table)
        );
        assert!(encode_message("@#%", &timing, &table).is_empty());
    }

    #[test]
    fn space_stretches_the_preceding_gap() {
        let table = SymbolTable::standard();
        let timing = config();
        let signals = encode_message("E E", &timing, &table);
        assert_eq!(
            signals,
            vec![
                LineSignal { on: true, micros: 10_000 },
                LineSignal { on: false, micros: 70_000 },
                LineSignal { on: true, micros: 10_000 },
                LineSignal { on: false, micros: 30_000 },
            ]
        );
        // Leading spaces have nothing to separate; runs collapse.
        assert_eq!(
            encode_message("  E    E", &timing, &table),
            encode_message("E E", &timing, &table)
        );
        // A trailing space stretches the final letter gap.
        let trailing = encode_message("E ", &timing, &table);
        assert_eq!(trailing.last(), Some(&LineSignal { on: false, micros: 70_000 }));
    }
}

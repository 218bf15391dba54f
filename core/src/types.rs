use serde::{Deserialize, Serialize};

/// A single dot or dash within a character's pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    Dot = 0,
    Dash = 1,
}

/// One level-hold of the transmission line. Played back in order, a
/// sequence of these reproduces the Morse signal for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSignal {
    pub on: bool,
    pub micros: u64,
}

/// Direction of a line transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// A line transition with its capture timestamp. Ephemeral: consumed
/// by the classifier as soon as it is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    pub edge: Edge,
    pub timestamp_us: u64,
}

/// A letter produced by the decoder. `word_boundary` is set when the
/// gap before the next letter crossed the word threshold, meaning a
/// literal space follows this letter in the output text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub ch: char,
    pub word_boundary: bool,
}

/// Receiver-side counters. Noise and overflow are recoverable, lossy
/// conditions; they are counted here and surfaced in logs rather than
/// aborting the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Letters decoded through the symbol table.
    pub letters: u64,
    /// Valid mark sequences with no table match (emitted as the
    /// unknown sentinel).
    pub unknown: u64,
    /// Pulses whose width fell outside both the dot and dash bands.
    pub noise_pulses: u64,
    /// Marks dropped because the in-progress letter buffer was full.
    pub overflowed_marks: u64,
    /// Out-of-order edges, e.g. a rising edge while a pulse was
    /// already in progress after a queue overflow lost its partner.
    pub anomalous_edges: u64,
}

/// Timing parameters for both sides of the link.
///
/// `speed` is in characters per second; the base unit duration is
/// derived as `1 / (speed * 10)` seconds (10 is the average number of
/// Morse units per character including gaps). The gap thresholds and
/// idle timeout are expressed in units so they scale with speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingParams {
    pub speed: f64,
    pub tolerance: f64,
    pub letter_gap_units: f64,
    pub word_gap_units: f64,
    pub idle_timeout_units: f64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            speed: 10.0,
            tolerance: 0.4,
            letter_gap_units: 3.0,
            word_gap_units: 7.0,
            idle_timeout_units: 20.0,
        }
    }
}

impl TimingParams {
    /// Default parameters at the given transmission speed.
    pub fn with_speed(speed: f64) -> Self {
        Self {
            speed,
            ..Default::default()
        }
    }

    /// Parse parameters from a JSON document; missing fields take
    /// their defaults.
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid timing params: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_from_json_fills_defaults() {
        let params = TimingParams::from_json(r#"{"speed": 2.5}"#).unwrap();
        assert_eq!(params.speed, 2.5);
        assert_eq!(params.tolerance, TimingParams::default().tolerance);
        assert_eq!(params.word_gap_units, 7.0);
    }

    #[test]
    fn params_from_json_rejects_garbage() {
        assert!(TimingParams::from_json("not json").is_err());
    }
}

//! Timing-recovery decoder: classifies pulse widths and gaps into
//! marks and boundaries, accumulates the in-progress letter, and emits
//! decoded characters.

use std::io::{self, Write};

use log::{debug, warn};

use crate::patterns::SymbolTable;
use crate::source::{PulseEventSource, SourceEvent};
use crate::timing::{GapClass, PulseClass, TimingConfig};
use crate::types::{DecodeStats, Decoded, Edge, Mark, PulseEvent};

/// Emitted for a valid mark sequence with no table match. Decoding is
/// best-effort; an unrecognized pattern never aborts the receiver.
pub const UNKNOWN_CHAR: char = '?';

/// Longest accepted in-progress letter. The longest table pattern is
/// 5 marks (digits); extra marks past this bound are dropped.
const MAX_MARKS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No pulse in progress; the buffer may hold marks awaiting a
    /// boundary decision.
    Idle,
    /// Pulse in progress, rising-edge timestamp recorded.
    LightOn,
}

/// The receive-side state machine. Owned exclusively by the receiver
/// task; the symbol table and timing are fixed at construction.
pub struct Decoder {
    table: SymbolTable,
    timing: TimingConfig,
    state: State,
    last_rising_us: Option<u64>,
    last_falling_us: Option<u64>,
    last_activity_us: u64,
    buffer: Vec<Mark>,
    stats: DecodeStats,
}

impl Decoder {
    pub fn new(table: SymbolTable, timing: TimingConfig) -> Self {
        Self {
            table,
            timing,
            state: State::Idle,
            last_rising_us: None,
            last_falling_us: None,
            last_activity_us: 0,
            buffer: Vec::with_capacity(MAX_MARKS),
            stats: DecodeStats::default(),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Feed one edge through the state machine. A rising edge may
    /// complete the buffered letter (the gap before it decides letter
    /// vs word boundary); a falling edge classifies the pulse width.
    pub fn on_event(&mut self, event: PulseEvent) -> Option<Decoded> {
        self.last_activity_us = event.timestamp_us;
        match event.edge {
            Edge::Rising => self.on_rising(event.timestamp_us),
            Edge::Falling => {
                self.on_falling(event.timestamp_us);
                None
            }
        }
    }

    fn on_rising(&mut self, now_us: u64) -> Option<Decoded> {
        if self.state == State::LightOn {
            // The partner falling edge was lost (queue overflow).
            // Re-anchor on this edge; the truncated pulse is gone.
            warn!("rising edge at {now_us}us with a pulse in progress; an edge was lost");
            self.stats.anomalous_edges += 1;
            self.last_rising_us = Some(now_us);
            return None;
        }

        let decoded = match self.last_falling_us {
            Some(fell_us) if !self.buffer.is_empty() => {
                let gap_us = now_us.saturating_sub(fell_us);
                match self.timing.classify_gap(gap_us) {
                    GapClass::Word => Some(self.take_letter(true)),
                    GapClass::Letter => Some(self.take_letter(false)),
                    GapClass::Intra => None,
                }
            }
            _ => None,
        };

        self.state = State::LightOn;
        self.last_rising_us = Some(now_us);
        decoded
    }

    fn on_falling(&mut self, now_us: u64) {
        self.state = State::Idle;

        let rose_us = match self.last_rising_us {
            Some(t) => t,
            None => {
                // The line was already high at startup; no width to
                // measure. Anchor the gap here and continue.
                self.stats.anomalous_edges += 1;
                self.last_falling_us = Some(now_us);
                return;
            }
        };

        let width_us = now_us.saturating_sub(rose_us);
        match self.timing.classify_pulse(width_us) {
            PulseClass::Dot => self.push_mark(Mark::Dot, width_us),
            PulseClass::Dash => self.push_mark(Mark::Dash, width_us),
            PulseClass::Noise => {
                warn!("pulse width {width_us}us outside the dot/dash bands; discarded");
                self.stats.noise_pulses += 1;
            }
        }

        // The gap is measured from this edge even for a rejected
        // pulse: the line really was high, so the silence starts here.
        self.last_falling_us = Some(now_us);
    }

    fn push_mark(&mut self, mark: Mark, width_us: u64) {
        if self.buffer.len() >= MAX_MARKS {
            warn!("mark buffer full; dropping {mark:?}");
            self.stats.overflowed_marks += 1;
            return;
        }
        debug!("{mark:?} ({width_us}us)");
        self.buffer.push(mark);
    }

    /// Periodic check for the polled mode: once nothing has happened
    /// for the idle timeout, a stranded trailing letter is decoded and
    /// the buffer cleared, so it is never emitted twice.
    pub fn on_tick(&mut self, now_us: u64) -> Option<Decoded> {
        if self.state == State::Idle
            && !self.buffer.is_empty()
            && now_us.saturating_sub(self.last_activity_us) >= self.timing.idle_timeout_us()
        {
            self.last_activity_us = now_us;
            return Some(self.take_letter(false));
        }
        None
    }

    /// Flush the in-progress letter when the event source ends.
    pub fn finish(&mut self) -> Option<Decoded> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.take_letter(false))
        }
    }

    fn take_letter(&mut self, word_boundary: bool) -> Decoded {
        let ch = match self.table.lookup(&self.buffer) {
            Some(ch) => {
                self.stats.letters += 1;
                ch
            }
            None => {
                self.stats.unknown += 1;
                UNKNOWN_CHAR
            }
        };
        self.buffer.clear();
        Decoded { ch, word_boundary }
    }
}

/// Drives a decoder from a pulse event source, writing decoded text to
/// a sink: one character per letter, a literal space on word
/// boundaries, flushed per letter.
pub struct Receiver<S, W> {
    source: S,
    decoder: Decoder,
    sink: W,
}

impl<S: PulseEventSource, W: Write> Receiver<S, W> {
    pub fn new(source: S, decoder: Decoder, sink: W) -> Self {
        Self {
            source,
            decoder,
            sink,
        }
    }

    /// Run until the source closes; returns the final counters.
    pub fn run(mut self) -> io::Result<DecodeStats> {
        loop {
            let event = self.source.next_event();
            let decoded = match event {
                SourceEvent::Edge(event) => self.decoder.on_event(event),
                SourceEvent::Tick(now_us) => self.decoder.on_tick(now_us),
                SourceEvent::Closed => self.decoder.finish(),
            };
            self.emit(decoded)?;
            if matches!(event, SourceEvent::Closed) {
                break;
            }
        }
        Ok(self.decoder.stats())
    }

    fn emit(&mut self, decoded: Option<Decoded>) -> io::Result<()> {
        if let Some(decoded) = decoded {
            write!(self.sink, "{}", decoded.ch)?;
            if decoded.word_boundary {
                write!(self.sink, " ")?;
            }
            self.sink.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> Decoder {
        Decoder::new(
            SymbolTable::standard(),
            TimingConfig::from_speed(10.0).unwrap(),
        )
    }

    fn rising(timestamp_us: u64) -> PulseEvent {
        PulseEvent {
            edge: Edge::Rising,
            timestamp_us,
        }
    }

    fn falling(timestamp_us: u64) -> PulseEvent {
        PulseEvent {
            edge: Edge::Falling,
            timestamp_us,
        }
    }

    #[test]
    fn letter_boundary_emits_without_space() {
        let mut decoder = decoder();
        // E = . then a 3-unit gap before the next pulse.
        assert_eq!(decoder.on_event(rising(0)), None);
        assert_eq!(decoder.on_event(falling(10_000)), None);
        let decoded = decoder.on_event(rising(40_000)).unwrap();
        assert_eq!(decoded, Decoded { ch: 'E', word_boundary: false });
    }

    #[test]
    fn word_gap_takes_precedence_over_letter_gap() {
        let mut decoder = decoder();
        decoder.on_event(rising(0));
        decoder.on_event(falling(10_000));
        // 100ms gap crosses both thresholds; the word action applies.
        let decoded = decoder.on_event(rising(110_000)).unwrap();
        assert_eq!(decoded, Decoded { ch: 'E', word_boundary: true });
    }

    #[test]
    fn intra_gap_keeps_accumulating() {
        let mut decoder = decoder();
        decoder.on_event(rising(0));
        decoder.on_event(falling(10_000));
        // 1-unit gap: same letter.
        assert_eq!(decoder.on_event(rising(20_000)), None);
        decoder.on_event(falling(50_000));
        assert_eq!(decoder.finish(), Some(Decoded { ch: 'A', word_boundary: false }));
    }

    #[test]
    fn noise_pulse_is_discarded_and_reanchors_the_gap() {
        let mut decoder = decoder();
        decoder.on_event(rising(0));
        decoder.on_event(falling(10_000));
        // 16ms is strictly between the dot and dash bands.
        decoder.on_event(rising(20_000));
        decoder.on_event(falling(36_000));
        assert_eq!(decoder.stats().noise_pulses, 1);
        // The gap reference moved to the glitch's falling edge, so the
        // next rising edge 30ms later is a letter boundary, not a word.
        let decoded = decoder.on_event(rising(66_000)).unwrap();
        assert_eq!(decoded, Decoded { ch: 'E', word_boundary: false });
    }

    #[test]
    fn unknown_pattern_emits_sentinel() {
        let mut decoder = decoder();
        // Six dots matches nothing in the table.
        let mut t = 0;
        for _ in 0..6 {
            decoder.on_event(rising(t));
            decoder.on_event(falling(t + 10_000));
            t += 20_000;
        }
        let decoded = decoder.finish().unwrap();
        assert_eq!(decoded.ch, UNKNOWN_CHAR);
        assert_eq!(decoder.stats().unknown, 1);
        assert_eq!(decoder.stats().letters, 0);
    }

    #[test]
    fn buffer_overflow_drops_marks() {
        let mut decoder = decoder();
        let mut t = 0;
        for _ in 0..10 {
            decoder.on_event(rising(t));
            decoder.on_event(falling(t + 10_000));
            t += 20_000;
        }
        assert_eq!(decoder.stats().overflowed_marks, 2);
    }

    #[test]
    fn idle_timeout_emits_exactly_once() {
        let mut decoder = decoder();
        // Accumulate ".-" and let the line go quiet.
        decoder.on_event(rising(0));
        decoder.on_event(falling(10_000));
        decoder.on_event(rising(20_000));
        decoder.on_event(falling(50_000));

        // Before the timeout (200ms of silence) nothing happens.
        assert_eq!(decoder.on_tick(100_000), None);
        let decoded = decoder.on_tick(260_000).unwrap();
        assert_eq!(decoded, Decoded { ch: 'A', word_boundary: false });

        // No re-emit on later ticks or the next rising edge.
        assert_eq!(decoder.on_tick(500_000), None);
        assert_eq!(decoder.on_event(rising(600_000)), None);
    }

    #[test]
    fn lost_falling_edge_is_counted_and_survived() {
        let mut decoder = decoder();
        decoder.on_event(rising(0));
        // Falling edge lost; the next rising edge re-anchors.
        assert_eq!(decoder.on_event(rising(40_000)), None);
        assert_eq!(decoder.stats().anomalous_edges, 1);
        decoder.on_event(falling(50_000));
        assert_eq!(decoder.finish(), Some(Decoded { ch: 'E', word_boundary: false }));
    }

    #[test]
    fn falling_edge_before_any_rising_is_tolerated() {
        let mut decoder = decoder();
        decoder.on_event(falling(5_000));
        assert_eq!(decoder.stats().anomalous_edges, 1);
        decoder.on_event(rising(10_000));
        decoder.on_event(falling(20_000));
        assert_eq!(decoder.finish(), Some(Decoded { ch: 'E', word_boundary: false }));
    }
}

// Morse line coding: pattern tables, timed pulse generation, and a
// timing-recovery decoder for a digital on/off channel.

pub mod decode;
pub mod patterns;
pub mod source;
pub mod timing;
pub mod types;

// Re-export main public API
pub use decode::{Decoder, Receiver, UNKNOWN_CHAR};
pub use patterns::{render_patterns, MarkPattern, SymbolTable};
pub use source::{
    edge_queue, signals_to_events, EdgeProducer, LineProbe, PolledSource, PulseEventSource,
    QueueSource, ScriptedSource, SourceEvent, DEFAULT_QUEUE_CAPACITY,
};
pub use timing::{GapClass, PulseClass, TimingConfig};
pub use types::*;

/// Encode a message into the (level, duration) sequence reproducing
/// its Morse signal.
pub fn encode_message(text: &str, timing: &TimingConfig, table: &SymbolTable) -> Vec<LineSignal> {
    timing::encode_message(text, timing, table)
}

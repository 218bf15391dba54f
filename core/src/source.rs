//! Pulse event sources: one interface, two capture strategies.
//!
//! The queue-driven source is the primary design: an interrupt-shaped
//! producer hands timestamped edges to a single consumer over a
//! bounded queue. The polled source is the fallback for platforms
//! without edge interrupts; it is coarser and only adequate for slow
//! transmissions, but its periodic ticks give the receiver loop the
//! wake-ups the idle timeout needs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver as ChannelReceiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::types::{Edge, LineSignal, PulseEvent};

/// Default bounded-queue capacity; sized to tolerate the fastest
/// expected symbol rate.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// What a source hands the receiver loop next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    Edge(PulseEvent),
    /// A period elapsed with no transition; carries the current
    /// timestamp so the receiver can run its idle-timeout check.
    Tick(u64),
    /// No further events will arrive.
    Closed,
}

/// A stream of line transitions, blocking until the next one.
pub trait PulseEventSource {
    fn next_event(&mut self) -> SourceEvent;
}

/// Producer half of the bounded edge queue. `offer` is shaped for
/// interrupt context: timestamp + enqueue only, no blocking, no
/// allocation, no logging. Overflow increments a shared counter that
/// the consumer surfaces.
#[derive(Clone)]
pub struct EdgeProducer {
    tx: SyncSender<PulseEvent>,
    dropped: Arc<AtomicU64>,
}

impl EdgeProducer {
    pub fn offer(&self, event: PulseEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total edges lost to queue overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half of the bounded edge queue. Blocks indefinitely on
/// reads; closes when every producer handle is gone.
pub struct QueueSource {
    rx: ChannelReceiver<PulseEvent>,
    dropped: Arc<AtomicU64>,
    dropped_seen: u64,
}

impl PulseEventSource for QueueSource {
    fn next_event(&mut self) -> SourceEvent {
        // A dropped edge corrupts the pulse-width measurements that
        // follow it; make the loss visible instead of silent.
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.dropped_seen {
            warn!(
                "{} edge event(s) lost to queue overflow; subsequent widths are suspect",
                dropped - self.dropped_seen
            );
            self.dropped_seen = dropped;
        }

        match self.rx.recv() {
            Ok(event) => SourceEvent::Edge(event),
            Err(_) => SourceEvent::Closed,
        }
    }
}

/// Create the producer/consumer pair around a bounded FIFO.
pub fn edge_queue(capacity: usize) -> (EdgeProducer, QueueSource) {
    let (tx, rx) = sync_channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EdgeProducer {
            tx,
            dropped: Arc::clone(&dropped),
        },
        QueueSource {
            rx,
            dropped,
            dropped_seen: 0,
        },
    )
}

/// Reads the instantaneous line level for the polled source.
pub trait LineProbe {
    fn is_high(&mut self) -> Result<bool, String>;
}

/// Fallback source: samples the line on a fixed period and synthesizes
/// edges from level changes. Timing resolution is the sample period,
/// so this is only adequate for slow transmissions.
pub struct PolledSource<P> {
    probe: P,
    period: Duration,
    started: Instant,
    last_level: bool,
    failed: bool,
}

impl<P: LineProbe> PolledSource<P> {
    pub fn new(probe: P, period: Duration) -> Self {
        Self {
            probe,
            period,
            started: Instant::now(),
            last_level: false,
            failed: false,
        }
    }
}

impl<P: LineProbe> PulseEventSource for PolledSource<P> {
    fn next_event(&mut self) -> SourceEvent {
        if self.failed {
            return SourceEvent::Closed;
        }

        thread::sleep(self.period);
        let now_us = self.started.elapsed().as_micros() as u64;

        let level = match self.probe.is_high() {
            Ok(level) => level,
            Err(err) => {
                warn!("line probe failed: {err}");
                self.failed = true;
                return SourceEvent::Closed;
            }
        };

        if level != self.last_level {
            self.last_level = level;
            let edge = if level { Edge::Rising } else { Edge::Falling };
            SourceEvent::Edge(PulseEvent {
                edge,
                timestamp_us: now_us,
            })
        } else {
            SourceEvent::Tick(now_us)
        }
    }
}

/// Replays a prepared event sequence; the simulation harness for
/// feeding encoder output back through the decoder.
pub struct ScriptedSource {
    events: VecDeque<SourceEvent>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = SourceEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// The edge sequence an exact, noise-free capture of the played
    /// signals would record.
    pub fn from_signals(signals: &[LineSignal]) -> Self {
        Self::new(signals_to_events(signals).into_iter().map(SourceEvent::Edge))
    }
}

impl PulseEventSource for ScriptedSource {
    fn next_event(&mut self) -> SourceEvent {
        self.events.pop_front().unwrap_or(SourceEvent::Closed)
    }
}

/// Convert a played-back signal sequence into timestamped transitions.
/// The line starts low; a trailing ON signal gets its closing falling
/// edge.
pub fn signals_to_events(signals: &[LineSignal]) -> Vec<PulseEvent> {
    let mut events = Vec::new();
    let mut now_us = 0u64;
    let mut level = false;

    for signal in signals {
        if signal.on != level {
            level = signal.on;
            events.push(PulseEvent {
                edge: if level { Edge::Rising } else { Edge::Falling },
                timestamp_us: now_us,
            });
        }
        now_us += signal.micros;
    }
    if level {
        events.push(PulseEvent {
            edge: Edge::Falling,
            timestamp_us: now_us,
        });
    }

    events
}

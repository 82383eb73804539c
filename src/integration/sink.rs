//! Event sinks and the background writer that feeds them.
//!
//! The tracker never talks to a sink directly. Events are pushed onto a
//! bounded queue with [`SinkWriter::submit`], which never blocks; a dedicated
//! thread drains the queue, retrying transient sink failures with capped
//! exponential backoff.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::tracker::{Category, DeliveryEvent};

/// Destination for delivery events.
///
/// `timeout` is the budget for one call. The writer cannot interrupt a call
/// that runs past it, so sinks backed by external services must enforce it
/// themselves; the writer only counts and logs overruns.
pub trait EventSink {
    fn deliver(&mut self, event: &DeliveryEvent, timeout: Duration) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Configuration for the SinkWriter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkWriterConfig {
    pub queue_capacity: usize,
    pub call_timeout_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Consecutive failed events before the writer reports itself degraded
    pub degraded_after: u32,
}

impl Default for SinkWriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            call_timeout_ms: 2_000,
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            degraded_after: 3,
        }
    }
}

impl SinkWriterConfig {
    fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Delay before retry number `attempt` (starting at 0).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Default)]
struct SinkStatus {
    written: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    overruns: AtomicU64,
    degraded: AtomicBool,
}

/// Point-in-time writer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SinkStats {
    pub written: u64,
    /// Rejected at submit time because the queue was full or closed
    pub dropped: u64,
    /// Given up on after retries
    pub failed: u64,
    /// Sink calls that returned after their timeout
    pub overruns: u64,
    pub degraded: bool,
}

/// Owns the event queue and the thread draining it into a sink.
pub struct SinkWriter {
    tx: Option<Sender<DeliveryEvent>>,
    handle: Option<thread::JoinHandle<()>>,
    status: Arc<SinkStatus>,
}

impl SinkWriter {
    /// Start the writer thread for `sink`.
    pub fn spawn<S>(sink: S, config: SinkWriterConfig) -> Result<Self, SinkError>
    where
        S: EventSink + Send + 'static,
    {
        let (tx, rx) = bounded::<DeliveryEvent>(config.queue_capacity.max(1));
        let status = Arc::new(SinkStatus::default());
        let status_clone = Arc::clone(&status);
        let handle = thread::Builder::new()
            .name("delivery-sink".to_string())
            .spawn(move || Self::writer_loop(sink, config, rx, status_clone))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            status,
        })
    }

    /// Queue an event without blocking. Returns false if it was dropped.
    pub fn submit(&self, event: DeliveryEvent) -> bool {
        let Some(tx) = &self.tx else {
            self.status.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.status.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Sink queue full, dropping {} {:+} event for object {}",
                    event.category,
                    event.delta.value(),
                    event.object_id
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.status.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Sink writer stopped, dropping event");
                false
            }
        }
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            written: self.status.written.load(Ordering::Relaxed),
            dropped: self.status.dropped.load(Ordering::Relaxed),
            failed: self.status.failed.load(Ordering::Relaxed),
            overruns: self.status.overruns.load(Ordering::Relaxed),
            degraded: self.status.degraded.load(Ordering::Relaxed),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status.degraded.load(Ordering::Relaxed)
    }

    /// Close the queue, let the worker drain it, and wait for it to finish.
    pub fn shutdown(mut self) -> SinkStats {
        self.stop();
        self.stats()
    }

    fn stop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Sink writer thread panicked");
            }
        }
    }

    fn writer_loop<S: EventSink>(
        mut sink: S,
        config: SinkWriterConfig,
        rx: Receiver<DeliveryEvent>,
        status: Arc<SinkStatus>,
    ) {
        log::info!("Sink writer started");
        let mut consecutive_failures = 0u32;

        for event in rx.iter() {
            match deliver_with_retry(&mut sink, &event, &config, &status) {
                Ok(()) => {
                    status.written.fetch_add(1, Ordering::Relaxed);
                    consecutive_failures = 0;
                    if status.degraded.swap(false, Ordering::Relaxed) {
                        log::info!("Sink recovered");
                    }
                }
                Err(e) => {
                    status.failed.fetch_add(1, Ordering::Relaxed);
                    consecutive_failures += 1;
                    log::warn!(
                        "Giving up on {} {:+} event for object {}: {}",
                        event.category,
                        event.delta.value(),
                        event.object_id,
                        e
                    );
                    if consecutive_failures >= config.degraded_after
                        && !status.degraded.swap(true, Ordering::Relaxed)
                    {
                        log::error!(
                            "Sink degraded after {} consecutive failures",
                            consecutive_failures
                        );
                    }
                }
            }
        }

        if let Err(e) = sink.flush() {
            log::warn!("Sink flush failed: {}", e);
        }
        log::info!("Sink writer stopped");
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn deliver_with_retry<S: EventSink>(
    sink: &mut S,
    event: &DeliveryEvent,
    config: &SinkWriterConfig,
    status: &SinkStatus,
) -> Result<(), SinkError> {
    let timeout = config.call_timeout();
    let mut attempt = 0;
    loop {
        let started = Instant::now();
        let result = sink.deliver(event, timeout);
        let elapsed = started.elapsed();
        if elapsed > timeout {
            status.overruns.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Sink call took {:?}, over its {:?} timeout",
                elapsed,
                timeout
            );
        }
        match result {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                let delay = config.backoff(attempt);
                log::debug!("Sink call failed ({}), retrying in {:?}", e, delay);
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// In-memory sink. Clones share the same event log.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<DeliveryEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeliveryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for MemorySink {
    fn deliver(&mut self, event: &DeliveryEvent, _timeout: Duration) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// One persisted row: local date and time, per-category change, source clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRecord {
    pub date: String,
    pub time: String,
    pub total_food: i32,
    pub total_drinks: i32,
    pub total_parcels: i32,
    pub video_path: String,
}

impl From<&DeliveryEvent> for DeliveryRecord {
    fn from(event: &DeliveryEvent) -> Self {
        let local = event.timestamp.with_timezone(&Local);
        let change = |category: Category| {
            if event.category == category {
                event.delta.value()
            } else {
                0
            }
        };
        Self {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%I:%M:%S %p").to_string(),
            total_food: change(Category::Food),
            total_drinks: change(Category::Drink),
            total_parcels: change(Category::Parcel),
            video_path: event.source.clone().unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// Writes one JSON [`DeliveryRecord`] per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn deliver(&mut self, event: &DeliveryEvent, _timeout: Duration) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &DeliveryRecord::from(event))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

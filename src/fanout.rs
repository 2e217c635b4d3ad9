//! Fan-out asynchronous writer.
//!
//! Multiplexes one logical write onto N independent sinks. Each sink is
//! fronted by its own bounded queue and drained by its own worker thread,
//! so one slow or broken sink never stops delivery to the others. Sinks are
//! blocking `io::Write` targets (files, sockets, pipes), which is why the
//! workers are OS threads rather than coroutines.

use crate::lifecycle::ManagedObject;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tuning knobs for a [`FanoutWriter`].
#[derive(Debug, Clone, Copy)]
pub struct FanoutConfig {
    /// Per-sink queue capacity. A full queue blocks the writer.
    pub queue_capacity: usize,
    /// Per-sink drain budget during `stop`, measured from the start of that
    /// sink's drain. Remaining buffers are dropped once it elapses.
    pub drain_timeout: Duration,
}

impl FanoutConfig {
    /// Load configuration from environment variables.
    ///
    /// - `ARMATURE_FANOUT_QUEUE`: per-sink queue capacity (default: 1024)
    /// - `ARMATURE_FANOUT_DRAIN_MS`: drain timeout in milliseconds (default: 500)
    #[must_use]
    pub fn from_env() -> Self {
        let queue_capacity = std::env::var("ARMATURE_FANOUT_QUEUE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1024);
        let drain_ms = std::env::var("ARMATURE_FANOUT_DRAIN_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(500);
        Self {
            queue_capacity,
            drain_timeout: Duration::from_millis(drain_ms),
        }
    }
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            drain_timeout: Duration::from_millis(500),
        }
    }
}

/// Delivery counters for a [`FanoutWriter`].
///
/// `Relaxed` ordering throughout: counters are monitoring data, not
/// synchronization.
#[derive(Debug, Default)]
pub struct FanoutMetrics {
    enqueued: AtomicU64,
    written: AtomicU64,
    dropped: AtomicU64,
    write_errors: AtomicU64,
}

impl FanoutMetrics {
    /// Buffers enqueued, summed across sinks.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Buffers written out, summed across sinks.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Buffers dropped at shutdown, summed across sinks.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Sink write failures (delivery to other sinks unaffected).
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }
}

type Buffer = Arc<Vec<u8>>;

struct PendingSink {
    index: usize,
    rx: Receiver<Buffer>,
    sink: Box<dyn Write + Send>,
}

struct Inner {
    /// Sinks paired with their receivers, held until `start` moves each
    /// into its worker thread.
    pending: Vec<PendingSink>,
    workers: Vec<JoinHandle<()>>,
}

/// Fan-out writer over N sinks.
///
/// `write` enqueues the same buffer reference onto every sink's bounded
/// queue; a full queue blocks the caller. Documented limitation: callers
/// issuing high write volume against a slow sink will stall on that sink's
/// queue.
pub struct FanoutWriter {
    config: FanoutConfig,
    senders: Mutex<Vec<SyncSender<Buffer>>>,
    inner: Mutex<Inner>,
    stopping: Arc<AtomicBool>,
    metrics: Arc<FanoutMetrics>,
}

impl FanoutWriter {
    /// Create a writer over the given sinks. Queues exist from this point;
    /// workers start draining them on [`FanoutWriter::start`].
    #[must_use]
    pub fn new(config: FanoutConfig, sinks: Vec<Box<dyn Write + Send>>) -> Self {
        let mut senders = Vec::with_capacity(sinks.len());
        let mut pending = Vec::with_capacity(sinks.len());
        for (index, sink) in sinks.into_iter().enumerate() {
            let (tx, rx) = sync_channel::<Buffer>(config.queue_capacity);
            senders.push(tx);
            pending.push(PendingSink { index, rx, sink });
        }
        Self {
            config,
            senders: Mutex::new(senders),
            inner: Mutex::new(Inner {
                pending,
                workers: Vec::new(),
            }),
            stopping: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(FanoutMetrics::default()),
        }
    }

    /// Delivery counters.
    #[must_use]
    pub fn metrics(&self) -> &Arc<FanoutMetrics> {
        &self.metrics
    }

    /// Launch one draining worker per sink.
    pub fn start(&self) {
        let mut inner = self.inner.lock().unwrap();
        for PendingSink { index, rx, sink } in inner.pending.drain(..).collect::<Vec<_>>() {
            let stopping = self.stopping.clone();
            let metrics = self.metrics.clone();
            let drain_timeout = self.config.drain_timeout;
            let handle = std::thread::Builder::new()
                .name(format!("fanout-sink-{index}"))
                .spawn(move || {
                    sink_worker(index, rx, sink, stopping, metrics, drain_timeout)
                })
                .expect("spawn fanout sink worker");
            inner.workers.push(handle);
        }
    }

    /// Enqueue `buf` onto every sink's queue.
    ///
    /// Blocks on any queue that is full. After `stop` the call becomes a
    /// logged no-op.
    pub fn write(&self, buf: &[u8]) {
        if self.stopping.load(Ordering::Relaxed) {
            warn!(len = buf.len(), "Write after fan-out writer stop, discarding");
            return;
        }
        let shared: Buffer = Arc::new(buf.to_vec());
        let senders = self.senders.lock().unwrap();
        for tx in senders.iter() {
            // blocks when the sink's queue is full
            if tx.send(shared.clone()).is_ok() {
                self.metrics.enqueued.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Signal shutdown, give each sink a bounded chance to drain, and block
    /// until every worker has exited.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Relaxed);
        // closing the channels wakes any worker blocked in recv
        self.senders.lock().unwrap().clear();
        let workers = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::take(&mut inner.workers)
        };
        for handle in workers {
            if handle.join().is_err() {
                warn!("Fan-out sink worker panicked during shutdown");
            }
        }
        debug!(
            written = self.metrics.written(),
            dropped = self.metrics.dropped(),
            "Fan-out writer stopped"
        );
    }
}

/// Managed-object adapter so a host can supervise the writer with the
/// lifecycle supervisor.
impl ManagedObject for FanoutWriter {
    fn start(&self) -> anyhow::Result<()> {
        FanoutWriter::start(self);
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        FanoutWriter::stop(self);
        Ok(())
    }
}

fn sink_worker(
    index: usize,
    rx: Receiver<Buffer>,
    mut sink: Box<dyn Write + Send>,
    stopping: Arc<AtomicBool>,
    metrics: Arc<FanoutMetrics>,
    drain_timeout: Duration,
) {
    debug!(sink = index, "Fan-out sink worker started");
    let mut drain_deadline: Option<Instant> = None;
    while let Ok(buf) = rx.recv() {
        if stopping.load(Ordering::Relaxed) && drain_deadline.is_none() {
            drain_deadline = Some(Instant::now() + drain_timeout);
        }
        if let Some(deadline) = drain_deadline {
            if Instant::now() >= deadline {
                let dropped = 1 + rx.try_iter().count() as u64;
                metrics.dropped.fetch_add(dropped, Ordering::Relaxed);
                warn!(
                    sink = index,
                    dropped = dropped,
                    "Drain timeout elapsed, dropping buffered data"
                );
                break;
            }
        }
        match sink.write_all(&buf).and_then(|()| sink.flush()) {
            Ok(()) => {
                metrics.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                warn!(sink = index, error = %e, "Sink write failed, continuing");
            }
        }
    }
    debug!(sink = index, "Fan-out sink worker exiting");
}

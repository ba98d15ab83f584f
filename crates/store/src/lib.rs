//! Sift store: caller-side plumbing around the discovery engine.
//!
//! - [`PoolBuilder`] folds deltas into immutable [`PoolSnapshot`]s.
//! - [`spawn_ingest`] runs that on a tokio task and publishes snapshots atomically.
//! - [`Sequencer`] tags discovery requests so stale responses can be dropped.

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use sift_core::{Delta, Item, ItemKey, PoolSnapshot};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Coalescing queue keyed by item with FIFO order and fixed capacity.
///
/// A pending delta only matters until the next batch is applied, and the
/// newest change per item wins anyway, so overflow sheds the oldest pending
/// key rather than blocking the sender; sheds are counted in
/// `ingest_dropped_total`.
pub struct Coalescer {
    map: FxHashMap<ItemKey, Delta>,
    order: VecDeque<ItemKey>,
    cap: usize,
    dropped: u64,
}

impl Coalescer {
    pub fn with_capacity(cap: usize) -> Self {
        Self { map: FxHashMap::default(), order: VecDeque::new(), cap: cap.max(1), dropped: 0 }
    }

    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }
    pub fn dropped(&self) -> u64 { self.dropped }

    /// Later deltas for a key replace earlier ones in place. A new key over
    /// capacity evicts the oldest pending key.
    pub fn push(&mut self, d: Delta) {
        let key = d.key();
        if !self.map.contains_key(&key) {
            if self.order.len() >= self.cap {
                if let Some(old) = self.order.pop_front() {
                    self.map.remove(&old);
                    self.dropped += 1;
                    metrics::counter!("ingest_dropped_total", 1);
                    warn!(kind = %old.kind, id = %old.id, "coalescer full; dropped oldest pending delta");
                }
            }
            self.order.push_back(key.clone());
        }
        self.map.insert(key, d);
    }

    pub fn drain_ready(&mut self) -> Vec<Delta> {
        let mut out = Vec::with_capacity(self.order.len());
        while let Some(key) = self.order.pop_front() {
            if let Some(d) = self.map.remove(&key) {
                out.push(d);
            }
        }
        out
    }
}

/// Builds pool snapshots from deltas. Pool order is first-insert order.
#[derive(Default)]
pub struct PoolBuilder {
    epoch: u64,
    items: Vec<Item>,
    index: FxHashMap<ItemKey, usize>,
}

impl PoolBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn from_items(items: Vec<Item>) -> Self {
        let mut b = Self::new();
        b.apply(items.into_iter().map(Delta::Upsert).collect());
        b
    }

    pub fn epoch(&self) -> u64 { self.epoch }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Apply one batch; the epoch advances once per batch.
    pub fn apply(&mut self, batch: Vec<Delta>) {
        for d in batch {
            match d {
                Delta::Upsert(item) => {
                    let key = item.key();
                    match self.index.get(&key) {
                        Some(&idx) => self.items[idx] = item,
                        None => {
                            self.index.insert(key, self.items.len());
                            self.items.push(item);
                        }
                    }
                }
                Delta::Remove(key) => {
                    if let Some(idx) = self.index.remove(&key) {
                        self.items.remove(idx);
                        for (i, it) in self.items.iter().enumerate().skip(idx) {
                            self.index.insert(it.key(), i);
                        }
                    }
                }
            }
        }
        self.epoch = self.epoch.saturating_add(1);
        metrics::gauge!("pool_items", self.items.len() as f64);
    }

    pub fn freeze(&self) -> Arc<PoolSnapshot> {
        Arc::new(PoolSnapshot { epoch: self.epoch, items: self.items.clone() })
    }
}

/// Readers' view of the ingest loop: the current snapshot plus epoch notifications.
#[derive(Clone)]
pub struct PoolHandle {
    snap: Arc<ArcSwap<PoolSnapshot>>,
    epoch_rx: watch::Receiver<u64>,
}

impl PoolHandle {
    pub fn current(&self) -> Arc<PoolSnapshot> { self.snap.load_full() }
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> { self.epoch_rx.clone() }
}

/// Spawn an ingest loop consuming deltas and swapping snapshots. The loop
/// drains and exits once every sender is dropped.
pub fn spawn_ingest(cap: usize) -> (mpsc::Sender<Delta>, PoolHandle) {
    let (tx, mut rx) = mpsc::channel::<Delta>(cap.max(1));
    let snap = Arc::new(ArcSwap::from_pointee(PoolSnapshot::default()));
    let (epoch_tx, epoch_rx) = watch::channel(0u64);
    let snap_clone = Arc::clone(&snap);

    tokio::spawn(async move {
        let mut coalescer = Coalescer::with_capacity(cap);
        let mut builder = PoolBuilder::new();
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(8));
        let publish = |coalescer: &mut Coalescer, builder: &mut PoolBuilder| {
            let batch = coalescer.drain_ready();
            if batch.is_empty() {
                return;
            }
            builder.apply(batch);
            let next = builder.freeze();
            let epoch = next.epoch;
            snap_clone.store(next);
            let _ = epoch_tx.send(epoch);
        };
        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    match maybe {
                        Some(d) => coalescer.push(d),
                        None => {
                            debug!("delta channel closed; draining and exiting ingest loop");
                            publish(&mut coalescer, &mut builder);
                            break;
                        }
                    }
                }
                _ = ticker.tick() => publish(&mut coalescer, &mut builder),
            }
        }
        info!(epoch = builder.epoch(), items = builder.len(), dropped = coalescer.dropped(), "ingest loop stopped");
    });

    (tx, PoolHandle { snap, epoch_rx })
}

/// Monotonic request number handed out by a [`Sequencer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(self) -> u64 { self.0 }
}

/// A response tagged with the ticket of the request that produced it.
#[derive(Debug, Clone)]
pub struct Sequenced<T> {
    pub ticket: Ticket,
    pub value: T,
}

/// Issues request tickets; only the most recently issued one is current.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self { Self::default() }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// The response value if it answers the latest request; stale responses are dropped.
    pub fn accept<T>(&self, response: Sequenced<T>) -> Option<T> {
        if self.is_latest(response.ticket) {
            Some(response.value)
        } else {
            debug!(ticket = response.ticket.0, latest = self.latest.load(Ordering::SeqCst), "discarding stale response");
            None
        }
    }
}

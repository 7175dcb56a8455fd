//! Observation of running turns.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::Instrument;

use crate::agent::TurnStage;
use crate::filter::TranslationFilter;
use crate::transcript::Entry;

/// The state of a turn at one point in time.
#[derive(Clone, Debug)]
pub struct Snapshot {
    entries: Vec<Arc<Entry>>,
    stage: TurnStage,
}

impl Snapshot {
    /// Returns all entries of the transcript at this point.
    #[inline]
    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    /// Returns the most recently appended entry.
    #[inline]
    pub fn latest(&self) -> Option<&Arc<Entry>> {
        self.entries.last()
    }

    /// Returns the stage the turn was in.
    #[inline]
    pub fn stage(&self) -> TurnStage {
        self.stage
    }
}

/// A stream of [`Snapshot`]s of one turn.
///
/// A snapshot is emitted whenever an entry is appended, and once more when
/// the turn fails. Snapshots are buffered without bound, so a slow consumer
/// never holds the turn back and never misses a snapshot. The stream ends
/// after the turn has finished and all snapshots have been taken.
#[derive(Debug)]
pub struct ObservationStream {
    rx: UnboundedReceiver<Snapshot>,
}

impl ObservationStream {
    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the turn is over and the stream is drained.
    #[inline]
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Waits for the turn to end and returns all remaining snapshots.
    pub async fn collect(&mut self) -> Vec<Snapshot> {
        let mut snapshots = vec![];
        while let Some(snapshot) = self.next().await {
            snapshots.push(snapshot);
        }
        snapshots
    }
}

/// The sending half, owned by the turn loop.
#[derive(Clone, Debug)]
pub(crate) struct Observer {
    tx: UnboundedSender<Snapshot>,
}

impl Observer {
    pub(crate) fn emit(&self, entries: &[Arc<Entry>], stage: TurnStage) {
        let snapshot = Snapshot {
            entries: entries.to_vec(),
            stage,
        };
        // Nobody is watching once the stream is dropped, which is fine.
        self.tx.send(snapshot).ok();
    }
}

/// Creates a connected observer and stream.
///
/// With a filter, snapshots pass through a forwarding task that replaces
/// every entry with its translation. Each entry is translated only once.
pub(crate) fn channel(
    filter: Option<TranslationFilter>,
) -> (Observer, ObservationStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let Some(filter) = filter else {
        return (Observer { tx }, ObservationStream { rx });
    };

    let (filtered_tx, filtered_rx) = mpsc::unbounded_channel();
    tokio::spawn(
        forward_translated(rx, filtered_tx, filter)
            .instrument(trace_span!("translation filter")),
    );
    (Observer { tx }, ObservationStream { rx: filtered_rx })
}

async fn forward_translated(
    mut rx: UnboundedReceiver<Snapshot>,
    tx: UnboundedSender<Snapshot>,
    filter: TranslationFilter,
) {
    let mut translated: HashMap<u64, Arc<Entry>> = HashMap::new();
    while let Some(snapshot) = rx.recv().await {
        let mut entries = Vec::with_capacity(snapshot.entries.len());
        for entry in &snapshot.entries {
            let entry = match translated.get(&entry.seq()) {
                Some(entry) => Arc::clone(entry),
                None => {
                    let entry = filter.apply_entry(entry).await;
                    translated.insert(entry.seq(), Arc::clone(&entry));
                    entry
                }
            };
            entries.push(entry);
        }
        let snapshot = Snapshot {
            entries,
            stage: snapshot.stage,
        };
        if tx.send(snapshot).is_err() {
            trace!("observation stream dropped, stop translating");
            break;
        }
    }
}

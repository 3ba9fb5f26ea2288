//! Catalog State Store
//!
//! Holds the current catalog as an `Arc<CatalogSnapshot>` behind a
//! `parking_lot::RwLock`. Every mutation builds a new snapshot and swaps the
//! pointer, then notifies subscribers with the snapshot lock released.
//! Publishing is serialised by a re-entrant dispatch lock held from before the
//! swap until the last listener returns, so listeners see versions in order.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::Serialize;

use mb_core::{CatalogRecord, ImportRecord, Prize};
use mb_lottery::{DEFAULT_TICKET_SPACE, TicketTable};

use crate::error::{CatalogError, CatalogResult};
use crate::snapshot::CatalogSnapshot;

type Listener = Arc<dyn Fn(&Arc<CatalogSnapshot>) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Outcome of importing catalog records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Ids whose odds were replaced
    pub updated: Vec<String>,
    /// Ids with no matching prize (ignored)
    pub unmatched: Vec<String>,
    /// Records that failed validation
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub id: String,
    pub reason: String,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty() && self.rejected.is_empty()
    }
}

/// Reactive prize catalog
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
    registry: Arc<Mutex<ListenerRegistry>>,
    dispatch: ReentrantMutex<()>,
}

impl CatalogStore {
    pub fn new(prizes: Vec<Prize>) -> CatalogResult<Self> {
        Self::with_ticket_space(prizes, DEFAULT_TICKET_SPACE)
    }

    pub fn with_ticket_space(prizes: Vec<Prize>, ticket_space: u64) -> CatalogResult<Self> {
        check_unique_ids(&prizes)?;
        Ok(Self::from_parts(prizes, ticket_space))
    }

    fn from_parts(prizes: Vec<Prize>, ticket_space: u64) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::new(1, ticket_space, prizes))),
            registry: Arc::new(Mutex::new(ListenerRegistry::default())),
            dispatch: ReentrantMutex::new(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current snapshot (cheap pointer clone)
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    pub fn prizes(&self) -> Vec<Prize> {
        self.snapshot().prizes().to_vec()
    }

    /// Ticket table of the current snapshot (cached per snapshot)
    pub fn ticket_table(&self) -> CatalogResult<Arc<TicketTable>> {
        Ok(self.snapshot().ticket_table()?)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBSCRIBE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a listener
    ///
    /// The listener receives the current snapshot right away and every new
    /// snapshot after that, until the returned `Subscription` is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<CatalogSnapshot>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let _dispatch = self.dispatch.lock();
        let id = {
            let mut registry = self.registry.lock();
            registry.next_id += 1;
            let id = registry.next_id;
            registry.listeners.push((id, listener.clone()));
            id
        };

        listener(&self.snapshot());

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    fn notify(&self, snapshot: &Arc<CatalogSnapshot>) {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            // A listener re-entered the store and already delivered a newer version
            if self.version() > snapshot.version() {
                log::debug!("Delivery of catalog v{} superseded", snapshot.version());
                break;
            }
            listener(snapshot);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply `edit` to a copy of the prize list and publish the result
    ///
    /// The edit runs under the write lock, so concurrent mutations are
    /// serialised and none is lost. On error nothing is published.
    ///
    /// `edit` must not call back into this store (not even `snapshot()` or
    /// `version()`): the lock is not re-entrant and the call deadlocks.
    pub fn update<F>(&self, edit: F) -> CatalogResult<Arc<CatalogSnapshot>>
    where
        F: FnOnce(&mut Vec<Prize>) -> CatalogResult<()>,
    {
        match self.publish(|prizes| edit(prizes).map(|()| true))? {
            Some(snapshot) => Ok(snapshot),
            None => Ok(self.snapshot()),
        }
    }

    /// Replace the whole catalog
    pub fn set_prizes(&self, prizes: Vec<Prize>) -> CatalogResult<Arc<CatalogSnapshot>> {
        self.update(move |current| {
            *current = prizes;
            Ok(())
        })
    }

    /// Insert a prize or replace the one with the same id (position kept)
    pub fn upsert_prize(&self, prize: Prize) -> CatalogResult<Arc<CatalogSnapshot>> {
        self.update(move |prizes| {
            match prizes.iter_mut().find(|p| p.id == prize.id) {
                Some(existing) => *existing = prize,
                None => prizes.push(prize),
            }
            Ok(())
        })
    }

    /// Remove a prize, returning it
    pub fn remove_prize(&self, id: &str) -> CatalogResult<Prize> {
        let mut removed = None;
        self.update(|prizes| {
            let index = prizes
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| CatalogError::UnknownPrize(id.to_string()))?;
            removed = Some(prizes.remove(index));
            Ok(())
        })?;
        removed.ok_or_else(|| CatalogError::UnknownPrize(id.to_string()))
    }

    /// Change one prize's odds weight
    pub fn set_odds(&self, id: &str, odds: f64) -> CatalogResult<Arc<CatalogSnapshot>> {
        if !odds.is_finite() || odds < 0.0 {
            return Err(CatalogError::InvalidOdds {
                id: id.to_string(),
                odds,
            });
        }
        self.update(|prizes| {
            let prize = prizes
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| CatalogError::UnknownPrize(id.to_string()))?;
            prize.weight = odds;
            Ok(())
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // IMPORT / EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn export_records(&self) -> Vec<CatalogRecord> {
        self.snapshot().records()
    }

    pub fn export_json(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_records())?)
    }

    /// Apply imported odds to prizes with matching ids
    ///
    /// Nothing but `odds` changes; unknown ids are reported and skipped.
    /// A single snapshot is published if anything changed.
    pub fn import_records(&self, records: Vec<ImportRecord>) -> CatalogResult<ImportReport> {
        let mut report = ImportReport::default();

        self.publish(|prizes| {
            for record in &records {
                if let Err(issue) = record.validate() {
                    report.rejected.push(RejectedRecord {
                        id: record.id.clone(),
                        reason: issue.describe().to_string(),
                    });
                    continue;
                }
                match prizes.iter_mut().find(|p| p.id == record.id) {
                    Some(prize) => {
                        prize.weight = record.odds;
                        report.updated.push(record.id.clone());
                    }
                    None => report.unmatched.push(record.id.clone()),
                }
            }
            Ok(!report.updated.is_empty())
        })?;

        for rejected in &report.rejected {
            log::warn!("Import rejected '{}': {}", rejected.id, rejected.reason);
        }
        if !report.unmatched.is_empty() {
            log::warn!("Import ignored unknown ids: {:?}", report.unmatched);
        }
        Ok(report)
    }

    pub fn import_json(&self, json: &str) -> CatalogResult<ImportReport> {
        let records: Vec<ImportRecord> = serde_json::from_str(json)?;
        self.import_records(records)
    }

    /// Write the export records as pretty JSON
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> CatalogResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.export_json()?)?;
        log::info!("Catalog saved to {}", path.display());
        Ok(())
    }

    /// Restore odds from a backup written by `save_to_file`
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> CatalogResult<ImportReport> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let report = self.import_json(&json)?;
        log::info!(
            "Catalog odds loaded from {} ({} updated)",
            path.display(),
            report.updated.len()
        );
        Ok(report)
    }

    /// Swap in the edited prize list and deliver it
    ///
    /// Publishes only when `edit` reports a change.
    fn publish<F>(&self, edit: F) -> CatalogResult<Option<Arc<CatalogSnapshot>>>
    where
        F: FnOnce(&mut Vec<Prize>) -> CatalogResult<bool>,
    {
        let _dispatch = self.dispatch.lock();

        let snapshot = {
            let mut current = self.current.write();
            let mut prizes = current.prizes().to_vec();
            if !edit(&mut prizes)? {
                return Ok(None);
            }
            check_unique_ids(&prizes)?;

            let next = Arc::new(CatalogSnapshot::new(
                current.version() + 1,
                current.ticket_space(),
                prizes,
            ));
            *current = next.clone();
            next
        };

        log::info!(
            "Catalog v{} published ({} prizes)",
            snapshot.version(),
            snapshot.len()
        );
        self.notify(&snapshot);
        Ok(Some(snapshot))
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::from_parts(Vec::new(), DEFAULT_TICKET_SPACE)
    }
}

/// Keeps a listener registered; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {}

    fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

fn check_unique_ids(prizes: &[Prize]) -> CatalogResult<()> {
    let mut seen = HashSet::with_capacity(prizes.len());
    for prize in prizes {
        if !seen.insert(prize.id.as_str()) {
            return Err(CatalogError::DuplicatePrize(prize.id.clone()));
        }
    }
    Ok(())
}

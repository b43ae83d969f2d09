//! Payment timeout scheduling
//!
//! Each pending booking gets a cancellable timer. When a timer fires the
//! booking id is queued to [`ExpiryWorker`], which re-checks the booking
//! under a write transaction and cancels it only if it is still pending.
//!
//! Deadlines are also recorded in storage (`expirations` table), so a
//! restart re-arms them ([`ExpiryScheduler::rearm`]) and a periodic sweep
//! catches anything whose timer was lost.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use shared::util::now_millis;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::BookingService;
use crate::storage::{BookingStorage, StorageResult};

/// How often the sweep looks for overdue deadlines
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Timer {
    generation: u64,
    token: CancellationToken,
}

pub struct ExpiryScheduler {
    timers: Arc<DashMap<i64, Timer>>,
    generation: AtomicU64,
    tx: mpsc::UnboundedSender<i64>,
    root: CancellationToken,
}

impl ExpiryScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<i64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            timers: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            tx,
            root: CancellationToken::new(),
        };
        (scheduler, rx)
    }

    /// Arm (or re-arm) the timer for `booking_id`, firing at `due_at` (Unix millis)
    ///
    /// Overdue deadlines fire immediately. Must be called inside a Tokio runtime.
    pub fn schedule(&self, booking_id: i64, due_at: i64) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        if let Some(previous) = self.timers.insert(
            booking_id,
            Timer {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }

        let delay = Duration::from_millis(due_at.saturating_sub(now_millis()).max(0) as u64);
        let timers = self.timers.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    timers.remove_if(&booking_id, |_, t| t.generation == generation);
                    if tx.send(booking_id).is_err() {
                        tracing::debug!(booking_id, "Expiry worker gone, timer dropped");
                    }
                }
            }
        });
    }

    /// Disarm the timer; no-op when none is armed
    pub fn cancel(&self, booking_id: i64) {
        if let Some((_, timer)) = self.timers.remove(&booking_id) {
            timer.token.cancel();
        }
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_armed(&self, booking_id: i64) -> bool {
        self.timers.contains_key(&booking_id)
    }

    /// Re-arm every deadline recorded in storage
    pub fn rearm(&self, storage: &BookingStorage) -> StorageResult<usize> {
        let entries = storage.list_expirations()?;
        for (booking_id, due_at) in &entries {
            self.schedule(*booking_id, *due_at);
        }
        Ok(entries.len())
    }

    /// Queue overdue deadlines that have no armed timer
    pub fn sweep_overdue(&self, storage: &BookingStorage) -> StorageResult<usize> {
        let now = now_millis();
        let mut queued = 0;
        for (booking_id, due_at) in storage.list_expirations()? {
            if due_at <= now && !self.is_armed(booking_id) && self.tx.send(booking_id).is_ok() {
                queued += 1;
            }
        }
        Ok(queued)
    }

    /// Cancel every timer
    pub fn shutdown(&self) {
        self.root.cancel();
        self.timers.clear();
    }
}

/// Consumes fired timers and expires the bookings
pub struct ExpiryWorker {
    service: BookingService,
    rx: mpsc::UnboundedReceiver<i64>,
}

impl ExpiryWorker {
    pub fn new(service: BookingService, rx: mpsc::UnboundedReceiver<i64>) -> Self {
        Self { service, rx }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Expiry worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(booking_id) => self.handle(booking_id),
                    None => break,
                },
            }
        }
        tracing::info!("Expiry worker stopped");
    }

    fn handle(&self, booking_id: i64) {
        match self.service.expire_if_pending(booking_id) {
            Ok(Some(_)) => tracing::info!(booking_id, "Pending booking expired"),
            Ok(None) => tracing::debug!(booking_id, "Expiry skipped, booking no longer pending"),
            Err(e) => tracing::error!(booking_id, error = %e, "Failed to expire booking"),
        }
    }
}

/// Periodic safety net for deadlines whose timers were lost
pub async fn run_sweeper(
    scheduler: Arc<ExpiryScheduler>,
    storage: BookingStorage,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => match scheduler.sweep_overdue(&storage) {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "Sweep queued overdue bookings"),
                Err(e) => tracing::warn!(error = %e, "Expiry sweep failed"),
            },
        }
    }
}

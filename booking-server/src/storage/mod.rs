//! redb-based storage layer for venues, bookings and coupons
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `venues` | `venue_id` | `Venue` | Venue aggregate incl. table/room occupancy |
//! | `bookings` | `booking_id` | `Booking` | Booking records |
//! | `venue_bookings` | `(venue_id, booking_id)` | `()` | Per-venue booking index |
//! | `user_bookings` | `(user_id, booking_id)` | `()` | Per-user booking index |
//! | `coupons` | `code` | `Coupon` | Coupon definitions (normalized code) |
//! | `expirations` | `booking_id` | `due_at` | Durable payment-timeout schedule |
//!
//! # Atomicity
//!
//! A booking claim touches `venues`, `bookings`, both indexes and
//! `expirations` inside one `WriteTransaction`. redb serializes write
//! transactions, so two claims for the same unit can never both commit.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{Booking, Coupon, Venue};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::AppError;

/// Venues: key = venue_id, value = JSON-serialized Venue
const VENUES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("venues");

/// Bookings: key = booking_id, value = JSON-serialized Booking
const BOOKINGS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("bookings");

/// Index: key = (venue_id, booking_id)
const VENUE_BOOKINGS_TABLE: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("venue_bookings");

/// Index: key = (user_id, booking_id)
const USER_BOOKINGS_TABLE: TableDefinition<(&str, i64), ()> =
    TableDefinition::new("user_bookings");

/// Coupons: key = normalized code, value = JSON-serialized Coupon
const COUPONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("coupons");

/// Pending payment deadlines: key = booking_id, value = due_at (Unix millis)
const EXPIRATIONS_TABLE: TableDefinition<i64, i64> = TableDefinition::new("expirations");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Coupon already exists: {0}")]
    CouponExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage error");
        AppError::database(err.to_string())
    }
}

/// Booking storage backed by redb
#[derive(Clone)]
pub struct BookingStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for BookingStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStorage").finish_non_exhaustive()
    }
}

impl BookingStorage {
    /// Open or create the database at the given path
    ///
    /// redb uses `Durability::Immediate` by default: commits are persistent
    /// as soon as `commit()` returns.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, ephemeral deployments)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables so read transactions never see a missing table
            let _ = write_txn.open_table(VENUES_TABLE)?;
            let _ = write_txn.open_table(BOOKINGS_TABLE)?;
            let _ = write_txn.open_table(VENUE_BOOKINGS_TABLE)?;
            let _ = write_txn.open_table(USER_BOOKINGS_TABLE)?;
            let _ = write_txn.open_table(COUPONS_TABLE)?;
            let _ = write_txn.open_table(EXPIRATIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Open a read transaction on the venues table (health check)
    pub fn ping(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(VENUES_TABLE)?;
        Ok(())
    }

    // ========== Venue Operations ==========

    /// Insert or replace a venue (within transaction)
    pub fn put_venue(&self, txn: &WriteTransaction, venue: &Venue) -> StorageResult<()> {
        let mut table = txn.open_table(VENUES_TABLE)?;
        let value = serde_json::to_vec(venue)?;
        table.insert(venue.id, value.as_slice())?;
        Ok(())
    }

    /// Get a venue (within transaction)
    pub fn get_venue_txn(&self, txn: &WriteTransaction, venue_id: i64) -> StorageResult<Option<Venue>> {
        let table = txn.open_table(VENUES_TABLE)?;
        match table.get(venue_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a venue
    pub fn get_venue(&self, venue_id: i64) -> StorageResult<Option<Venue>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VENUES_TABLE)?;
        match table.get(venue_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Booking Operations ==========

    /// Insert or replace a booking and keep both indexes in sync (within transaction)
    pub fn put_booking(&self, txn: &WriteTransaction, booking: &Booking) -> StorageResult<()> {
        {
            let mut table = txn.open_table(BOOKINGS_TABLE)?;
            let value = serde_json::to_vec(booking)?;
            table.insert(booking.id, value.as_slice())?;
        }
        {
            let mut table = txn.open_table(VENUE_BOOKINGS_TABLE)?;
            table.insert((booking.venue_id, booking.id), ())?;
        }
        let mut table = txn.open_table(USER_BOOKINGS_TABLE)?;
        table.insert((booking.user_id.as_str(), booking.id), ())?;
        Ok(())
    }

    /// Get a booking (within transaction)
    pub fn get_booking_txn(
        &self,
        txn: &WriteTransaction,
        booking_id: i64,
    ) -> StorageResult<Option<Booking>> {
        let table = txn.open_table(BOOKINGS_TABLE)?;
        match table.get(booking_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a booking
    pub fn get_booking(&self, booking_id: i64) -> StorageResult<Option<Booking>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BOOKINGS_TABLE)?;
        match table.get(booking_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All bookings of a venue (within transaction)
    pub fn bookings_for_venue_txn(
        &self,
        txn: &WriteTransaction,
        venue_id: i64,
    ) -> StorageResult<Vec<Booking>> {
        let index = txn.open_table(VENUE_BOOKINGS_TABLE)?;
        let mut ids = Vec::new();
        for result in index.range((venue_id, i64::MIN)..=(venue_id, i64::MAX))? {
            let (key, _) = result?;
            ids.push(key.value().1);
        }
        drop(index);

        let table = txn.open_table(BOOKINGS_TABLE)?;
        let mut bookings = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(guard) = table.get(id)? {
                bookings.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(bookings)
    }

    /// All bookings of a venue
    pub fn bookings_for_venue(&self, venue_id: i64) -> StorageResult<Vec<Booking>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(VENUE_BOOKINGS_TABLE)?;
        let table = read_txn.open_table(BOOKINGS_TABLE)?;

        let mut bookings = Vec::new();
        for result in index.range((venue_id, i64::MIN)..=(venue_id, i64::MAX))? {
            let (key, _) = result?;
            if let Some(guard) = table.get(key.value().1)? {
                bookings.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(bookings)
    }

    /// All bookings made by a user, oldest first
    pub fn bookings_for_user(&self, user_id: &str) -> StorageResult<Vec<Booking>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_BOOKINGS_TABLE)?;
        let table = read_txn.open_table(BOOKINGS_TABLE)?;

        let mut bookings = Vec::new();
        for result in index.range((user_id, i64::MIN)..=(user_id, i64::MAX))? {
            let (key, _) = result?;
            if let Some(guard) = table.get(key.value().1)? {
                bookings.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(bookings)
    }

    // ========== Coupon Operations ==========

    /// Insert a new coupon; fails if the code is taken
    pub fn insert_coupon(&self, coupon: &Coupon) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        let mut table = txn.open_table(COUPONS_TABLE)?;
        if table.get(coupon.code.as_str())?.is_some() {
            drop(table);
            txn.abort()?;
            return Err(StorageError::CouponExists(coupon.code.clone()));
        }
        let value = serde_json::to_vec(coupon)?;
        table.insert(coupon.code.as_str(), value.as_slice())?;
        drop(table);
        txn.commit()?;
        Ok(())
    }

    /// Replace an existing coupon record
    pub fn put_coupon(&self, coupon: &Coupon) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        let mut table = txn.open_table(COUPONS_TABLE)?;
        let value = serde_json::to_vec(coupon)?;
        table.insert(coupon.code.as_str(), value.as_slice())?;
        drop(table);
        txn.commit()?;
        Ok(())
    }

    /// Get a coupon by normalized code
    pub fn get_coupon(&self, code: &str) -> StorageResult<Option<Coupon>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUPONS_TABLE)?;
        match table.get(code)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Expiration Schedule ==========

    /// Record a payment deadline (within transaction)
    pub fn put_expiration(
        &self,
        txn: &WriteTransaction,
        booking_id: i64,
        due_at: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(EXPIRATIONS_TABLE)?;
        table.insert(booking_id, due_at)?;
        Ok(())
    }

    /// Drop a payment deadline (within transaction); no-op when absent
    pub fn remove_expiration(&self, txn: &WriteTransaction, booking_id: i64) -> StorageResult<()> {
        let mut table = txn.open_table(EXPIRATIONS_TABLE)?;
        table.remove(booking_id)?;
        Ok(())
    }

    /// All recorded deadlines as `(booking_id, due_at)`
    pub fn list_expirations(&self) -> StorageResult<Vec<(i64, i64)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXPIRATIONS_TABLE)?;
        let mut entries = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            entries.push((key.value(), value.value()));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        BookingStatus, BookingWindow, CouponKind, FeeSchedule, Payment, PaymentStatus,
        PricingBreakdown, RateCard, VenueKind,
    };

    fn venue(id: i64) -> Venue {
        Venue {
            id,
            kind: VenueKind::Hall,
            name: "Grand".into(),
            owner_id: "owner-1".into(),
            currency: "USD".into(),
            rates: RateCard { unit_rate: 1000.0 },
            fees: FeeSchedule::default(),
            tables: vec![],
            rooms: vec![],
            hall: None,
            opening: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn booking(id: i64, venue_id: i64, user_id: &str) -> Booking {
        Booking {
            id,
            kind: VenueKind::Hall,
            venue_id,
            owner_id: "owner-1".into(),
            user_id: user_id.into(),
            sub_resource_ids: vec![],
            window: BookingWindow::Days {
                start_date: "2026-03-02".into(),
                end_date: "2026-03-04".into(),
            },
            guests: 100,
            quantity: 1,
            status: BookingStatus::Pending,
            breakdown: PricingBreakdown {
                unit_rate: 1000.0,
                quantity: 3.0,
                base_subtotal: 3000.0,
                multipliers: vec![],
                adjusted_subtotal: 3000.0,
                discounts: vec![],
                discount_total: 0.0,
                subtotal_after_discount: 3000.0,
                tax_percentage: 0.0,
                tax_amount: 0.0,
                fees: vec![],
                fee_total: 0.0,
                total: 3000.0,
                currency: "USD".into(),
            },
            coupon_code: None,
            payment: Payment {
                status: PaymentStatus::Pending,
                method: None,
                transaction_id: None,
                paid_amount: 0.0,
                paid_at: None,
                updated_at: 0,
            },
            checked_in_at: None,
            checked_out_at: None,
            cancelled_by: None,
            cancel_reason: None,
            expires_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_venue_roundtrip() {
        let storage = BookingStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_venue(&txn, &venue(1)).unwrap();
        assert_eq!(storage.get_venue_txn(&txn, 1).unwrap().unwrap().name, "Grand");
        txn.commit().unwrap();

        assert!(storage.get_venue(1).unwrap().is_some());
        assert!(storage.get_venue(2).unwrap().is_none());
    }

    #[test]
    fn test_aborted_transaction_leaves_no_trace() {
        let storage = BookingStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_booking(&txn, &booking(10, 1, "u1")).unwrap();
        txn.abort().unwrap();

        assert!(storage.get_booking(10).unwrap().is_none());
        assert!(storage.bookings_for_user("u1").unwrap().is_empty());
    }

    #[test]
    fn test_booking_indexes() {
        let storage = BookingStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_booking(&txn, &booking(10, 1, "u1")).unwrap();
        storage.put_booking(&txn, &booking(11, 1, "u2")).unwrap();
        storage.put_booking(&txn, &booking(12, 2, "u1")).unwrap();
        assert_eq!(storage.bookings_for_venue_txn(&txn, 1).unwrap().len(), 2);
        txn.commit().unwrap();

        let venue_ids: Vec<i64> = storage
            .bookings_for_venue(1)
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(venue_ids, vec![10, 11]);

        let user_ids: Vec<i64> = storage
            .bookings_for_user("u1")
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(user_ids, vec![10, 12]);

        // Re-putting an updated record does not duplicate index entries
        let txn = storage.begin_write().unwrap();
        let mut updated = booking(10, 1, "u1");
        updated.status = BookingStatus::Cancelled;
        storage.put_booking(&txn, &updated).unwrap();
        txn.commit().unwrap();
        assert_eq!(storage.bookings_for_venue(1).unwrap().len(), 2);
        assert_eq!(
            storage.get_booking(10).unwrap().unwrap().status,
            BookingStatus::Cancelled
        );
    }

    #[test]
    fn test_coupon_uniqueness() {
        let storage = BookingStorage::open_in_memory().unwrap();
        let coupon = Coupon {
            code: "SAVE10".into(),
            kind: CouponKind::Percentage,
            value: 10.0,
            is_active: true,
            expires_at: i64::MAX,
            description: None,
            created_at: 0,
        };
        storage.insert_coupon(&coupon).unwrap();
        assert!(matches!(
            storage.insert_coupon(&coupon),
            Err(StorageError::CouponExists(_))
        ));

        let mut inactive = coupon.clone();
        inactive.is_active = false;
        storage.put_coupon(&inactive).unwrap();
        assert!(!storage.get_coupon("SAVE10").unwrap().unwrap().is_active);
        assert!(storage.get_coupon("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_expirations() {
        let storage = BookingStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_expiration(&txn, 10, 1_000).unwrap();
        storage.put_expiration(&txn, 11, 2_000).unwrap();
        txn.commit().unwrap();
        assert_eq!(storage.list_expirations().unwrap(), vec![(10, 1_000), (11, 2_000)]);

        let txn = storage.begin_write().unwrap();
        storage.remove_expiration(&txn, 10).unwrap();
        storage.remove_expiration(&txn, 99).unwrap();
        txn.commit().unwrap();
        assert_eq!(storage.list_expirations().unwrap(), vec![(11, 2_000)]);
    }

    #[test]
    fn test_file_backed_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookings.redb");
        {
            let storage = BookingStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage.put_venue(&txn, &venue(7)).unwrap();
            txn.commit().unwrap();
        }
        let storage = BookingStorage::open(&path).unwrap();
        assert!(storage.get_venue(7).unwrap().is_some());
    }
}

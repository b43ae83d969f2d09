//! Coupon resolution
//!
//! Looks a code up, checks it is usable right now and converts it into the
//! [`AppliedCoupon`] the pricing engine consumes.

use std::sync::Arc;

use rust_decimal::prelude::*;
use shared::models::{Coupon, CouponKind, normalize_coupon_code};

use super::CouponError;
use crate::pricing::{AppliedCoupon, CouponDiscount, to_decimal};
use crate::storage::{BookingStorage, StorageResult};

/// Where coupon definitions live
pub trait CouponSource: Send + Sync {
    fn find(&self, code: &str) -> StorageResult<Option<Coupon>>;

    /// Persist `is_active = false` for an expired coupon
    fn deactivate(&self, coupon: &Coupon) -> StorageResult<()>;
}

impl CouponSource for BookingStorage {
    fn find(&self, code: &str) -> StorageResult<Option<Coupon>> {
        self.get_coupon(code)
    }

    fn deactivate(&self, coupon: &Coupon) -> StorageResult<()> {
        let mut updated = coupon.clone();
        updated.is_active = false;
        self.put_coupon(&updated)
    }
}

#[derive(Clone)]
pub struct CouponResolver {
    source: Arc<dyn CouponSource>,
}

impl CouponResolver {
    pub fn new(source: Arc<dyn CouponSource>) -> Self {
        Self { source }
    }

    /// Resolve `code` against `context_amount` (the surcharged subtotal)
    ///
    /// An expired coupon still marked active is deactivated on the way out;
    /// a failed write-back is logged and does not change the outcome.
    pub fn resolve(
        &self,
        code: &str,
        context_amount: Decimal,
        now: i64,
    ) -> Result<AppliedCoupon, CouponError> {
        let code = normalize_coupon_code(code);
        if code.is_empty() {
            return Err(CouponError::NotFound(code));
        }

        let coupon = self
            .source
            .find(&code)?
            .ok_or_else(|| CouponError::NotFound(code.clone()))?;

        if !coupon.is_active {
            return Err(CouponError::Inactive(code));
        }

        if coupon.expires_at < now {
            if let Err(e) = self.source.deactivate(&coupon) {
                tracing::warn!(coupon = %code, error = %e, "Failed to deactivate expired coupon");
            } else {
                tracing::info!(coupon = %code, "Expired coupon deactivated");
            }
            return Err(CouponError::Expired(code));
        }

        let value = to_decimal(coupon.value);
        let discount = match coupon.kind {
            CouponKind::Percentage => {
                if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                    return Err(CouponError::InvalidValue(format!(
                        "Coupon {} has percentage {} outside (0, 100]",
                        code, coupon.value
                    )));
                }
                CouponDiscount::Percentage(value)
            }
            CouponKind::Flat => {
                if value <= Decimal::ZERO {
                    return Err(CouponError::InvalidValue(format!(
                        "Coupon {} has non-positive amount {}",
                        code, coupon.value
                    )));
                }
                CouponDiscount::Flat(value.min(context_amount.max(Decimal::ZERO)))
            }
        };

        Ok(AppliedCoupon { code, discount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory source that can be told to fail write-backs
    #[derive(Default)]
    struct MemorySource {
        coupons: Mutex<HashMap<String, Coupon>>,
        fail_deactivate: bool,
    }

    impl MemorySource {
        fn with(coupon: Coupon) -> Self {
            let source = Self::default();
            source.coupons.lock().insert(coupon.code.clone(), coupon);
            source
        }
    }

    impl CouponSource for MemorySource {
        fn find(&self, code: &str) -> StorageResult<Option<Coupon>> {
            Ok(self.coupons.lock().get(code).cloned())
        }

        fn deactivate(&self, coupon: &Coupon) -> StorageResult<()> {
            if self.fail_deactivate {
                return Err(StorageError::CouponExists(coupon.code.clone()));
            }
            if let Some(c) = self.coupons.lock().get_mut(&coupon.code) {
                c.is_active = false;
            }
            Ok(())
        }
    }

    fn coupon(code: &str, kind: CouponKind, value: f64, expires_at: i64) -> Coupon {
        Coupon {
            code: code.into(),
            kind,
            value,
            is_active: true,
            expires_at,
            description: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_resolves_percentage_case_insensitively() {
        let source = Arc::new(MemorySource::with(coupon("SAVE10", CouponKind::Percentage, 10.0, 5_000)));
        let resolver = CouponResolver::new(source);
        let applied = resolver.resolve(" save10 ", Decimal::from(100), 1_000).unwrap();
        assert_eq!(applied.code, "SAVE10");
        assert_eq!(applied.discount, CouponDiscount::Percentage(Decimal::from(10)));
    }

    #[test]
    fn test_flat_capped_at_context_amount() {
        let source = Arc::new(MemorySource::with(coupon("BIG", CouponKind::Flat, 500.0, 5_000)));
        let resolver = CouponResolver::new(source);
        let applied = resolver.resolve("BIG", Decimal::from(120), 1_000).unwrap();
        assert_eq!(applied.discount, CouponDiscount::Flat(Decimal::from(120)));
    }

    #[test]
    fn test_unknown_and_inactive() {
        let mut inactive = coupon("OFF", CouponKind::Flat, 5.0, 5_000);
        inactive.is_active = false;
        let resolver = CouponResolver::new(Arc::new(MemorySource::with(inactive)));
        assert!(matches!(
            resolver.resolve("NOPE", Decimal::ONE, 0),
            Err(CouponError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve("OFF", Decimal::ONE, 0),
            Err(CouponError::Inactive(_))
        ));
    }

    #[test]
    fn test_expired_coupon_is_deactivated() {
        let source = Arc::new(MemorySource::with(coupon("OLD", CouponKind::Percentage, 5.0, 1_000)));
        let resolver = CouponResolver::new(source.clone());
        assert!(matches!(
            resolver.resolve("OLD", Decimal::ONE, 2_000),
            Err(CouponError::Expired(_))
        ));
        assert!(!source.coupons.lock()["OLD"].is_active);
    }

    #[test]
    fn test_failed_write_back_still_reports_expired() {
        let mut source = MemorySource::with(coupon("OLD", CouponKind::Percentage, 5.0, 1_000));
        source.fail_deactivate = true;
        let resolver = CouponResolver::new(Arc::new(source));
        assert!(matches!(
            resolver.resolve("OLD", Decimal::ONE, 2_000),
            Err(CouponError::Expired(_))
        ));
    }

    #[test]
    fn test_out_of_range_values() {
        let resolver = CouponResolver::new(Arc::new(MemorySource::with(coupon(
            "HUGE",
            CouponKind::Percentage,
            150.0,
            5_000,
        ))));
        assert!(matches!(
            resolver.resolve("HUGE", Decimal::ONE, 0),
            Err(CouponError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_storage_backed_source() {
        let storage = BookingStorage::open_in_memory().unwrap();
        storage
            .insert_coupon(&coupon("STORE5", CouponKind::Flat, 5.0, 1_000))
            .unwrap();
        let resolver = CouponResolver::new(Arc::new(storage.clone()));
        assert!(resolver.resolve("store5", Decimal::from(50), 500).is_ok());
        assert!(resolver.resolve("store5", Decimal::from(50), 2_000).is_err());
        assert!(!storage.get_coupon("STORE5").unwrap().unwrap().is_active);
    }
}

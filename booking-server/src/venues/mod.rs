//! Venue registry
//!
//! Venues are created by owners (or admins on their behalf) and read on
//! every preview, booking and availability query. Reads go through a
//! short-lived cache; any write that changes a venue invalidates it.

use std::sync::Arc;
use std::time::Duration;

use shared::models::{
    DiningTable, HallSpec, OpeningHours, Room, Venue, VenueCreate, VenueKind,
};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::cache::TtlCache;
use crate::security_log;
use crate::storage::{BookingStorage, StorageError, StorageResult};
use crate::utils::time::parse_hhmm;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Clone)]
pub struct VenueService {
    storage: BookingStorage,
    cache: Arc<TtlCache<i64, Venue>>,
    default_currency: String,
}

impl VenueService {
    pub fn new(
        storage: BookingStorage,
        cache_ttl: Duration,
        cache_capacity: usize,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            cache: Arc::new(TtlCache::new(cache_ttl, cache_capacity)),
            default_currency: default_currency.into(),
        }
    }

    /// Register a venue of `kind`
    ///
    /// Owners create venues for themselves; admins may name another owner.
    pub fn create(
        &self,
        kind: VenueKind,
        payload: VenueCreate,
        actor: &CurrentUser,
    ) -> AppResult<Venue> {
        if !(actor.is_admin() || actor.is_owner()) {
            security_log!(
                "WARN",
                "venue_create_denied",
                user_id = actor.id.clone(),
                user_role = actor.role.as_str()
            );
            return Err(AppError::permission_denied(
                "Only venue owners and admins can create venues",
            ));
        }

        validate_payload(kind, &payload)?;

        let owner_id = match payload.owner_id {
            Some(owner) if actor.is_admin() && !owner.trim().is_empty() => owner.trim().to_string(),
            _ => actor.id.clone(),
        };
        let currency = payload
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_currency.clone());

        let tables = payload
            .tables
            .into_iter()
            .enumerate()
            .map(|(i, t)| DiningTable {
                id: i as i64 + 1,
                name: t.name.trim().to_string(),
                capacity: t.capacity,
                is_booked: false,
                current_booking: None,
            })
            .collect();
        let rooms = payload
            .rooms
            .into_iter()
            .enumerate()
            .map(|(i, r)| Room {
                id: i as i64 + 1,
                name: r.name.trim().to_string(),
                room_type: r.room_type.trim().to_string(),
                capacity: r.capacity,
                is_booked: false,
                current_booking: None,
            })
            .collect();

        let now = now_millis();
        let venue = Venue {
            id: snowflake_id(),
            kind,
            name: payload.name.trim().to_string(),
            owner_id,
            currency,
            rates: payload.rates,
            fees: payload.fees,
            tables,
            rooms,
            hall: payload.hall,
            opening: payload.opening,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        self.storage.put_venue(&txn, &venue)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            venue_id = venue.id,
            kind = %kind,
            owner_id = %venue.owner_id,
            "Venue created"
        );
        Ok(venue)
    }

    /// Venue by id, served from cache when fresh
    pub fn get(&self, venue_id: i64) -> StorageResult<Option<Venue>> {
        if let Some(venue) = self.cache.get(&venue_id) {
            return Ok(Some(venue));
        }
        let venue = self.storage.get_venue(venue_id)?;
        if let Some(v) = &venue {
            self.cache.insert(venue_id, v.clone());
        }
        Ok(venue)
    }

    /// Venue by id and kind; 404 when absent or of another kind
    pub fn get_of_kind(&self, kind: VenueKind, venue_id: i64) -> AppResult<Venue> {
        match self.get(venue_id)? {
            Some(venue) if venue.kind == kind => Ok(venue),
            Some(venue) => Err(AppError::with_message(
                ErrorCode::VenueKindMismatch,
                format!("Venue {} is a {}, not a {}", venue_id, venue.kind, kind),
            )),
            None => Err(AppError::new(ErrorCode::VenueNotFound).with_detail("venue_id", venue_id)),
        }
    }

    /// Drop the cached copy after the venue's occupancy changed
    pub fn invalidate(&self, venue_id: i64) {
        self.cache.invalidate(&venue_id);
    }
}

fn validate_payload(kind: VenueKind, payload: &VenueCreate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_amount(payload.rates.unit_rate, "rates.unit_rate")?;
    validate_amount(payload.fees.tax_percentage, "fees.tax_percentage")?;
    validate_amount(payload.fees.service_fee, "fees.service_fee")?;
    validate_amount(payload.fees.reservation_fee, "fees.reservation_fee")?;
    validate_amount(payload.fees.platform_fee, "fees.platform_fee")?;
    if payload.fees.tax_percentage > 100.0 {
        return Err(AppError::validation("fees.tax_percentage must not exceed 100"));
    }

    for table in &payload.tables {
        validate_required_text(&table.name, "tables.name", MAX_SHORT_TEXT_LEN)?;
        if table.capacity < 1 {
            return Err(AppError::validation("tables.capacity must be at least 1"));
        }
    }
    for room in &payload.rooms {
        validate_required_text(&room.name, "rooms.name", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&room.room_type, "rooms.room_type", MAX_SHORT_TEXT_LEN)?;
        if room.capacity < 1 {
            return Err(AppError::validation("rooms.capacity must be at least 1"));
        }
    }
    if let Some(opening) = &payload.opening {
        validate_opening(opening)?;
    }

    match kind {
        VenueKind::Restaurant | VenueKind::Cafe if payload.tables.is_empty() => Err(
            AppError::validation(format!("A {} needs at least one table", kind)),
        ),
        VenueKind::Hotel if payload.rooms.is_empty() => {
            Err(AppError::validation("A hotel needs at least one room"))
        }
        VenueKind::Hall => match &payload.hall {
            Some(HallSpec {
                sections,
                max_guests,
            }) if *sections >= 1 && *max_guests >= 1 => Ok(()),
            Some(_) => Err(AppError::validation(
                "hall.sections and hall.max_guests must be at least 1",
            )),
            None => Err(AppError::validation("A hall needs a hall layout")),
        },
        _ => Ok(()),
    }
}

fn validate_opening(opening: &OpeningHours) -> AppResult<()> {
    let (Some(open), Some(close)) = (parse_hhmm(&opening.open), parse_hhmm(&opening.close)) else {
        return Err(AppError::validation("opening hours must use HH:MM"));
    };
    if open >= close {
        return Err(AppError::validation("opening.open must be before opening.close"));
    }
    if opening.slot_minutes == 0 || opening.slot_minutes > 24 * 60 {
        return Err(AppError::validation("opening.slot_minutes must be 1..=1440"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{DiningTableCreate, FeeSchedule, RateCard, RoomCreate};
    use shared::types::Role;

    fn service() -> VenueService {
        let storage = BookingStorage::open_in_memory().expect("storage");
        VenueService::new(storage, Duration::from_secs(60), 16, "USD")
    }

    fn user(id: &str, role: Role) -> CurrentUser {
        CurrentUser {
            id: id.into(),
            username: id.into(),
            role,
            permissions: vec![],
        }
    }

    fn payload() -> VenueCreate {
        VenueCreate {
            name: " Harbor Bistro ".into(),
            owner_id: None,
            currency: None,
            rates: RateCard { unit_rate: 200.0 },
            fees: FeeSchedule::default(),
            tables: vec![
                DiningTableCreate {
                    name: "T1".into(),
                    capacity: 2,
                },
                DiningTableCreate {
                    name: "T2".into(),
                    capacity: 6,
                },
            ],
            rooms: vec![],
            hall: None,
            opening: Some(OpeningHours {
                open: "11:00".into(),
                close: "23:00".into(),
                slot_minutes: 120,
            }),
        }
    }

    #[test]
    fn test_owner_creates_venue() {
        let svc = service();
        let venue = svc
            .create(VenueKind::Restaurant, payload(), &user("owner-1", Role::Owner))
            .expect("create");

        assert_eq!(venue.name, "Harbor Bistro");
        assert_eq!(venue.owner_id, "owner-1");
        assert_eq!(venue.currency, "USD");
        assert_eq!(venue.tables.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);

        let loaded = svc.get_of_kind(VenueKind::Restaurant, venue.id).expect("get");
        assert_eq!(loaded, venue);
    }

    #[test]
    fn test_plain_user_cannot_create() {
        let err = service()
            .create(VenueKind::Restaurant, payload(), &user("u", Role::User))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_admin_creates_on_behalf_of_owner() {
        let mut p = payload();
        p.owner_id = Some("owner-9".into());
        p.currency = Some("eur".into());
        let venue = service()
            .create(VenueKind::Cafe, p, &user("admin", Role::Admin))
            .expect("create");
        assert_eq!(venue.owner_id, "owner-9");
        assert_eq!(venue.currency, "EUR");
    }

    #[test]
    fn test_owner_cannot_assign_other_owner() {
        let mut p = payload();
        p.owner_id = Some("someone-else".into());
        let venue = service()
            .create(VenueKind::Restaurant, p, &user("owner-1", Role::Owner))
            .expect("create");
        assert_eq!(venue.owner_id, "owner-1");
    }

    #[test]
    fn test_kind_specific_requirements() {
        let svc = service();
        let owner = user("o", Role::Owner);

        let err = svc.create(VenueKind::Hotel, payload(), &owner).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = svc.create(VenueKind::Hall, payload(), &owner).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let mut hotel = payload();
        hotel.tables.clear();
        hotel.rooms.push(RoomCreate {
            name: "101".into(),
            room_type: "Deluxe".into(),
            capacity: 2,
        });
        assert!(svc.create(VenueKind::Hotel, hotel, &owner).is_ok());

        let mut hall = payload();
        hall.hall = Some(HallSpec {
            sections: 2,
            max_guests: 300,
        });
        assert!(svc.create(VenueKind::Hall, hall, &owner).is_ok());
    }

    #[test]
    fn test_rejects_bad_amounts_and_hours() {
        let svc = service();
        let owner = user("o", Role::Owner);

        let mut p = payload();
        p.rates.unit_rate = -1.0;
        assert!(svc.create(VenueKind::Restaurant, p, &owner).is_err());

        let mut p = payload();
        p.opening = Some(OpeningHours {
            open: "23:00".into(),
            close: "11:00".into(),
            slot_minutes: 60,
        });
        assert!(svc.create(VenueKind::Restaurant, p, &owner).is_err());
    }

    #[test]
    fn test_kind_mismatch_and_missing() {
        let svc = service();
        let venue = svc
            .create(VenueKind::Restaurant, payload(), &user("o", Role::Owner))
            .expect("create");

        let err = svc.get_of_kind(VenueKind::Hotel, venue.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::VenueKindMismatch);

        let err = svc.get_of_kind(VenueKind::Hotel, 42).unwrap_err();
        assert_eq!(err.code, ErrorCode::VenueNotFound);
    }
}

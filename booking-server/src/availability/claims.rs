//! Resource claims
//!
//! Pure functions over the venue aggregate. The caller loads the venue and
//! its bookings inside a write transaction, claims, and writes the venue
//! back in the same transaction; that makes check-and-mark atomic.

use shared::models::{Booking, DiningTable, Room, Venue, VenueKind};

use super::AvailabilityError;
use crate::utils::validation::{MAX_GUESTS, MAX_UNITS_PER_BOOKING};
use crate::window::ResolvedWindow;

/// Claim parameters for one booking
#[derive(Debug, Clone, Copy)]
pub struct ClaimRequest<'a> {
    pub booking_id: i64,
    pub window: &'a ResolvedWindow,
    pub guests: i32,
    /// Tables, rooms or hall sections
    pub quantity: i32,
    pub table_id: Option<i64>,
    pub room_id: Option<i64>,
    pub room_type: Option<&'a str>,
}

/// Discrete bookable unit (table or room)
pub(crate) trait Unit {
    fn id(&self) -> i64;
    fn capacity(&self) -> i32;
    fn is_free(&self) -> bool;
    fn hold(&mut self, booking_id: i64);
    fn release(&mut self);
    fn held_by(&self) -> Option<i64>;
    fn matches_type(&self, _wanted: Option<&str>) -> bool {
        true
    }
}

impl Unit for DiningTable {
    fn id(&self) -> i64 {
        self.id
    }
    fn capacity(&self) -> i32 {
        self.capacity
    }
    fn is_free(&self) -> bool {
        !self.is_booked
    }
    fn hold(&mut self, booking_id: i64) {
        self.is_booked = true;
        self.current_booking = Some(booking_id);
    }
    fn release(&mut self) {
        self.is_booked = false;
        self.current_booking = None;
    }
    fn held_by(&self) -> Option<i64> {
        self.current_booking
    }
}

impl Unit for Room {
    fn id(&self) -> i64 {
        self.id
    }
    fn capacity(&self) -> i32 {
        self.capacity
    }
    fn is_free(&self) -> bool {
        !self.is_booked
    }
    fn hold(&mut self, booking_id: i64) {
        self.is_booked = true;
        self.current_booking = Some(booking_id);
    }
    fn release(&mut self) {
        self.is_booked = false;
        self.current_booking = None;
    }
    fn held_by(&self) -> Option<i64> {
        self.current_booking
    }
    fn matches_type(&self, wanted: Option<&str>) -> bool {
        wanted.is_none_or(|w| self.room_type.eq_ignore_ascii_case(w.trim()))
    }
}

/// Guests each unit must seat when a party spreads over `quantity` units
pub(crate) fn per_unit_party(guests: i32, quantity: i32) -> i32 {
    let quantity = quantity.max(1);
    guests / quantity + i32::from(guests % quantity != 0)
}

/// Guest and unit counts a single booking may ask for
///
/// Restaurant bookings always hold exactly one table.
pub fn check_request_bounds(
    kind: VenueKind,
    guests: i32,
    quantity: i32,
) -> Result<(), AvailabilityError> {
    if !(1..=MAX_GUESTS).contains(&guests) {
        return Err(AvailabilityError::GuestsOutOfRange(format!(
            "guests must be between 1 and {MAX_GUESTS}"
        )));
    }
    if !(1..=MAX_UNITS_PER_BOOKING).contains(&quantity) {
        return Err(AvailabilityError::InvalidQuantity(format!(
            "quantity must be between 1 and {MAX_UNITS_PER_BOOKING}"
        )));
    }
    if kind == VenueKind::Restaurant && quantity != 1 {
        return Err(AvailabilityError::InvalidQuantity(
            "restaurant bookings reserve exactly one table".into(),
        ));
    }
    Ok(())
}

/// Reject parties no unit (or hall) of the venue could ever seat
///
/// Capacity only; occupancy is not consulted. Used by price previews, which
/// must fail on impossible requests without claiming anything.
pub fn check_party_size(
    venue: &Venue,
    guests: i32,
    quantity: i32,
    room_type: Option<&str>,
) -> Result<(), AvailabilityError> {
    check_request_bounds(venue.kind, guests, quantity)?;
    let party = per_unit_party(guests, quantity);
    let largest = match venue.kind {
        VenueKind::Restaurant | VenueKind::Cafe => {
            venue.tables.iter().map(|t| t.capacity).max()
        }
        VenueKind::Hotel => venue
            .rooms
            .iter()
            .filter(|r| r.matches_type(room_type))
            .map(|r| r.capacity)
            .max(),
        VenueKind::Hall => {
            return match venue.hall.as_ref() {
                Some(hall) if guests > hall.max_guests => Err(AvailabilityError::GuestsOutOfRange(
                    format!("hall holds at most {} guests", hall.max_guests),
                )),
                Some(hall) if quantity > hall.sections => Err(AvailabilityError::InvalidQuantity(
                    format!("hall has only {} section(s)", hall.sections),
                )),
                _ => Ok(()),
            };
        }
    };
    match largest {
        Some(capacity) if capacity >= party => Ok(()),
        Some(capacity) => Err(AvailabilityError::GuestsOutOfRange(format!(
            "largest unit seats {capacity} but {party} guests must share one"
        ))),
        None => Err(AvailabilityError::Unavailable("no matching units configured".into())),
    }
}

/// Claim the resource a booking needs
///
/// Returns the ids of claimed tables/rooms (empty for halls). On error the
/// venue is left untouched.
pub fn claim(
    venue: &mut Venue,
    existing: &[Booking],
    req: &ClaimRequest<'_>,
) -> Result<Vec<i64>, AvailabilityError> {
    check_request_bounds(venue.kind, req.guests, req.quantity)?;

    match venue.kind {
        VenueKind::Restaurant => {
            claim_units(&mut venue.tables, req.table_id, req.guests, 1, None, "table", req.booking_id)
        }
        VenueKind::Cafe => claim_units(
            &mut venue.tables,
            req.table_id,
            req.guests,
            req.quantity,
            None,
            "table",
            req.booking_id,
        ),
        VenueKind::Hotel => claim_units(
            &mut venue.rooms,
            req.room_id,
            req.guests,
            req.quantity,
            req.room_type,
            "room",
            req.booking_id,
        ),
        VenueKind::Hall => {
            claim_sections(venue, existing, req)?;
            Ok(Vec::new())
        }
    }
}

fn claim_units<U: Unit>(
    units: &mut [U],
    explicit: Option<i64>,
    guests: i32,
    quantity: i32,
    room_type: Option<&str>,
    noun: &'static str,
    booking_id: i64,
) -> Result<Vec<i64>, AvailabilityError> {
    let party = per_unit_party(guests, quantity);

    if let Some(id) = explicit {
        if quantity != 1 {
            return Err(AvailabilityError::InvalidQuantity(format!(
                "a specific {noun} can only be requested alone"
            )));
        }
        let unit = units
            .iter_mut()
            .find(|u| u.id() == id)
            .ok_or(AvailabilityError::SubResourceNotFound(id))?;
        if unit.capacity() < party {
            return Err(AvailabilityError::GuestsOutOfRange(format!(
                "{noun} {id} seats {} but the party has {guests}",
                unit.capacity()
            )));
        }
        if !unit.is_free() {
            return Err(AvailabilityError::Unavailable(format!(
                "{noun} {id} is already booked"
            )));
        }
        unit.hold(booking_id);
        return Ok(vec![id]);
    }

    let typed: Vec<usize> = (0..units.len())
        .filter(|&i| units[i].matches_type(room_type))
        .collect();
    if typed.is_empty() {
        return Err(AvailabilityError::Unavailable(match room_type {
            Some(t) => format!("no {noun}s of type {t}"),
            None => format!("venue has no {noun}s"),
        }));
    }

    // Smallest fitting tier first
    let mut fitting: Vec<usize> = typed
        .into_iter()
        .filter(|&i| units[i].capacity() >= party)
        .collect();
    if fitting.is_empty() {
        return Err(AvailabilityError::GuestsOutOfRange(format!(
            "no {noun} seats {party} guests"
        )));
    }
    fitting.sort_by_key(|&i| (units[i].capacity(), units[i].id()));

    let chosen: Vec<usize> = fitting
        .into_iter()
        .filter(|&i| units[i].is_free())
        .take(quantity as usize)
        .collect();
    if chosen.len() < quantity as usize {
        return Err(AvailabilityError::Unavailable(format!(
            "only {} matching {noun}(s) free, {quantity} requested",
            chosen.len()
        )));
    }

    Ok(chosen
        .into_iter()
        .map(|i| {
            units[i].hold(booking_id);
            units[i].id()
        })
        .collect())
}

/// Sections already taken by active bookings overlapping `window`
pub(crate) fn sections_in_use(existing: &[Booking], window: &ResolvedWindow, skip: Option<i64>) -> i32 {
    existing
        .iter()
        .filter(|b| b.status.is_active() && Some(b.id) != skip)
        .filter(|b| {
            ResolvedWindow::from_stored(&b.window)
                .map(|w| w.overlaps(window))
                .unwrap_or(false)
        })
        .map(|b| b.quantity)
        .sum()
}

fn claim_sections(
    venue: &Venue,
    existing: &[Booking],
    req: &ClaimRequest<'_>,
) -> Result<(), AvailabilityError> {
    let hall = venue
        .hall
        .as_ref()
        .ok_or_else(|| AvailabilityError::Unavailable("hall layout not configured".into()))?;

    if req.guests > hall.max_guests {
        return Err(AvailabilityError::GuestsOutOfRange(format!(
            "hall holds at most {} guests",
            hall.max_guests
        )));
    }
    if req.quantity > hall.sections {
        return Err(AvailabilityError::InvalidQuantity(format!(
            "hall has only {} section(s)",
            hall.sections
        )));
    }

    let taken = sections_in_use(existing, req.window, Some(req.booking_id));
    if taken + req.quantity > hall.sections {
        return Err(AvailabilityError::Unavailable(format!(
            "{} of {} section(s) already booked for these dates",
            taken, hall.sections
        )));
    }
    Ok(())
}

/// Free every unit the booking holds; returns how many were released
///
/// Idempotent: a second call finds nothing held and returns 0.
pub fn release(venue: &mut Venue, booking_id: i64) -> usize {
    let mut released = 0;
    for table in venue.tables.iter_mut().filter(|t| t.held_by() == Some(booking_id)) {
        table.release();
        released += 1;
    }
    for room in venue.rooms.iter_mut().filter(|r| r.held_by() == Some(booking_id)) {
        room.release();
        released += 1;
    }
    released
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::models::{FeeSchedule, HallSpec, RateCard};

    pub(crate) fn table(id: i64, capacity: i32) -> DiningTable {
        DiningTable {
            id,
            name: format!("T{id}"),
            capacity,
            is_booked: false,
            current_booking: None,
        }
    }

    pub(crate) fn room(id: i64, room_type: &str, capacity: i32) -> Room {
        Room {
            id,
            name: format!("R{id}"),
            room_type: room_type.into(),
            capacity,
            is_booked: false,
            current_booking: None,
        }
    }

    pub(crate) fn venue(kind: VenueKind) -> Venue {
        Venue {
            id: 1,
            kind,
            name: "Test".into(),
            owner_id: "owner".into(),
            currency: "USD".into(),
            rates: RateCard { unit_rate: 10.0 },
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

    fn slot() -> ResolvedWindow {
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        ResolvedWindow::slot(
            date,
            chrono::NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            chrono::NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn req(booking_id: i64, window: &ResolvedWindow, guests: i32, quantity: i32) -> ClaimRequest<'_> {
        ClaimRequest {
            booking_id,
            window,
            guests,
            quantity,
            table_id: None,
            room_id: None,
            room_type: None,
        }
    }

    #[test]
    fn test_smallest_fitting_tier_first() {
        let mut v = venue(VenueKind::Restaurant);
        v.tables = vec![table(1, 8), table(2, 4), table(3, 2), table(4, 4)];
        let w = slot();

        assert_eq!(claim(&mut v, &[], &req(100, &w, 3, 1)).unwrap(), vec![2]);
        assert_eq!(claim(&mut v, &[], &req(101, &w, 3, 1)).unwrap(), vec![4]);
        // 4-seat tier exhausted, falls through to the 8-seater
        assert_eq!(claim(&mut v, &[], &req(102, &w, 3, 1)).unwrap(), vec![1]);
        assert!(matches!(
            claim(&mut v, &[], &req(103, &w, 3, 1)),
            Err(AvailabilityError::Unavailable(_))
        ));
        assert_eq!(v.units_held_by(100), vec![2]);
    }

    #[test]
    fn test_check_party_size() {
        let mut v = venue(VenueKind::Cafe);
        v.tables = vec![table(1, 2), table(2, 4)];
        assert!(check_party_size(&v, 4, 1, None).is_ok());
        // 7 guests over 2 tables needs 4 seats each
        assert!(check_party_size(&v, 7, 2, None).is_ok());
        assert!(matches!(
            check_party_size(&v, 9, 2, None),
            Err(AvailabilityError::GuestsOutOfRange(_))
        ));

        let mut hall = venue(VenueKind::Hall);
        hall.hall = Some(HallSpec {
            sections: 2,
            max_guests: 100,
        });
        assert!(check_party_size(&hall, 100, 2, None).is_ok());
        assert!(check_party_size(&hall, 101, 1, None).is_err());
        assert!(check_party_size(&hall, 10, 3, None).is_err());
    }

    #[test]
    fn test_party_larger_than_any_table() {
        let mut v = venue(VenueKind::Restaurant);
        v.tables = vec![table(1, 4)];
        let w = slot();
        assert!(matches!(
            claim(&mut v, &[], &req(1, &w, 9, 1)),
            Err(AvailabilityError::GuestsOutOfRange(_))
        ));
    }

    #[test]
    fn test_explicit_table() {
        let mut v = venue(VenueKind::Cafe);
        v.tables = vec![table(1, 2), table(2, 4)];
        let w = slot();

        let mut r = req(10, &w, 2, 1);
        r.table_id = Some(2);
        assert_eq!(claim(&mut v, &[], &r).unwrap(), vec![2]);

        r.booking_id = 11;
        assert!(matches!(claim(&mut v, &[], &r), Err(AvailabilityError::Unavailable(_))));

        r.table_id = Some(99);
        assert!(matches!(
            claim(&mut v, &[], &r),
            Err(AvailabilityError::SubResourceNotFound(99))
        ));
    }

    #[test]
    fn test_multi_table_claim_is_all_or_nothing() {
        let mut v = venue(VenueKind::Cafe);
        v.tables = vec![table(1, 2), table(2, 2), table(3, 2)];
        v.tables[0].hold(50);
        let w = slot();

        assert!(claim(&mut v, &[], &req(60, &w, 6, 3)).is_err());
        // Nothing was taken by the failed attempt
        assert!(v.units_held_by(60).is_empty());
        assert!(v.tables[1].is_free() && v.tables[2].is_free());

        assert_eq!(claim(&mut v, &[], &req(61, &w, 4, 2)).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_room_type_filter() {
        let mut v = venue(VenueKind::Hotel);
        v.rooms = vec![room(1, "standard", 2), room(2, "Deluxe", 2), room(3, "deluxe", 4)];
        let w = ResolvedWindow::stay(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
        )
        .unwrap();

        let mut r = req(7, &w, 2, 1);
        r.room_type = Some("deluxe");
        assert_eq!(claim(&mut v, &[], &r).unwrap(), vec![2]);

        r.room_type = Some("suite");
        r.booking_id = 8;
        assert!(matches!(claim(&mut v, &[], &r), Err(AvailabilityError::Unavailable(_))));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut v = venue(VenueKind::Hotel);
        v.rooms = vec![room(1, "standard", 2), room(2, "standard", 2)];
        let w = ResolvedWindow::stay(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
        )
        .unwrap();
        claim(&mut v, &[], &req(5, &w, 4, 2)).unwrap();

        assert_eq!(release(&mut v, 5), 2);
        assert_eq!(release(&mut v, 5), 0);
        assert!(v.rooms.iter().all(|r| r.is_free()));
    }

    #[test]
    fn test_per_unit_party() {
        assert_eq!(per_unit_party(6, 3), 2);
        assert_eq!(per_unit_party(7, 3), 3);
        assert_eq!(per_unit_party(1, 1), 1);
        assert_eq!(per_unit_party(i32::MAX, 2), 1_073_741_824);
    }

    #[test]
    fn test_oversized_party_rejected_without_overflow() {
        let mut cafe = venue(VenueKind::Cafe);
        cafe.tables = vec![table(1, 4), table(2, 4)];
        assert!(matches!(
            check_party_size(&cafe, i32::MAX, 2, None),
            Err(AvailabilityError::GuestsOutOfRange(_))
        ));
        assert!(matches!(
            check_party_size(&cafe, MAX_GUESTS + 1, 2, None),
            Err(AvailabilityError::GuestsOutOfRange(_))
        ));
        assert!(matches!(
            check_party_size(&cafe, 2, i32::MAX, None),
            Err(AvailabilityError::InvalidQuantity(_))
        ));

        let w = slot();
        assert!(matches!(
            claim(&mut cafe, &[], &req(1, &w, i32::MAX, 2)),
            Err(AvailabilityError::GuestsOutOfRange(_))
        ));
        assert!(cafe.tables.iter().all(|t| t.is_free()));
    }

    #[test]
    fn test_restaurant_party_cannot_spread_over_tables() {
        let mut v = venue(VenueKind::Restaurant);
        v.tables = vec![table(1, 4), table(2, 4), table(3, 4)];
        assert!(matches!(
            check_party_size(&v, 12, 3, None),
            Err(AvailabilityError::InvalidQuantity(_))
        ));
        assert!(check_party_size(&v, 4, 1, None).is_ok());
    }

    #[test]
    fn test_hall_section_overlap() {
        let mut v = venue(VenueKind::Hall);
        v.hall = Some(HallSpec {
            sections: 2,
            max_guests: 200,
        });
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        let w = ResolvedWindow::days(d(2), d(4)).unwrap();

        let existing = vec![crate::availability::tests::hall_booking(1, d(4), d(5), 1)];
        // One section left
        assert!(claim(&mut v, &existing, &req(2, &w, 100, 1)).is_ok());
        assert!(matches!(
            claim(&mut v, &existing, &req(3, &w, 100, 2)),
            Err(AvailabilityError::Unavailable(_))
        ));
        // Non-overlapping range is unaffected
        let later = ResolvedWindow::days(d(6), d(7)).unwrap();
        assert!(claim(&mut v, &existing, &req(4, &later, 100, 2)).is_ok());
        assert!(matches!(
            claim(&mut v, &existing, &req(5, &later, 500, 1)),
            Err(AvailabilityError::GuestsOutOfRange(_))
        ));
    }
}

//! Availability listing
//!
//! Derived purely from current claim state: occupancy flags for tables and
//! rooms, overlapping active bookings for hall sections.

use chrono::{Duration, NaiveDate, NaiveTime};
use shared::models::{Booking, SlotAvailability, Venue, VenueKind};

use super::claims::{Unit, sections_in_use};
use crate::window::ResolvedWindow;

const DEFAULT_SLOT_MINUTES: u32 = 60;

/// Current local time in the business timezone
#[derive(Debug, Clone, Copy)]
pub struct LocalNow {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

fn free_units<U: Unit>(units: &[U], party: i32, room_type: Option<&str>) -> i32 {
    units
        .iter()
        .filter(|u| u.is_free() && u.capacity() >= party && u.matches_type(room_type))
        .count() as i32
}

/// Opening-hours windows of `date`, skipping ones that already started
fn slot_windows(venue: &Venue, date: NaiveDate, now: LocalNow) -> Vec<(NaiveTime, NaiveTime)> {
    let Some(opening) = venue.opening.as_ref() else {
        return Vec::new();
    };
    let (Some(open), Some(close)) = (
        crate::utils::time::parse_hhmm(&opening.open),
        crate::utils::time::parse_hhmm(&opening.close),
    ) else {
        tracing::warn!(venue_id = venue.id, "Venue opening hours are not HH:MM");
        return Vec::new();
    };

    let minutes = if opening.slot_minutes == 0 {
        DEFAULT_SLOT_MINUTES
    } else {
        opening.slot_minutes
    };
    let step = Duration::minutes(i64::from(minutes));

    let mut windows = Vec::new();
    let mut start = open;
    while start < close {
        let (end, wrapped) = start.overflowing_add_signed(step);
        if wrapped != 0 || end > close {
            break;
        }
        if date > now.date || start > now.time {
            windows.push((start, end));
        }
        start = end;
    }
    windows
}

/// Free capacity per window on `date`
///
/// Dates before today yield no entries. Slot venues without opening hours
/// get a single whole-day entry like hotels and halls.
pub fn list_available_slots(
    venue: &Venue,
    bookings: &[Booking],
    date: NaiveDate,
    party_size: Option<i32>,
    now: LocalNow,
) -> Vec<SlotAvailability> {
    if date < now.date {
        return Vec::new();
    }
    let party = party_size.unwrap_or(1).max(1);

    let whole_day = |available: i32| {
        vec![SlotAvailability {
            start_time: None,
            end_time: None,
            available,
        }]
    };

    match venue.kind {
        VenueKind::Restaurant | VenueKind::Cafe => {
            let free = free_units(&venue.tables, party, None);
            if venue.opening.is_none() {
                return whole_day(free);
            }
            slot_windows(venue, date, now)
                .into_iter()
                .map(|(start, end)| SlotAvailability {
                    start_time: Some(start.format("%H:%M").to_string()),
                    end_time: Some(end.format("%H:%M").to_string()),
                    available: free,
                })
                .collect()
        }
        VenueKind::Hotel => whole_day(free_units(&venue.rooms, party, None)),
        VenueKind::Hall => {
            let Some(hall) = venue.hall.as_ref() else {
                return whole_day(0);
            };
            if party > hall.max_guests {
                return whole_day(0);
            }
            let Ok(day) = ResolvedWindow::days(date, date) else {
                return whole_day(0);
            };
            let taken = sections_in_use(bookings, &day, None);
            whole_day((hall.sections - taken).max(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::claims::tests::{room, table, venue};
    use crate::availability::tests::hall_booking;
    use shared::models::{HallSpec, OpeningHours};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn now(day: u32, h: u32) -> LocalNow {
        LocalNow {
            date: d(day),
            time: t(h, 0),
        }
    }

    fn cafe() -> Venue {
        let mut v = venue(VenueKind::Cafe);
        v.tables = vec![table(1, 2), table(2, 4), table(3, 4)];
        v.opening = Some(OpeningHours {
            open: "09:00".into(),
            close: "12:00".into(),
            slot_minutes: 60,
        });
        v
    }

    #[test]
    fn test_future_date_lists_every_slot() {
        let slots = list_available_slots(&cafe(), &[], d(5), Some(3), now(2, 10));
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].start_time.as_deref(), Some("09:00"));
        assert_eq!(slots[2].end_time.as_deref(), Some("12:00"));
        assert!(slots.iter().all(|s| s.available == 2));
    }

    #[test]
    fn test_today_omits_started_slots() {
        let slots = list_available_slots(&cafe(), &[], d(2), None, now(2, 10));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time.as_deref(), Some("11:00"));
        assert_eq!(slots[0].available, 3);
    }

    #[test]
    fn test_past_date_is_empty() {
        assert!(list_available_slots(&cafe(), &[], d(1), None, now(2, 10)).is_empty());
    }

    #[test]
    fn test_booked_tables_reduce_count() {
        let mut v = cafe();
        v.tables[1].is_booked = true;
        v.tables[1].current_booking = Some(9);
        let slots = list_available_slots(&v, &[], d(5), Some(3), now(2, 10));
        assert!(slots.iter().all(|s| s.available == 1));
    }

    #[test]
    fn test_hotel_whole_day() {
        let mut v = venue(VenueKind::Hotel);
        v.rooms = vec![room(1, "standard", 2), room(2, "family", 5)];
        let slots = list_available_slots(&v, &[], d(5), Some(4), now(2, 10));
        assert_eq!(slots.len(), 1);
        assert!(slots[0].start_time.is_none());
        assert_eq!(slots[0].available, 1);
    }

    #[test]
    fn test_hall_sections_left() {
        let mut v = venue(VenueKind::Hall);
        v.hall = Some(HallSpec {
            sections: 3,
            max_guests: 100,
        });
        let bookings = vec![hall_booking(1, d(4), d(6), 2)];
        assert_eq!(list_available_slots(&v, &bookings, d(5), None, now(2, 10))[0].available, 1);
        assert_eq!(list_available_slots(&v, &bookings, d(7), None, now(2, 10))[0].available, 3);
        assert_eq!(list_available_slots(&v, &bookings, d(7), Some(150), now(2, 10))[0].available, 0);
    }
}

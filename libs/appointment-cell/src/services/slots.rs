//! Pure slot arithmetic: tiling windows, removing booked intervals, and the
//! `"HH:MM - HH:MM"` label format.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveTime};

use crate::models::{AppointmentError, Slot, SLOT_MINUTES};

const LABEL_SEPARATOR: &str = " - ";

/// Tile `[start, end)` into consecutive slots. A trailing remainder shorter than
/// a full slot is kept, clipped to `end`.
pub fn tile_window(start: NaiveTime, end: NaiveTime) -> Vec<Slot> {
    let step = Duration::minutes(SLOT_MINUTES);
    let mut slots = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let (next, wrapped) = cursor.overflowing_add_signed(step);
        let slot_end = if wrapped != 0 || next > end { end } else { next };
        slots.push(Slot::new(cursor, slot_end));
        cursor = slot_end;
    }

    slots
}

/// Union of every window's tiling, de-duplicated and ordered by start.
pub fn candidate_slots<I>(windows: I) -> BTreeSet<Slot>
where
    I: IntoIterator<Item = (NaiveTime, NaiveTime)>,
{
    windows
        .into_iter()
        .flat_map(|(start, end)| tile_window(start, end))
        .collect()
}

/// Drop every candidate overlapping a booked interval.
pub fn subtract_booked(candidates: BTreeSet<Slot>, booked: &[(NaiveTime, NaiveTime)]) -> Vec<Slot> {
    candidates
        .into_iter()
        .filter(|slot| !booked.iter().any(|&(start, end)| slot.overlaps(start, end)))
        .collect()
}

pub fn format_slot(slot: &Slot) -> String {
    slot.to_string()
}

/// Strict inverse of [`format_slot`]: only zero-padded 24-hour labels with
/// `start < end` are accepted.
pub fn parse_slot(label: &str) -> Result<Slot, AppointmentError> {
    let invalid = || AppointmentError::InvalidTimeRange(format!("'{}' is not a valid slot", label));

    let (start_raw, end_raw) = label.split_once(LABEL_SEPARATOR).ok_or_else(invalid)?;
    let start = parse_hh_mm(start_raw).ok_or_else(invalid)?;
    let end = parse_hh_mm(end_raw).ok_or_else(invalid)?;

    if start >= end {
        return Err(AppointmentError::InvalidTimeRange(format!(
            "slot '{}' must start before it ends",
            label
        )));
    }

    Ok(Slot::new(start, end))
}

fn parse_hh_mm(raw: &str) -> Option<NaiveTime> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M").ok()?;
    // Rejects unpadded or otherwise non-canonical spellings.
    (time.format("%H:%M").to_string() == raw).then_some(time)
}

//! Slot availability evaluator
//!
//! The single definition of "bookable" shared by the read path (queries with
//! `available_only`) and the write path (booking creation). Only bookings
//! whose status is not `Cancelled` count against capacity.

/// `is_open AND active < capacity`
pub fn is_available(is_open: bool, capacity: i32, active_bookings: i32) -> bool {
    is_open && active_bookings < capacity
}

/// `max(0, capacity - active)`
pub fn remaining_capacity(capacity: i32, active_bookings: i32) -> i32 {
    (capacity - active_bookings).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_slot_with_room_is_available() {
        assert!(is_available(true, 2, 0));
        assert!(is_available(true, 2, 1));
    }

    #[test]
    fn full_slot_is_not_available() {
        assert!(!is_available(true, 2, 2));
        assert!(!is_available(true, 1, 3));
    }

    #[test]
    fn manual_close_overrides_capacity() {
        assert!(!is_available(false, 5, 0));
    }

    #[test]
    fn remaining_capacity_never_negative() {
        assert_eq!(remaining_capacity(2, 0), 2);
        assert_eq!(remaining_capacity(2, 2), 0);
        assert_eq!(remaining_capacity(2, 5), 0);
    }
}

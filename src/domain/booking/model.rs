//! Booking domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::slot::Slot;
use crate::domain::{DomainError, DomainResult};

pub const MAX_PLATE_LEN: usize = 20;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Car,
    Motorcycle,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorcycle => "Motorcycle",
        }
    }
}

impl FromStr for VehicleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Car" => Ok(Self::Car),
            "Motorcycle" => Ok(Self::Motorcycle),
            other => Err(DomainError::Validation(format!(
                "unknown vehicle type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Booking status
///
/// New bookings start `Reserved`. Any status may be set from any other by an
/// explicit request; only `Cancelled` releases slot capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Reserved,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "Reserved",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }

    /// Whether a booking in this status holds a unit of slot capacity
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// `true` when moving to `next` reclaims capacity (cancelled → anything else)
    pub fn reactivates(&self, next: BookingStatus) -> bool {
        !self.is_active() && next.is_active()
    }

    /// `true` when moving to `next` changes whether capacity is held
    pub fn crosses_capacity_boundary(&self, next: BookingStatus) -> bool {
        self.is_active() != next.is_active()
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reserved" => Ok(Self::Reserved),
            "Confirmed" => Ok(Self::Confirmed),
            "Cancelled" => Ok(Self::Cancelled),
            "Completed" => Ok(Self::Completed),
            other => Err(DomainError::Validation(format!(
                "unknown booking status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer's claim on one unit of a slot's capacity
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: i32,
    /// Set at creation, never changed afterwards
    pub slot_id: i32,
    pub plate: String,
    pub mileage: i32,
    pub vehicle_type: VehicleType,
    pub heavy_vehicle: bool,
    pub phone: String,
    pub email: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    /// Always `>= created_at`
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Booking request as accepted by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub slot_id: i32,
    pub plate: String,
    pub mileage: i32,
    pub vehicle_type: VehicleType,
    pub heavy_vehicle: bool,
    pub phone: String,
    pub email: Option<String>,
}

impl NewBooking {
    /// Field bounds the storage schema relies on. Pattern checks (phone,
    /// email) belong to the transport boundary.
    pub fn validate(&self) -> DomainResult<()> {
        let plate = self.plate.trim();
        if plate.is_empty() || plate.chars().count() > MAX_PLATE_LEN {
            return Err(DomainError::Validation(format!(
                "plate must be 1..={} characters",
                MAX_PLATE_LEN
            )));
        }
        if self.mileage < 0 {
            return Err(DomainError::Validation(
                "mileage must not be negative".to_string(),
            ));
        }
        let phone = self.phone.trim();
        if phone.is_empty() || phone.chars().count() > MAX_PHONE_LEN {
            return Err(DomainError::Validation(format!(
                "phone must be 1..={} characters",
                MAX_PHONE_LEN
            )));
        }
        if let Some(email) = &self.email {
            if email.chars().count() > MAX_EMAIL_LEN {
                return Err(DomainError::Validation(format!(
                    "email must be at most {} characters",
                    MAX_EMAIL_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Booking together with the slot it references, as returned to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingWithSlot {
    pub booking: Booking,
    pub slot: Slot,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> NewBooking {
        NewBooking {
            slot_id: 1,
            plate: "AB-123-CD".to_string(),
            mileage: 42_000,
            vehicle_type: VehicleType::Car,
            heavy_vehicle: false,
            phone: "+33 6 12 34 56 78".to_string(),
            email: Some("client@example.com".to_string()),
        }
    }

    #[test]
    fn only_cancelled_releases_capacity() {
        assert!(BookingStatus::Reserved.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }

    #[test]
    fn boundary_crossings() {
        use BookingStatus::*;
        assert!(Reserved.crosses_capacity_boundary(Cancelled));
        assert!(Cancelled.crosses_capacity_boundary(Confirmed));
        assert!(!Reserved.crosses_capacity_boundary(Completed));
        assert!(!Cancelled.crosses_capacity_boundary(Cancelled));

        assert!(Cancelled.reactivates(Reserved));
        assert!(!Reserved.reactivates(Cancelled));
        assert!(!Confirmed.reactivates(Completed));
    }

    #[test]
    fn status_parses_known_names_only() {
        assert_eq!(
            "Confirmed".parse::<BookingStatus>().unwrap(),
            BookingStatus::Confirmed
        );
        assert!(matches!(
            "Annulee".parse::<BookingStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn vehicle_type_parses_known_names_only() {
        assert_eq!(
            "Motorcycle".parse::<VehicleType>().unwrap(),
            VehicleType::Motorcycle
        );
        assert!("Truck".parse::<VehicleType>().is_err());
    }

    #[test]
    fn valid_request_passes() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn blank_or_long_plate_is_rejected() {
        let mut req = sample_request();
        req.plate = "   ".to_string();
        assert!(req.validate().is_err());

        req.plate = "X".repeat(MAX_PLATE_LEN + 1);
        assert!(req.validate().is_err());
    }

    #[test]
    fn negative_mileage_is_rejected() {
        let mut req = sample_request();
        req.mileage = -1;
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));
    }
}

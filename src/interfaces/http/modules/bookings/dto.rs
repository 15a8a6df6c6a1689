//! Booking DTOs and boundary validation

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::domain::{BookingStatus, BookingWithSlot, NewBooking, VehicleType};
use crate::interfaces::http::modules::slots::SlotDto;

static PHONE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[+]?[0-9\s\-().]{10,20}$").ok());

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let matches = PHONE_PATTERN
        .as_ref()
        .map(|re| re.is_match(phone))
        .unwrap_or(false);
    if matches {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("must be 10-20 digits, spaces, or + - ( ) .".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub enum VehicleTypeDto {
    Car,
    Motorcycle,
}

impl From<VehicleTypeDto> for VehicleType {
    fn from(v: VehicleTypeDto) -> Self {
        match v {
            VehicleTypeDto::Car => Self::Car,
            VehicleTypeDto::Motorcycle => Self::Motorcycle,
        }
    }
}

impl From<VehicleType> for VehicleTypeDto {
    fn from(v: VehicleType) -> Self {
        match v {
            VehicleType::Car => Self::Car,
            VehicleType::Motorcycle => Self::Motorcycle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BookingStatusDto {
    Reserved,
    Confirmed,
    Cancelled,
    Completed,
}

impl From<BookingStatusDto> for BookingStatus {
    fn from(s: BookingStatusDto) -> Self {
        match s {
            BookingStatusDto::Reserved => Self::Reserved,
            BookingStatusDto::Confirmed => Self::Confirmed,
            BookingStatusDto::Cancelled => Self::Cancelled,
            BookingStatusDto::Completed => Self::Completed,
        }
    }
}

impl From<BookingStatus> for BookingStatusDto {
    fn from(s: BookingStatus) -> Self {
        match s {
            BookingStatus::Reserved => Self::Reserved,
            BookingStatus::Confirmed => Self::Confirmed,
            BookingStatus::Cancelled => Self::Cancelled,
            BookingStatus::Completed => Self::Completed,
        }
    }
}

/// Request to book one place in a slot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub slot_id: i32,
    /// Vehicle registration plate
    #[validate(length(min = 1, max = 20, message = "plate must be 1-20 characters"))]
    pub plate: String,
    #[validate(range(min = 0, message = "mileage must not be negative"))]
    pub mileage: i32,
    pub vehicle_type: VehicleTypeDto,
    #[serde(default)]
    pub heavy_vehicle: bool,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(email(message = "invalid email format"), length(max = 100))]
    pub email: Option<String>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(r: CreateBookingRequest) -> Self {
        Self {
            slot_id: r.slot_id,
            plate: r.plate,
            mileage: r.mileage,
            vehicle_type: r.vehicle_type.into(),
            heavy_vehicle: r.heavy_vehicle,
            phone: r.phone,
            email: r.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: BookingStatusDto,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingRangeParams {
    /// Inclusive lower bound on slot start (RFC 3339)
    pub from: DateTime<Utc>,
    /// Inclusive upper bound on slot end (RFC 3339)
    pub to: DateTime<Utc>,
}

/// Booking with its resolved slot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDto {
    pub id: i32,
    pub plate: String,
    pub mileage: i32,
    pub vehicle_type: VehicleTypeDto,
    pub heavy_vehicle: bool,
    pub phone: String,
    pub email: Option<String>,
    pub status: BookingStatusDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slot: SlotDto,
}

impl From<BookingWithSlot> for BookingDto {
    fn from(bs: BookingWithSlot) -> Self {
        let b = bs.booking;
        Self {
            id: b.id,
            plate: b.plate,
            mileage: b.mileage,
            vehicle_type: b.vehicle_type.into(),
            heavy_vehicle: b.heavy_vehicle,
            phone: b.phone,
            email: b.email,
            status: b.status.into(),
            created_at: b.created_at,
            updated_at: b.updated_at,
            slot: bs.slot.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(phone: &str, email: Option<&str>) -> CreateBookingRequest {
        CreateBookingRequest {
            slot_id: 1,
            plate: "AB-123-CD".to_string(),
            mileage: 0,
            vehicle_type: VehicleTypeDto::Car,
            heavy_vehicle: false,
            phone: phone.to_string(),
            email: email.map(String::from),
        }
    }

    #[test]
    fn phone_pattern_is_loose() {
        assert!(request("+33 6 12 34 56 78", None).validate().is_ok());
        assert!(request("(01) 23-45.67.89", None).validate().is_ok());
        assert!(request("12345", None).validate().is_err());
        assert!(request("06 12 34 56 7x", None).validate().is_err());
    }

    #[test]
    fn email_is_optional_but_checked() {
        assert!(request("0612345678", Some("a@b.fr")).validate().is_ok());
        assert!(request("0612345678", Some("not-an-email")).validate().is_err());
    }

    #[test]
    fn unknown_vehicle_type_fails_to_decode() {
        let raw = r#"{"slot_id":1,"plate":"X","mileage":1,"vehicle_type":"Truck","phone":"0612345678"}"#;
        assert!(serde_json::from_str::<CreateBookingRequest>(raw).is_err());
    }
}

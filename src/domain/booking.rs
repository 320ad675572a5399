//! Booking data model: the visitor's selection and the confirmed request

use crate::domain::catalog::{Category, GenderOption};
use crate::domain::types::Quantity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_booking_id() -> String {
    Uuid::now_v7().to_string()
}

/// Coarse booking progress shown to the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookingStatus {
    Idle,
    AwaitingGender,
    AwaitingQuantity,
    Confirmed,
}

impl BookingStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Idle => "idle",
            BookingStatus::AwaitingGender => "awaiting_gender",
            BookingStatus::AwaitingQuantity => "awaiting_quantity",
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

/// Flattened view of the in-progress choice
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Selection {
    pub category: Option<&'static Category>,
    pub gender: Option<GenderOption>,
    pub quantity: Quantity,
}

/// A confirmed booking request, produced once per confirmation
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub category: &'static Category,
    pub gender: GenderOption,
    pub quantity: Quantity,
    pub confirmed_at: DateTime<Utc>,
    /// Deep link opened for this booking
    pub link: String,
}

impl BookingConfirmation {
    pub fn new(
        category: &'static Category,
        gender: GenderOption,
        quantity: Quantity,
        link: String,
    ) -> Self {
        Self {
            booking_id: new_booking_id(),
            category,
            gender,
            quantity,
            confirmed_at: Utc::now(),
            link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::CATEGORIES;

    #[test]
    fn test_booking_ids_unique() {
        let a = new_booking_id();
        let b = new_booking_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_confirmation_serializes() {
        let confirmation = BookingConfirmation::new(
            &CATEGORIES[2],
            GenderOption::Unisex,
            Quantity::new(25),
            "https://wa.me/1?text=x".to_string(),
        );
        let json = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(json["category"]["title"], "Varsity Jacket");
        assert_eq!(json["gender"], "Unisex");
        assert_eq!(json["quantity"], 25);
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(BookingStatus::AwaitingQuantity.as_str(), "awaiting_quantity");
        assert_eq!(BookingStatus::Confirmed.as_str(), "confirmed");
    }
}

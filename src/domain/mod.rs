//! Domain models - catalog, selection, and value types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Category` / `GenderOption` - the fixed picker catalog
//! - `Selection` / `BookingStatus` - the visitor's in-progress choice
//! - `BookingConfirmation` - the request produced on confirm
//! - `Quantity` / `LatLng` - clamped value types

pub mod booking;
pub mod catalog;
pub mod types;

pub use booking::{BookingConfirmation, BookingStatus, Selection};
pub use catalog::{Category, GalleryFilter, GenderOption, CATEGORIES};
pub use types::{LatLng, Quantity};

//! Shared value types for the booking core

use serde::Serialize;
use std::fmt;

/// Number of pieces requested. Never below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const MIN: Quantity = Quantity(1);

    /// Clamp to the minimum of 1
    #[inline]
    pub fn new(n: u32) -> Self {
        Self(n.max(1))
    }

    /// Clamp a signed value; zero and negatives become 1
    #[inline]
    pub fn from_signed(n: i64) -> Self {
        Self::new(u32::try_from(n.max(1)).unwrap_or(u32::MAX))
    }

    /// Parse free-form user input. Anything that is not a finite number
    /// of at least 1 yields 1; fractions truncate.
    pub fn parse_lenient(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i64>() {
            return Self::from_signed(n);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 1.0 => {
                Self::new(if v >= u32::MAX as f64 { u32::MAX } else { v.trunc() as u32 })
            }
            _ => Self::MIN,
        }
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn saturating_add(self, step: u32) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    /// Subtract, flooring at 1
    #[inline]
    pub fn saturating_sub(self, step: u32) -> Self {
        Self::new(self.0.saturating_sub(step))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A map coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Offset by the given deltas
    #[inline]
    pub fn offset(&self, d_lat: f64, d_lng: f64) -> Self {
        Self { lat: self.lat + d_lat, lng: self.lng + d_lng }
    }

    /// Clamp each axis to within `radius` of `center`
    pub fn clamp_around(&self, center: LatLng, radius: f64) -> Self {
        let radius = radius.abs();
        Self {
            lat: self.lat.clamp(center.lat - radius, center.lat + radius),
            lng: self.lng.clamp(center.lng - radius, center.lng + radius),
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

//! Map-rendering capability consumed by the simulated tracker
//!
//! The tracker never draws anything itself. It drives a `MapSurface` through
//! five calls: create the map, add a tile layer, create the marker, move it,
//! and destroy the map.

use crate::domain::types::LatLng;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Rendering library not available yet; worth retrying
    #[error("map library not loaded")]
    NotLoaded,
    #[error("map error: {0}")]
    Failed(String),
}

/// Tile layer options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerOptions {
    pub max_zoom: u8,
    pub attribution: String,
}

pub trait MapSurface: Send {
    fn create_map(&mut self, origin: LatLng, zoom: u8) -> Result<(), MapError>;
    fn add_tile_layer(&mut self, url: &str, opts: &TileLayerOptions) -> Result<(), MapError>;
    fn create_marker(&mut self, origin: LatLng, popup: &str) -> Result<(), MapError>;
    fn set_marker_position(&mut self, lat: f64, lng: f64);
    fn destroy_map(&mut self);
}

/// Map surface that only logs. Used when no renderer is attached.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    marker: Option<LatLng>,
    created: bool,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapSurface for HeadlessMap {
    fn create_map(&mut self, origin: LatLng, zoom: u8) -> Result<(), MapError> {
        self.created = true;
        info!(origin = %origin, zoom = zoom, "map_created");
        Ok(())
    }

    fn add_tile_layer(&mut self, url: &str, opts: &TileLayerOptions) -> Result<(), MapError> {
        debug!(url = %url, max_zoom = opts.max_zoom, attribution = %opts.attribution, "map_tile_layer_added");
        Ok(())
    }

    fn create_marker(&mut self, origin: LatLng, popup: &str) -> Result<(), MapError> {
        self.marker = Some(origin);
        debug!(position = %origin, popup = %popup, "map_marker_created");
        Ok(())
    }

    fn set_marker_position(&mut self, lat: f64, lng: f64) {
        let position = LatLng::new(lat, lng);
        self.marker = Some(position);
        debug!(position = %position, "map_marker_moved");
    }

    fn destroy_map(&mut self) {
        if self.created {
            info!("map_destroyed");
        }
        self.created = false;
        self.marker = None;
    }
}

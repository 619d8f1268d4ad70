//! Keeps the bar docked at the top of the screen
//!
//! Every geometry change is applied to the bar and then pushed to the shadow
//! companion before returning, so the two never disagree between frames.

use log::{debug, info};

use crate::geometry::{DpiContext, Rect};

use super::{BarRegistrar, BarSurface, Companions};

/// Owns the bar's current logical geometry
pub struct PositionCoordinator {
    geometry: Rect,
}

impl PositionCoordinator {
    pub fn new(initial: Rect) -> Self {
        Self {
            geometry: initial.pinned_to_origin(),
        }
    }

    /// Current geometry in logical units
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Follow a new monitor resolution given in device pixels.
    ///
    /// Only the width tracks the monitor; the height stays whatever the bar's
    /// content asked for.
    pub fn apply_geometry(
        &mut self,
        raw_width: u32,
        raw_height: u32,
        dpi: DpiContext,
        surface: &mut dyn BarSurface,
        companions: &Companions,
    ) -> Rect {
        let logical = dpi.transform_from_pixels(raw_width, raw_height);
        info!(
            "Applying display geometry {}x{} px -> {}x{} at {} dpi",
            raw_width,
            raw_height,
            logical.width,
            logical.height,
            dpi.dpi()
        );
        let geometry = Rect::new(0, 0, logical.width, self.geometry.height);
        self.apply(geometry, surface, companions)
    }

    /// Re-dock after the shell reported that docked bars moved
    pub fn on_position_changed(
        &mut self,
        registrar: &mut BarRegistrar,
        surface: &mut dyn BarSurface,
        companions: &Companions,
    ) -> Rect {
        let dpi = DpiContext::new(surface.dpi());
        let requested = dpi.size_to_device(self.geometry.size());

        let geometry = match registrar.set_position(requested) {
            Some(granted) => Rect::new(0, 0, dpi.to_logical(granted.width), self.geometry.height),
            None => self.geometry.pinned_to_origin(),
        };
        self.apply(geometry, surface, companions)
    }

    /// Pull the bar back to the top edge if something else moved it.
    ///
    /// Returns whether a correction was applied.
    pub fn on_location_changed(
        &mut self,
        surface: &mut dyn BarSurface,
        companions: &Companions,
    ) -> bool {
        let current = surface.bounds();
        if current.y == 0 {
            return false;
        }

        debug!("Bar moved to y={}, pinning back to the top edge", current.y);
        self.apply(Rect { y: 0, ..current }, surface, companions);
        true
    }

    fn apply(
        &mut self,
        geometry: Rect,
        surface: &mut dyn BarSurface,
        companions: &Companions,
    ) -> Rect {
        self.geometry = geometry;
        surface.set_bounds(geometry);
        companions.sync_shadow(&geometry);
        geometry
    }
}

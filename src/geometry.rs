//! Geometry helpers: rectangles, sizes and DPI conversion
//!
//! The shell reports sizes in device pixels while the bar lays itself out in
//! device-independent units (1/96 inch). `DpiContext` converts between the two.

/// Baseline DPI of a 100% scaled monitor
pub const DEFAULT_DPI: u32 = 96;

/// Rectangle structure for layout calculations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Same size, moved to the top-left corner of the screen
    pub fn pinned_to_origin(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            ..*self
        }
    }
}

/// Size structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// DPI of the monitor the bar currently lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpiContext {
    dpi: u32,
}

impl DpiContext {
    pub fn new(dpi: u32) -> Self {
        // A zero DPI comes back from GetDpiForWindow on an invalid handle
        let dpi = if dpi == 0 { DEFAULT_DPI } else { dpi };
        Self { dpi }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Calculate DPI scaling factor
    pub fn scale(&self) -> f64 {
        self.dpi as f64 / DEFAULT_DPI as f64
    }

    /// Device pixels to logical units
    pub fn to_logical(&self, pixels: i32) -> i32 {
        (pixels as f64 / self.scale()).round() as i32
    }

    /// Logical units to device pixels
    pub fn to_device(&self, logical: i32) -> i32 {
        (logical as f64 * self.scale()).round() as i32
    }

    /// Convert a raw device-pixel size to logical units
    pub fn transform_from_pixels(&self, width: u32, height: u32) -> Size {
        Size::new(self.to_logical(width as i32), self.to_logical(height as i32))
    }

    pub fn size_to_device(&self, size: Size) -> Size {
        Size::new(self.to_device(size.width), self.to_device(size.height))
    }

    pub fn rect_to_device(&self, rect: &Rect) -> Rect {
        Rect::new(
            self.to_device(rect.x),
            self.to_device(rect.y),
            self.to_device(rect.width),
            self.to_device(rect.height),
        )
    }

    pub fn rect_to_logical(&self, rect: &Rect) -> Rect {
        Rect::new(
            self.to_logical(rect.x),
            self.to_logical(rect.y),
            self.to_logical(rect.width),
            self.to_logical(rect.height),
        )
    }
}

impl Default for DpiContext {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

/// Unpack the new resolution carried by a display-change notification.
///
/// The width sits in the low word and the height in the high word.
pub fn decode_display_change(lparam: isize) -> (u32, u32) {
    let packed = lparam as u32;
    (packed & 0xFFFF, packed >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_units_at_common_scales() {
        assert_eq!(DpiContext::new(96).to_logical(1920), 1920);
        assert_eq!(DpiContext::new(120).to_logical(1920), 1536);
        assert_eq!(DpiContext::new(144).to_logical(3840), 2560);
        assert_eq!(DpiContext::new(192).to_device(40), 80);
    }

    #[test]
    fn zero_dpi_falls_back_to_baseline() {
        let dpi = DpiContext::new(0);
        assert_eq!(dpi.dpi(), DEFAULT_DPI);
        assert_eq!(dpi.to_logical(1280), 1280);
    }

    #[test]
    fn transform_from_pixels_scales_both_axes() {
        let size = DpiContext::new(144).transform_from_pixels(2880, 1620);
        assert_eq!(size, Size::new(1920, 1080));
    }

    #[test]
    fn display_change_unpacks_low_and_high_words() {
        let lparam = ((1080u32 << 16) | 1920u32) as isize;
        assert_eq!(decode_display_change(lparam), (1920, 1080));

        // 4K height does not fit a signed 16-bit word
        let lparam = ((2160u32 << 16) | 3840u32) as isize;
        assert_eq!(decode_display_change(lparam), (3840, 2160));
    }

    #[test]
    fn pinned_rect_keeps_size() {
        let rect = Rect::new(15, -8, 1600, 32).pinned_to_origin();
        assert_eq!(rect, Rect::new(0, 0, 1600, 32));
        assert_eq!(rect.bottom(), 32);
    }
}

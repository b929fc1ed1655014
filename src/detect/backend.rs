use anyhow::Result;

use crate::detect::result::RawDetection;

/// Detector backend trait.
///
/// Implementations own their model state; `detect` takes `&mut self` so a
/// backend may keep scratch buffers between calls. Backends run on the
/// inference worker thread and must treat the pixel slice as read-only and
/// ephemeral.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an RGB8 image.
    ///
    /// `pixels` holds `width * height * 3` bytes in row-major order.
    /// Returned boxes are in source-image pixel coordinates.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook, called once before the first request.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

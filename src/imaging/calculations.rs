//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale dimensions down so the longer edge fits within `max_edge`.
///
/// Aspect ratio is preserved; the shorter edge is rounded and never drops
/// below 1px. Images already within the limit are returned unchanged (they
/// are never upscaled), and a `max_edge` of 0 means "no limit".
///
/// # Arguments
/// * `original` - Source dimensions (width, height)
/// * `max_edge` - Maximum length of the longer edge in pixels
///
/// # Returns
/// * `(width, height)` - Output dimensions
///
/// # Examples
/// ```
/// # use wp_image_optimiser::imaging::fit_within;
/// // 4000x3000 landscape into 1200 → 1200x900
/// assert_eq!(fit_within((4000, 3000), 1200), (1200, 900));
///
/// // Portrait: the height is the longer edge
/// assert_eq!(fit_within((1000, 2000), 800), (400, 800));
///
/// // Already small enough
/// assert_eq!(fit_within((640, 480), 1200), (640, 480));
/// ```
pub fn fit_within(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if max_edge == 0 || longer_edge <= max_edge {
        return original;
    }

    let ratio = max_edge as f64 / longer_edge as f64;
    if orig_w >= orig_h {
        let h = ((orig_h as f64 * ratio).round() as u32).max(1);
        (max_edge, h)
    } else {
        let w = ((orig_w as f64 * ratio).round() as u32).max(1);
        (w, max_edge)
    }
}

/// Map a `(0, 1]` quality onto the 1–100 scale used by the JPEG encoder.
pub fn percent_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

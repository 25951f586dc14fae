//! Pure calculation functions for wallpaper geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Rounding is round-half-up (`f64::round` on non-negative values) everywhere.

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

fn round_px(value: f64) -> u32 {
    value.round() as u32
}

/// True when `target` is relatively wider than `source`.
///
/// Compares `tw/th > sw/sh` by cross-multiplication so equal aspect ratios
/// never flip on floating point noise.
fn target_is_wider(source: (u32, u32), target: (u32, u32)) -> bool {
    let (sw, sh) = (source.0 as u64, source.1 as u64);
    let (tw, th) = (target.0 as u64, target.1 as u64);
    tw * sh > sw * th
}

/// Centered crop of `source` matching the aspect ratio of `target`.
///
/// The crop is later resized to exactly `target`. Nothing is padded; the
/// parts of the source outside the matching aspect ratio are discarded.
///
/// # Examples
/// ```
/// # use apod_wallpaper::imaging::{cover_crop, Rect};
/// // 4256x2832 photo onto a 1920x1080 screen: keep full width, trim top/bottom.
/// assert_eq!(
///     cover_crop((4256, 2832), (1920, 1080)),
///     Rect { left: 0, top: 219, width: 4256, height: 2394 }
/// );
/// ```
pub fn cover_crop(source: (u32, u32), target: (u32, u32)) -> Rect {
    let (src_w, src_h) = source;
    let (dst_w, dst_h) = target;

    if target_is_wider(source, target) {
        // Full source width, trim top and bottom
        let height = round_px(dst_h as f64 / dst_w as f64 * src_w as f64)
            .min(src_h)
            .max(1);
        Rect {
            left: 0,
            top: round_px(src_h.saturating_sub(height) as f64 / 2.0),
            width: src_w,
            height,
        }
    } else {
        // Full source height, trim left and right
        let width = round_px(dst_w as f64 / dst_h as f64 * src_h as f64)
            .min(src_w)
            .max(1);
        Rect {
            left: round_px(src_w.saturating_sub(width) as f64 / 2.0),
            top: 0,
            width,
            height: src_h,
        }
    }
}

/// Placement of the aspect-preserving scaled source on a `target` canvas.
///
/// The binding axis is picked by the same aspect comparison as
/// [`cover_crop`], so the scaled content never exceeds the canvas and the
/// bars on the free axis are never negative. Extents are additionally
/// clamped to `[1, target]` to absorb rounding.
///
/// # Examples
/// ```
/// # use apod_wallpaper::imaging::{fit_with_bars, Rect};
/// // The same photo letterboxed: height-bound, bars left and right.
/// assert_eq!(
///     fit_with_bars((4256, 2832), (1920, 1080)),
///     Rect { left: 149, top: 0, width: 1623, height: 1080 }
/// );
/// ```
pub fn fit_with_bars(source: (u32, u32), target: (u32, u32)) -> Rect {
    let (src_w, src_h) = source;
    let (dst_w, dst_h) = target;

    let (width, height) = if target_is_wider(source, target) {
        // Height-bound: bars left and right
        let w = round_px(src_w as f64 * dst_h as f64 / src_h as f64);
        (w.min(dst_w).max(1), dst_h)
    } else {
        // Width-bound: bars top and bottom
        let h = round_px(src_h as f64 * dst_w as f64 / src_w as f64);
        (dst_w, h.min(dst_h).max(1))
    };

    Rect {
        left: round_px(dst_w.saturating_sub(width) as f64 / 2.0),
        top: round_px(dst_h.saturating_sub(height) as f64 / 2.0),
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: &[(u32, u32)] = &[
        (4256, 2832),
        (2832, 4256),
        (1000, 1000),
        (1, 1),
        (7, 3),
        (3, 7),
        (1920, 1080),
        (5000, 200),
        (200, 5000),
        (641, 479),
    ];

    const TARGETS: &[(u32, u32)] = &[
        (1920, 1080),
        (1080, 1920),
        (3840, 2160),
        (1280, 1024),
        (800, 800),
        (1, 1),
        (33, 17),
    ];

    // =========================================================================
    // cover_crop
    // =========================================================================

    #[test]
    fn cover_reference_landscape_example() {
        let crop = cover_crop((4256, 2832), (1920, 1080));
        assert_eq!(crop.width, 4256);
        assert_eq!(crop.height, 2394); // round(1080/1920 * 4256)
        assert_eq!(crop.left, 0);
        assert_eq!(crop.top, 219); // round((2832 - 2394) / 2)
    }

    #[test]
    fn cover_taller_target_trims_sides() {
        // 1600x900 → 900x1600: full height, crop width = round(900/1600 * 900) = 506
        let crop = cover_crop((1600, 900), (900, 1600));
        assert_eq!(crop.height, 900);
        assert_eq!(crop.width, 506);
        assert_eq!(crop.top, 0);
        assert_eq!(crop.left, 547); // round((1600 - 506) / 2) = round(547.0)
    }

    #[test]
    fn cover_same_aspect_keeps_everything() {
        let crop = cover_crop((3840, 2160), (1920, 1080));
        assert_eq!(
            crop,
            Rect {
                left: 0,
                top: 0,
                width: 3840,
                height: 2160
            }
        );
    }

    #[test]
    fn cover_odd_margin_rounds_half_up() {
        // 10x5 → 1x1: crop 5x5, left = round(2.5) = 3
        let crop = cover_crop((10, 5), (1, 1));
        assert_eq!(crop.width, 5);
        assert_eq!(crop.left, 3);
        assert!(crop.right() <= 10);
    }

    #[test]
    fn cover_crop_is_contained_and_matches_aspect() {
        for &src in SOURCES {
            for &dst in TARGETS {
                let crop = cover_crop(src, dst);
                assert!(crop.width >= 1 && crop.height >= 1, "{src:?}->{dst:?}");
                assert!(crop.right() <= src.0, "{src:?}->{dst:?}: {crop:?}");
                assert!(crop.bottom() <= src.1, "{src:?}->{dst:?}: {crop:?}");

                // One axis is the full source, the other within a pixel of exact
                if crop.width == src.0 {
                    let exact = dst.1 as f64 / dst.0 as f64 * src.0 as f64;
                    let exact = exact.min(src.1 as f64).max(1.0);
                    assert!(
                        (crop.height as f64 - exact).abs() <= 1.0,
                        "{src:?}->{dst:?}: {crop:?}"
                    );
                } else {
                    assert_eq!(crop.height, src.1, "{src:?}->{dst:?}");
                    let exact = dst.0 as f64 / dst.1 as f64 * src.1 as f64;
                    let exact = exact.min(src.0 as f64).max(1.0);
                    assert!(
                        (crop.width as f64 - exact).abs() <= 1.0,
                        "{src:?}->{dst:?}: {crop:?}"
                    );
                }
            }
        }
    }

    // =========================================================================
    // fit_with_bars
    // =========================================================================

    #[test]
    fn fit_reference_example_is_height_bound() {
        // A width-bound fit would need round(2832/4256 * 1920) = 1278 > 1080 rows.
        // The aspect comparison selects height-bound instead, so no negative bars.
        let placed = fit_with_bars((4256, 2832), (1920, 1080));
        assert_eq!(placed.height, 1080);
        assert_eq!(placed.width, 1623); // round(4256/2832 * 1080) = round(1623.05)
        assert_eq!(placed.top, 0);
        assert_eq!(placed.left, 149); // round((1920 - 1623) / 2) = round(148.5)
    }

    #[test]
    fn fit_wide_source_on_tall_target_bars_top_and_bottom() {
        // 2000x1000 onto 1000x1000: width-bound, 1000x500 at top 250
        let placed = fit_with_bars((2000, 1000), (1000, 1000));
        assert_eq!(
            placed,
            Rect {
                left: 0,
                top: 250,
                width: 1000,
                height: 500
            }
        );
    }

    #[test]
    fn fit_same_aspect_fills_canvas() {
        let placed = fit_with_bars((1280, 720), (1920, 1080));
        assert_eq!(
            placed,
            Rect {
                left: 0,
                top: 0,
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn fit_extreme_panorama_keeps_at_least_one_row() {
        let placed = fit_with_bars((100_000, 1), (10, 10));
        assert_eq!(placed.width, 10);
        assert_eq!(placed.height, 1);
    }

    #[test]
    fn fit_is_contained_centered_and_preserves_aspect() {
        for &src in SOURCES {
            for &dst in TARGETS {
                let placed = fit_with_bars(src, dst);
                assert!(placed.right() <= dst.0, "{src:?}->{dst:?}: {placed:?}");
                assert!(placed.bottom() <= dst.1, "{src:?}->{dst:?}: {placed:?}");
                assert!(
                    placed.width == dst.0 || placed.height == dst.1,
                    "{src:?}->{dst:?}: {placed:?} touches neither edge"
                );

                // Centered: opposing bars differ by at most one pixel
                let left_bar = placed.left as i64;
                let right_bar = (dst.0 - placed.right()) as i64;
                let top_bar = placed.top as i64;
                let bottom_bar = (dst.1 - placed.bottom()) as i64;
                assert!((left_bar - right_bar).abs() <= 1, "{src:?}->{dst:?}");
                assert!((top_bar - bottom_bar).abs() <= 1, "{src:?}->{dst:?}");

                // Aspect preserved within a pixel of rounding on the free axis
                if placed.height == dst.1 {
                    let exact = src.0 as f64 * dst.1 as f64 / src.1 as f64;
                    let exact = exact.min(dst.0 as f64).max(1.0);
                    assert!((placed.width as f64 - exact).abs() <= 1.0);
                } else {
                    let exact = src.1 as f64 * dst.0 as f64 / src.0 as f64;
                    let exact = exact.min(dst.1 as f64).max(1.0);
                    assert!((placed.height as f64 - exact).abs() <= 1.0);
                }
            }
        }
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect {
            left: 2,
            top: 3,
            width: 4,
            height: 5,
        };
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 7));
        assert!(!r.contains(5, 8));
        assert!(!r.contains(1, 3));
    }
}

//! Pixel geometry for zoomed scenes: crop boxes around a focus point,
//! aspect-ratio fitting, and the letterboxed showcase placement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, ShortsError};

/// Width and height of an image or output frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn ensure_positive(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ShortsError::DegenerateCrop(format!(
                "image dimensions {}x{} must be positive",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Target ratio of the output frame, e.g. 9:16 for vertical shorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ShortsError::InvalidConfig(format!(
                "aspect ratio {width}:{height} must have positive terms"
            )));
        }
        Ok(Self { width, height })
    }

    /// Returns width/height as float.
    pub fn ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Normalised description of where and how tightly to crop for one scene.
///
/// `x` and `y` are fractions of the image width and height. `zoom` is the
/// magnification, so the crop shows `1 / zoom` of each source dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl FocusPoint {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// Checks the zoom and pulls the coordinates back into `[0, 1]`.
    fn sanitized(&self) -> Result<Self> {
        if !self.zoom.is_finite() || self.zoom < 1.0 {
            return Err(ShortsError::InvalidFocus(format!(
                "zoom {} must be a finite value of at least 1.0",
                self.zoom
            )));
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(ShortsError::InvalidFocus(format!(
                "focus coordinates ({}, {}) are not finite",
                self.x, self.y
            )));
        }
        Ok(Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
            zoom: self.zoom,
        })
    }
}

/// Integer pixel rectangle with exclusive `right`/`bottom` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    /// Box covering the entire image.
    pub fn full(size: ImageSize) -> Result<Self> {
        size.ensure_positive()?;
        Ok(Self {
            left: 0,
            top: 0,
            right: size.width,
            bottom: size.height,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.width()) / f64::from(self.height())
    }

    /// Trims this box to `target`; see [`fit_to_aspect_ratio`].
    pub fn fit_to(&self, target: AspectRatio) -> Result<Self> {
        fit_to_aspect_ratio(*self, target)
    }
}

impl fmt::Display for CropBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Computes the crop box for `focus` on an image of the given size.
///
/// The box is centred on the focus point and sized `1 / zoom` of the image.
/// When the box would overhang an edge it is translated back inside instead
/// of being cut, so the requested zoom survives whenever the image can hold
/// it. The size only shrinks when the image itself is smaller than the
/// desired extent.
pub fn compute_crop_box(image: ImageSize, focus: FocusPoint) -> Result<CropBox> {
    image.ensure_positive()?;
    let focus = focus.sanitized()?;

    let (left, right) = place_span(image.width, focus.x, focus.zoom)?;
    let (top, bottom) = place_span(image.height, focus.y, focus.zoom)?;

    Ok(CropBox {
        left,
        top,
        right,
        bottom,
    })
}

/// Places a span of `limit / zoom` pixels centred on `fraction · limit`
/// along one axis, translated to stay within `[0, limit]`.
fn place_span(limit: u32, fraction: f64, zoom: f64) -> Result<(u32, u32)> {
    let limit_f = f64::from(limit);
    let desired = (limit_f / zoom).round();
    if desired < 1.0 {
        return Err(ShortsError::DegenerateCrop(format!(
            "zoom {zoom} leaves less than one pixel of a {limit}px axis"
        )));
    }

    let extent = desired.min(limit_f);
    let start = (fraction * limit_f - extent / 2.0)
        .round()
        .clamp(0.0, limit_f - extent);

    // Both values are integral and within [0, limit] at this point.
    let start = start as u32;
    Ok((start, start + extent as u32))
}

/// Shrinks one dimension of `crop` so its ratio matches `target`.
///
/// A box that is too wide loses equal margins left and right; one that is
/// too tall loses equal margins top and bottom. The result is never larger
/// than the input and its width is within one pixel of `height * ratio`.
/// A box that already meets that bound is returned unchanged, which makes
/// the operation idempotent.
pub fn fit_to_aspect_ratio(crop: CropBox, target: AspectRatio) -> Result<CropBox> {
    let width = crop.width();
    let height = crop.height();
    if width == 0 || height == 0 {
        return Err(ShortsError::DegenerateCrop(format!(
            "cannot fit an empty crop {crop} to {target}"
        )));
    }

    let ratio = target.ratio();
    if width_error(width, height, ratio) <= 1.0 {
        return Ok(crop);
    }

    if crop.ratio() > ratio {
        let new_width = scaled(height, ratio).clamp(1, width);
        return Ok(trim(crop, new_width, height));
    }

    let mut new_height = scaled(width, 1.0 / ratio).clamp(1, height);
    let mut new_width = width;
    if width_error(new_width, new_height, ratio) > 1.0 {
        // Wider than 2:1 a rounded height can miss by more than a pixel of
        // width, so round the height down and trim the width to match.
        new_height = ((f64::from(width) / ratio).floor() as u32).clamp(1, height);
        new_width = scaled(new_height, ratio).clamp(1, width);
    }
    Ok(trim(crop, new_width, new_height))
}

fn width_error(width: u32, height: u32, ratio: f64) -> f64 {
    (f64::from(width) - f64::from(height) * ratio).abs()
}

/// Shrinks `crop` to `width` x `height` around its centre.
fn trim(crop: CropBox, width: u32, height: u32) -> CropBox {
    let left = crop.left + (crop.width() - width) / 2;
    let top = crop.top + (crop.height() - height) / 2;
    CropBox {
        left,
        top,
        right: left + width,
        bottom: top + height,
    }
}

fn scaled(value: u32, factor: f64) -> u32 {
    // Saturating float-to-int conversion keeps absurd ratios in range.
    (f64::from(value) * factor).round() as u32
}

/// Where the showcase image sits on the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Letterboxes the whole artwork onto the output frame above a caption band.
///
/// The image is scaled to fit inside `frame.width - padding` by
/// `frame.height - text_height`, keeping its own ratio, then centred
/// horizontally and within the area above the caption band.
pub fn showcase_placement(
    image: ImageSize,
    frame: ImageSize,
    padding: u32,
    text_height: u32,
) -> Result<Placement> {
    image.ensure_positive()?;
    let max_width = frame.width.checked_sub(padding).filter(|w| *w > 0);
    let max_height = frame.height.checked_sub(text_height).filter(|h| *h > 0);
    let (Some(max_width), Some(max_height)) = (max_width, max_height) else {
        return Err(ShortsError::InvalidConfig(format!(
            "showcase margins ({padding}px padding, {text_height}px caption) do not fit a {frame} frame"
        )));
    };

    let image_ratio = image.width as f64 / image.height as f64;
    let area_ratio = max_width as f64 / max_height as f64;
    let (width, height) = if image_ratio > area_ratio {
        (max_width, (max_width as f64 / image_ratio) as u32)
    } else {
        ((max_height as f64 * image_ratio) as u32, max_height)
    };
    let (width, height) = (width.max(1), height.max(1));

    Ok(Placement {
        x: (frame.width - width) / 2,
        y: (frame.height - height - text_height) / 2,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTRAIT: AspectRatio = AspectRatio {
        width: 9,
        height: 16,
    };

    fn size(width: u32, height: u32) -> ImageSize {
        ImageSize::new(width, height)
    }

    fn fits_within(crop: CropBox, image: ImageSize) -> bool {
        crop.left < crop.right
            && crop.top < crop.bottom
            && crop.right <= image.width
            && crop.bottom <= image.height
    }

    #[test]
    fn centred_crop_keeps_requested_zoom() {
        let crop = compute_crop_box(size(1000, 800), FocusPoint::new(0.5, 0.5, 2.0)).unwrap();
        assert_eq!(
            crop,
            CropBox {
                left: 250,
                top: 200,
                right: 750,
                bottom: 600
            }
        );
    }

    #[test]
    fn crop_near_edge_is_translated_not_shrunk() {
        let crop = compute_crop_box(size(1000, 1000), FocusPoint::new(0.95, 0.5, 2.0)).unwrap();
        assert_eq!(crop.width(), 500);
        assert_eq!(crop.right, 1000);
        assert_eq!(crop.left, 500);

        let crop = compute_crop_box(size(1000, 1000), FocusPoint::new(0.02, 0.0, 4.0)).unwrap();
        assert_eq!((crop.left, crop.top), (0, 0));
        assert_eq!((crop.width(), crop.height()), (250, 250));
    }

    #[test]
    fn crops_stay_inside_the_image_with_expected_area() {
        let image = size(1280, 720);
        for zoom in [1.0, 1.3, 2.0, 3.7, 8.0] {
            for x in [0.0, 0.1, 0.5, 0.9, 1.0] {
                for y in [0.0, 0.33, 0.5, 1.0] {
                    let crop = compute_crop_box(image, FocusPoint::new(x, y, zoom)).unwrap();
                    assert!(fits_within(crop, image), "{crop} escapes {image}");

                    let expected = (1280.0 / zoom) * (720.0 / zoom);
                    let actual = f64::from(crop.width()) * f64::from(crop.height());
                    let tolerance = 1280.0 / zoom + 720.0 / zoom + 1.0;
                    assert!((actual - expected).abs() <= tolerance);
                }
            }
        }
    }

    #[test]
    fn zoom_of_one_covers_the_whole_image() {
        let crop = compute_crop_box(size(640, 480), FocusPoint::new(0.9, 0.1, 1.0)).unwrap();
        assert_eq!(crop, CropBox::full(size(640, 480)).unwrap());
    }

    #[test]
    fn out_of_range_coordinates_are_clamped() {
        let clamped = compute_crop_box(size(800, 600), FocusPoint::new(1.7, -0.4, 2.0)).unwrap();
        let edge = compute_crop_box(size(800, 600), FocusPoint::new(1.0, 0.0, 2.0)).unwrap();
        assert_eq!(clamped, edge);
    }

    #[test]
    fn rejects_zoom_below_one_and_non_finite_focus() {
        let err = compute_crop_box(size(800, 600), FocusPoint::new(0.5, 0.5, 0.8)).unwrap_err();
        assert!(matches!(err, ShortsError::InvalidFocus(_)));

        let err =
            compute_crop_box(size(800, 600), FocusPoint::new(f64::NAN, 0.5, 2.0)).unwrap_err();
        assert!(matches!(err, ShortsError::InvalidFocus(_)));
    }

    #[test]
    fn degenerate_inputs_are_reported() {
        let err = compute_crop_box(size(0, 600), FocusPoint::new(0.5, 0.5, 1.0)).unwrap_err();
        assert!(matches!(err, ShortsError::DegenerateCrop(_)));

        let err = compute_crop_box(size(100, 100), FocusPoint::new(0.5, 0.5, 500.0)).unwrap_err();
        assert!(matches!(err, ShortsError::DegenerateCrop(_)));
    }

    #[test]
    fn wide_crop_loses_side_margins() {
        let crop = CropBox {
            left: 100,
            top: 0,
            right: 1100,
            bottom: 900,
        };
        let fitted = fit_to_aspect_ratio(crop, PORTRAIT).unwrap();
        assert_eq!((fitted.top, fitted.bottom), (0, 900));
        assert_eq!(fitted.width(), 506);
        assert_eq!(fitted.left, 100 + (1000 - 506) / 2);
    }

    #[test]
    fn tall_crop_loses_top_and_bottom_margins() {
        let crop = CropBox {
            left: 0,
            top: 0,
            right: 900,
            bottom: 3000,
        };
        let fitted = fit_to_aspect_ratio(crop, PORTRAIT).unwrap();
        assert_eq!((fitted.left, fitted.right), (0, 900));
        assert_eq!(fitted.height(), 1600);
        assert_eq!(fitted.top, 700);
    }

    #[test]
    fn fitted_ratio_is_within_a_pixel_and_never_grows() {
        let target = PORTRAIT;
        for (w, h) in [(1000, 900), (333, 1000), (1919, 1079), (7, 3), (9, 16)] {
            let crop = CropBox::full(size(w, h)).unwrap();
            let fitted = crop.fit_to(target).unwrap();
            assert!(fitted.width() <= w && fitted.height() <= h);
            let ideal_width = f64::from(fitted.height()) * target.ratio();
            assert!((f64::from(fitted.width()) - ideal_width).abs() <= 1.0);
        }
    }

    #[test]
    fn aspect_fit_is_idempotent() {
        let banner = AspectRatio::new(4, 1).unwrap();
        let sizes = [
            (1000, 900),
            (333, 1000),
            (1919, 1079),
            (1081, 1921),
            (50, 7),
            (998, 250),
        ];
        for target in [PORTRAIT, banner] {
            for (w, h) in sizes {
                let once = CropBox::full(size(w, h)).unwrap().fit_to(target).unwrap();
                let twice = once.fit_to(target).unwrap();
                assert_eq!(once, twice, "{w}x{h} to {target}");
            }
        }
    }

    #[test]
    fn very_wide_targets_keep_the_width_within_a_pixel() {
        let banner = AspectRatio::new(4, 1).unwrap();
        let crop = CropBox {
            left: 0,
            top: 0,
            right: 998,
            bottom: 250,
        };
        let fitted = crop.fit_to(banner).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (996, 249));
        assert_eq!((fitted.left, fitted.top), (1, 0));

        for (w, h) in [(998, 250), (1001, 250), (4001, 1000), (999, 300), (3000, 700)] {
            let fitted = CropBox::full(size(w, h)).unwrap().fit_to(banner).unwrap();
            assert!(fitted.width() <= w && fitted.height() <= h);
            let ideal_width = f64::from(fitted.height()) * banner.ratio();
            assert!(
                (f64::from(fitted.width()) - ideal_width).abs() <= 1.0,
                "{w}x{h} fitted to {fitted}"
            );
        }
    }

    #[test]
    fn showcase_landscape_image_is_width_bound() {
        let placement =
            showcase_placement(size(2000, 1000), size(1080, 1920), 200, 550).unwrap();
        assert_eq!(
            placement,
            Placement {
                x: 100,
                y: (1920 - 440 - 550) / 2,
                width: 880,
                height: 440,
            }
        );
    }

    #[test]
    fn showcase_portrait_image_is_height_bound() {
        let placement = showcase_placement(size(500, 1000), size(1080, 1920), 200, 550).unwrap();
        assert_eq!(placement.height, 1370);
        assert_eq!(placement.width, 685);
        assert_eq!(placement.x, (1080 - 685) / 2);
        assert_eq!(placement.y, 0);
    }

    #[test]
    fn showcase_rejects_margins_larger_than_frame() {
        let err = showcase_placement(size(500, 500), size(100, 100), 200, 10).unwrap_err();
        assert!(matches!(err, ShortsError::InvalidConfig(_)));
    }
}

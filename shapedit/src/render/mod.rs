//! Rasterises a feature collection, optionally over a basemap.
//!
//! [`Renderer::render`] is a pure function of its inputs: the same
//! collection, style, view and basemap always produce the same pixels.

use std::path::Path;

use geo::{coord, Coord};
use image::RgbaImage;
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Shader,
    Stroke, Transform,
};
use tracing::trace;

use crate::basemap::BasemapImage;
use crate::coord::{lon_lat_to_mercator, Bounds};
use crate::error::{ExportError, ValidationError};
use crate::store::{Crs, FeatureCollection, Geometry};
use crate::style::{ColorScale, Rgb, StyleConfig};
use crate::view::ViewExtent;

/// Largest canvas side accepted.
pub const MAX_CANVAS_SIZE: u32 = 8192;

const BACKGROUND: (u8, u8, u8) = (245, 245, 245);
const OUTLINE: (u8, u8, u8, u8) = (40, 40, 40, 200);
const OUTLINE_WIDTH: f32 = 0.8;
const LINE_WIDTH: f32 = 2.0;
const POINT_RADIUS: f32 = 4.0;

/// How layer coordinates map onto the display plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Geographic degrees projected to Web Mercator metres.
    Mercator,
    /// Coordinates drawn as stored.
    Identity,
}

impl Projection {
    pub fn for_crs(crs: &Crs) -> Self {
        match crs {
            Crs::Geographic { .. } => Projection::Mercator,
            _ => Projection::Identity,
        }
    }

    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Mercator => {
                let (x, y) = lon_lat_to_mercator(c.x, c.y);
                coord! { x: x, y: y }
            }
            Projection::Identity => c,
        }
    }
}

/// Bounds of the layer in display coordinates.
pub fn display_bounds(collection: &FeatureCollection) -> Option<Bounds> {
    let projection = Projection::for_crs(collection.crs());
    let mut bounds = Bounds::empty();
    for feature in collection.features() {
        for c in feature.geometry.coords() {
            let p = projection.apply(*c);
            bounds.extend(p.x, p.y);
        }
    }
    (!bounds.is_empty()).then_some(bounds)
}

/// Display-plane to pixel mapping for one render.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    extent: Bounds,
    scale: f64,
}

impl Viewport {
    fn new(bounds: &Bounds, width: u32, height: u32) -> Self {
        let extent = bounds.fitted_to_aspect(width, height);
        let scale = if extent.width() > 0.0 {
            width as f64 / extent.width()
        } else {
            1.0
        };
        Self { extent, scale }
    }

    fn to_px(&self, c: Coord<f64>) -> Option<(f32, f32)> {
        let x = (c.x - self.extent.min_x) * self.scale;
        let y = (self.extent.max_y - c.y) * self.scale;
        (x.is_finite() && y.is_finite()).then_some((x as f32, y as f32))
    }
}

fn solid(r: u8, g: u8, b: u8, a: u8) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(Color::from_rgba8(r, g, b, a)),
        anti_alias: true,
        ..Default::default()
    }
}

fn alpha(opacity_percent: u8) -> u8 {
    ((opacity_percent.min(100) as u32 * 255 + 50) / 100) as u8
}

/// Fixed-size canvas renderer.
#[derive(Debug, Clone)]
pub struct Renderer {
    blank: Pixmap,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        let invalid = || {
            ValidationError::Invalid(format!(
                "Canvas size {}x{} must be between 1 and {} pixels per side",
                width, height, MAX_CANVAS_SIZE
            ))
        };
        if width > MAX_CANVAS_SIZE || height > MAX_CANVAS_SIZE {
            return Err(invalid());
        }
        let mut blank = Pixmap::new(width, height).ok_or_else(invalid)?;
        blank.fill(Color::from_rgba8(BACKGROUND.0, BACKGROUND.1, BACKGROUND.2, 255));
        Ok(Self { blank })
    }

    pub fn width(&self) -> u32 {
        self.blank.width()
    }

    pub fn height(&self) -> u32 {
        self.blank.height()
    }

    /// Draws background, basemap (when the CRS allows one) and features.
    pub fn render(
        &self,
        collection: &FeatureCollection,
        style: &StyleConfig,
        view: &ViewExtent,
        basemap: Option<&BasemapImage>,
    ) -> Pixmap {
        let mut pixmap = self.blank.clone();
        let viewport = Viewport::new(&view.bounds, self.width(), self.height());

        if let Some(basemap) = basemap.filter(|_| collection.crs().supports_basemap()) {
            draw_basemap(&mut pixmap, &viewport, basemap);
        }

        let projection = Projection::for_crs(collection.crs());
        let scale = ColorScale::new(collection, style);
        let outline = solid(OUTLINE.0, OUTLINE.1, OUTLINE.2, OUTLINE.3);

        for feature in collection.features() {
            let (Rgb([r, g, b]), opacity) = scale.color_for(feature);
            let fill = solid(r, g, b, alpha(opacity));
            let geometry = feature.geometry.map_coords(|c| projection.apply(c));
            draw_geometry(&mut pixmap, &viewport, &geometry, &fill, &outline);
        }

        trace!(
            features = collection.len(),
            width = self.width(),
            height = self.height(),
            "Rendered map"
        );
        pixmap
    }
}

fn draw_geometry(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    geometry: &Geometry,
    fill: &Paint,
    outline: &Paint,
) {
    match geometry {
        Geometry::Point(c) => draw_point(pixmap, viewport, *c, fill, outline),
        Geometry::MultiPoint(points) => {
            for c in points {
                draw_point(pixmap, viewport, *c, fill, outline);
            }
        }
        Geometry::Polyline(parts) => {
            let mut pb = PathBuilder::new();
            for part in parts {
                trace_part(&mut pb, viewport, part, false);
            }
            if let Some(path) = pb.finish() {
                let stroke = Stroke {
                    width: LINE_WIDTH,
                    ..Default::default()
                };
                pixmap.stroke_path(&path, fill, &stroke, Transform::default(), None);
            }
        }
        Geometry::Polygon(rings) => {
            let mut pb = PathBuilder::new();
            for ring in rings {
                trace_part(&mut pb, viewport, &ring.points, true);
            }
            if let Some(path) = pb.finish() {
                pixmap.fill_path(&path, fill, FillRule::EvenOdd, Transform::default(), None);
                let stroke = Stroke {
                    width: OUTLINE_WIDTH,
                    ..Default::default()
                };
                pixmap.stroke_path(&path, outline, &stroke, Transform::default(), None);
            }
        }
    }
}

fn trace_part(pb: &mut PathBuilder, viewport: &Viewport, points: &[Coord<f64>], close: bool) {
    let mut started = false;
    for (x, y) in points.iter().filter_map(|c| viewport.to_px(*c)) {
        if started {
            pb.line_to(x, y);
        } else {
            pb.move_to(x, y);
            started = true;
        }
    }
    if started && close {
        pb.close();
    }
}

fn draw_point(pixmap: &mut Pixmap, viewport: &Viewport, c: Coord<f64>, fill: &Paint, outline: &Paint) {
    let Some((x, y)) = viewport.to_px(c) else {
        return;
    };
    if let Some(path) = PathBuilder::from_circle(x, y, POINT_RADIUS) {
        pixmap.fill_path(&path, fill, FillRule::Winding, Transform::default(), None);
        let stroke = Stroke {
            width: OUTLINE_WIDTH,
            ..Default::default()
        };
        pixmap.stroke_path(&path, outline, &stroke, Transform::default(), None);
    }
}

fn draw_basemap(pixmap: &mut Pixmap, viewport: &Viewport, basemap: &BasemapImage) {
    let Some(tiles) = to_pixmap(&basemap.image) else {
        return;
    };
    let b = &basemap.bounds;
    let s = viewport.scale;
    let transform = Transform::from_row(
        (b.width() / tiles.width() as f64 * s) as f32,
        0.0,
        0.0,
        (b.height() / tiles.height() as f64 * s) as f32,
        ((b.min_x - viewport.extent.min_x) * s) as f32,
        ((viewport.extent.max_y - b.max_y) * s) as f32,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..Default::default()
    };
    pixmap.draw_pixmap(0, 0, tiles.as_ref(), &paint, transform, None);
}

/// Converts straight-alpha RGBA to a premultiplied pixmap.
fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let data = image
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            let premultiply = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
            [premultiply(r), premultiply(g), premultiply(b), a]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

/// Encodes a rendered canvas as PNG.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))
}

/// Writes a rendered canvas to `path` as PNG.
pub fn save_png(pixmap: &Pixmap, path: &Path) -> Result<(), ExportError> {
    let bytes = encode_png(pixmap)?;
    std::fs::write(path, bytes).map_err(|e| ExportError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttributeValue, FeatureId};
    use crate::view::MapViewController;

    fn sample() -> FeatureCollection {
        crate::store::sample_collection()
    }

    fn view_of(collection: &FeatureCollection) -> ViewExtent {
        let mut view = MapViewController::new();
        view.fit(display_bounds(collection).unwrap());
        view.extent().unwrap()
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pixmap.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn test_rejects_bad_canvas() {
        assert!(Renderer::new(0, 10).is_err());
        assert!(Renderer::new(10, MAX_CANVAS_SIZE + 1).is_err());
    }

    #[test]
    fn test_points_drawn_over_background() {
        let c = sample();
        let renderer = Renderer::new(330, 220).unwrap();
        let pixmap = renderer.render(&c, &StyleConfig::for_collection(&c), &view_of(&c), None);

        // (10, 20) lands at (15, 10) with 100 px per unit.
        assert_eq!(pixel(&pixmap, 0, 219), [245, 245, 245, 255]);
        assert_ne!(pixel(&pixmap, 15, 10), [245, 245, 245, 255]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let c = sample();
        let renderer = Renderer::new(200, 150).unwrap();
        let style = StyleConfig::for_collection(&c);
        let view = view_of(&c);

        let a = renderer.render(&c, &style, &view, None);
        let b = renderer.render(&c, &style, &view, None);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_render_changes_with_data() {
        let mut c = sample();
        let renderer = Renderer::new(200, 150).unwrap();
        let style = StyleConfig::for_collection(&c);
        let view = view_of(&c);

        let before = renderer.render(&c, &style, &view, None);
        c.set_attribute(FeatureId(0), "zone", AttributeValue::Integer(9))
            .unwrap();
        let after = renderer.render(&c, &style, &view, None);
        assert_ne!(before.data(), after.data());
    }

    #[test]
    fn test_basemap_ignored_without_crs() {
        let c = sample();
        let renderer = Renderer::new(100, 100).unwrap();
        let view = view_of(&c);
        let basemap = BasemapImage {
            image: RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255])),
            bounds: view.bounds.padded(1.0),
            zoom: 3,
        };
        let style = StyleConfig::for_collection(&c);
        let with = renderer.render(&c, &style, &view, Some(&basemap));
        let without = renderer.render(&c, &style, &view, None);
        assert_eq!(with.data(), without.data());
    }

    #[test]
    fn test_mercator_projection() {
        let p = Projection::Mercator.apply(coord! { x: 0.0, y: 0.0 });
        assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
        let q = Projection::Mercator.apply(coord! { x: 180.0, y: 0.0 });
        assert!((q.x - crate::coord::HALF_WORLD).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_scaling() {
        assert_eq!(alpha(0), 0);
        assert_eq!(alpha(100), 255);
        assert_eq!(alpha(50), 128);
    }

    #[test]
    fn test_encode_png_signature() {
        let renderer = Renderer::new(8, 8).unwrap();
        let c = sample();
        let png = encode_png(&renderer.render(
            &c,
            &StyleConfig::default(),
            &view_of(&c),
            None,
        ))
        .unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}

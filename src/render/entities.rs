//! Entity drawing on the upscaled canvas.
//!
//! Draw order is path, virtual walls, no-go areas (every fill, then every
//! outline), charger, robot. Strokes and fills are alpha blended over the
//! layers below; sprites are stamped centred on their position.

use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_polygon_mut, Blend, Canvas,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::debug;

use super::rotation::CanvasTransform;
use super::sprites::SpriteCache;
use crate::config::Palette;
use crate::map::{Bounds, Coord, EntityKind, Grid, MapEntity, MapIndex, Vacuum};

/// Stroke widths as multiples of the output scale.
const PATH_WIDTH: f64 = 0.75;
const VIRTUAL_WALL_WIDTH: f64 = 1.5;
const NO_GO_OUTLINE_WIDTH: f64 = 0.5;

/// Maps vacuum positions into final image pixels.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub pixel_size: i64,
    /// Robot bounds minimum, in grid cells.
    pub origin: Coord<Grid>,
    pub transform: CanvasTransform,
    pub scale: u32,
}

impl Projection {
    /// `(v / pixelSize - origin)`, rotated with the continuous transform,
    /// then multiplied by the scale.
    pub fn project(&self, v: Coord<Vacuum>) -> (f64, f64) {
        let cell = v.to_grid(self.pixel_size);
        self.project_grid(
            cell.x.saturating_sub(self.origin.x),
            cell.y.saturating_sub(self.origin.y),
        )
    }

    /// Same as [`project`](Self::project) for a position already relative
    /// to the origin, in grid cells.
    pub fn project_grid(&self, x: i64, y: i64) -> (f64, f64) {
        let (x, y) = self.transform.point(x as f64, y as f64);
        let scale = f64::from(self.scale);
        (x * scale, y * scale)
    }

    /// Robot sprite offset: half a scale unit right, one pixel up.
    fn robot_nudge(&self) -> (i64, i64) {
        (i64::from(self.scale / 2), -1)
    }

    fn stroke(&self, factor: f64) -> f64 {
        (factor * f64::from(self.scale)).max(1.0)
    }
}

/// Draws every drawable entity of `index` onto `canvas`.
pub fn draw_entities(
    canvas: RgbaImage,
    index: &MapIndex<'_>,
    projection: &Projection,
    palette: &Palette,
    sprites: &SpriteCache,
) -> RgbaImage {
    let mut canvas = Blend(canvas);

    for entity in index.entities(EntityKind::Path) {
        if let MapEntity::Path(points) = entity {
            let points: Vec<(f64, f64)> = points.iter().map(|p| projection.project(*p)).collect();
            draw_polyline(
                &mut canvas,
                &points,
                projection.stroke(PATH_WIDTH),
                palette.path,
            );
        }
    }

    for entity in index.entities(EntityKind::VirtualWall) {
        if let MapEntity::VirtualWall { start, end } = entity {
            draw_thick_line(
                &mut canvas,
                projection.project(*start),
                projection.project(*end),
                projection.stroke(VIRTUAL_WALL_WIDTH),
                palette.virtual_wall,
            );
        }
    }

    let no_go: Vec<Rect> = index
        .entities(EntityKind::NoGoArea)
        .iter()
        .filter_map(|entity| match entity {
            MapEntity::NoGoArea(area) => Some(area_rect(projection, area)),
            _ => None,
        })
        .collect();
    for rect in &no_go {
        draw_filled_rect_mut(&mut canvas, *rect, palette.no_go_area);
    }
    let outline = opaque(palette.no_go_area);
    let outline_width = projection.stroke(NO_GO_OUTLINE_WIDTH).round() as i32;
    for rect in &no_go {
        draw_outline(&mut canvas, *rect, outline_width, outline);
    }

    let mut canvas = canvas.0;
    for entity in index.entities(EntityKind::ChargerLocation) {
        if let MapEntity::ChargerLocation(position) = entity {
            stamp(
                &mut canvas,
                sprites.charger(),
                projection.project(*position),
                (0, 0),
            );
        }
    }
    for entity in index.entities(EntityKind::RobotPosition) {
        if let MapEntity::RobotPosition { position, angle } = entity {
            let sprite = sprites.robot(*angle, projection.transform.rotation);
            stamp(
                &mut canvas,
                sprite,
                projection.project(*position),
                projection.robot_nudge(),
            );
        }
    }

    let skipped = index.entities(EntityKind::Other);
    if !skipped.is_empty() {
        debug!(count = skipped.len(), "skipped entities without a drawing");
    }
    canvas
}

/// Pixel rectangle covering `area`. Rotation keeps the box axis aligned,
/// so the projected corners only need reordering.
fn area_rect(projection: &Projection, area: &Bounds<Vacuum>) -> Rect {
    let (ax, ay) = projection.project(area.min);
    let (bx, by) = projection.project(area.max);
    let (x0, x1) = (ax.min(bx).round(), ax.max(bx).round());
    let (y0, y1) = (ay.min(by).round(), ay.max(by).round());
    let width = (x1 - x0).max(1.0) as u32;
    let height = (y1 - y0).max(1.0) as u32;
    Rect::at(x0 as i32, y0 as i32).of_size(width, height)
}

fn opaque(color: Rgba<u8>) -> Rgba<u8> {
    let Rgba([r, g, b, _]) = color;
    Rgba([r, g, b, 255])
}

/// Outline `width` pixels thick, centred on the rectangle edge.
fn draw_outline<C: Canvas<Pixel = Rgba<u8>>>(
    canvas: &mut C,
    rect: Rect,
    width: i32,
    color: Rgba<u8>,
) {
    let width = width.max(1);
    for offset in -(width / 2)..width - width / 2 {
        let w = rect.width() as i64 - 2 * i64::from(offset);
        let h = rect.height() as i64 - 2 * i64::from(offset);
        if w <= 0 || h <= 0 {
            break;
        }
        let ring = Rect::at(rect.left() + offset, rect.top() + offset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, ring, color);
    }
}

fn draw_polyline<C: Canvas<Pixel = Rgba<u8>>>(
    canvas: &mut C,
    points: &[(f64, f64)],
    width: f64,
    color: Rgba<u8>,
) {
    for pair in points.windows(2) {
        draw_thick_line(canvas, pair[0], pair[1], width, color);
    }
    // Round joints keep corners closed on wide strokes.
    if width >= 3.0 && color.0[3] == 255 {
        let radius = (width / 2.0).floor() as i32;
        for &(x, y) in points {
            draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), radius, color);
        }
    }
}

/// Line with butt caps, drawn as a filled quad.
fn draw_thick_line<C: Canvas<Pixel = Rgba<u8>>>(
    canvas: &mut C,
    from: (f64, f64),
    to: (f64, f64),
    width: f64,
    color: Rgba<u8>,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if !(length.is_finite() && width.is_finite()) {
        return;
    }
    if width <= 1.0 || length < f64::EPSILON {
        draw_line_segment_mut(
            canvas,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            color,
        );
        return;
    }

    let half = width / 2.0;
    let (nx, ny) = (-dy / length * half, dx / length * half);
    let corner = |x: f64, y: f64| Point::new(x.round() as i32, y.round() as i32);
    let quad = [
        corner(from.0 + nx, from.1 + ny),
        corner(to.0 + nx, to.1 + ny),
        corner(to.0 - nx, to.1 - ny),
        corner(from.0 - nx, from.1 - ny),
    ];
    // Rounding can collapse a short quad; draw_polygon_mut rejects a closed
    // outline.
    if quad[0] == quad[3] || quad[0] == quad[1] {
        draw_line_segment_mut(
            canvas,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            color,
        );
        return;
    }
    draw_polygon_mut(canvas, &quad, color);
}

/// Overlays `sprite` centred on `at`.
fn stamp(canvas: &mut RgbaImage, sprite: &RgbaImage, at: (f64, f64), nudge: (i64, i64)) {
    let x = (at.0.round() as i64)
        .saturating_add(nudge.0)
        .saturating_sub(i64::from(sprite.width() / 2));
    let y = (at.1.round() as i64)
        .saturating_add(nudge.1)
        .saturating_sub(i64::from(sprite.height() / 2));
    imageops::overlay(canvas, sprite, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::parse;
    use crate::render::Rotation;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn projection(rotation: Rotation, w: i64, h: i64, scale: u32) -> Projection {
        Projection {
            pixel_size: 5,
            origin: Coord::new(10, 20),
            transform: CanvasTransform::new(rotation, w, h),
            scale,
        }
    }

    fn draw(json: &str, projection: &Projection) -> RgbaImage {
        let doc = parse(json.as_bytes()).expect("parse");
        let index = MapIndex::new(&doc);
        let sprites = SpriteCache::new(projection.scale, None, None).expect("sprites");
        let size = |v: i64| v as u32 * projection.scale;
        let canvas = RgbaImage::from_pixel(
            size(projection.transform.width),
            size(projection.transform.height),
            BLACK,
        );
        draw_entities(canvas, &index, projection, &Palette::default(), &sprites)
    }

    #[test]
    fn test_projection_offsets_and_scales() {
        let p = projection(Rotation::None, 40, 40, 2);
        assert_eq!(p.project(Coord::new(100, 150)), (20.0, 20.0));
        // Truncating division, as for layer cells.
        assert_eq!(p.project(Coord::new(104, 154)), (20.0, 20.0));
    }

    #[test]
    fn test_projection_rotates_continuously() {
        let p = projection(Rotation::Quarter, 160, 100, 1);
        // Grid (30, 30) is (20, 10) relative to the origin.
        assert_eq!(p.project(Coord::new(150, 150)), (150.0, 20.0));
    }

    #[test]
    fn test_no_go_area_fill_and_outline() {
        let p = projection(Rotation::None, 20, 20, 4);
        // Corners listed max-first; the area still spans pixels 8..72 x 8..80.
        let out = draw(
            r#"{"pixelSize":5,"layers":[],"entities":[
                {"type":"no_go_area","points":[140,200, 60,200, 60,110, 140,110]}]}"#,
            &p,
        );
        let inside = out.get_pixel(20, 20);
        assert!(inside.0[0] > 0 && inside.0[0] < 255, "{:?}", inside);
        assert_eq!(inside.0[1], 0);
        assert_eq!(*out.get_pixel(8, 12), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(4, 4), BLACK);
        assert_eq!(*out.get_pixel(76, 40), BLACK);
    }

    #[test]
    fn test_virtual_wall_is_stroked() {
        let p = projection(Rotation::None, 20, 20, 4);
        let out = draw(
            r#"{"pixelSize":5,"layers":[],"entities":[
                {"type":"virtual_wall","points":[60,150, 140,150]}]}"#,
            &p,
        );
        // Relative cells (2,10)..(18,10) land on y = 40, x 8..72, 6 px wide.
        assert_ne!(*out.get_pixel(40, 40), BLACK);
        assert_ne!(*out.get_pixel(40, 38), BLACK);
        assert_eq!(*out.get_pixel(40, 50), BLACK);
        assert_eq!(*out.get_pixel(80, 40), BLACK);
    }

    #[test]
    fn test_path_through_points() {
        let p = projection(Rotation::None, 20, 20, 4);
        let out = draw(
            r#"{"pixelSize":5,"layers":[],"entities":[
                {"type":"path","points":[60,110, 60,190, 140,190]}]}"#,
            &p,
        );
        assert_eq!(*out.get_pixel(8, 40), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(40, 72), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(40, 40), BLACK);
    }

    #[test]
    fn test_robot_is_drawn_over_charger() {
        let p = projection(Rotation::None, 20, 20, 4);
        let out = draw(
            r#"{"pixelSize":5,"layers":[],"entities":[
                {"type":"robot_position","points":[100,150],"metaData":{"angle":0}},
                {"type":"charger_location","points":[100,150]}]}"#,
            &p,
        );
        let sprites = SpriteCache::new(4, None, None).expect("sprites");
        let robot = sprites.robot(0.0, Rotation::None);
        // Grid (20,30) is (10,10) from the origin, i.e. pixel (40,40). The
        // robot is nudged to (42,39); its heading marker sits above the
        // centre of both sprites.
        assert_eq!(out.get_pixel(42, 30), robot.get_pixel(16, 7));
    }

    #[test]
    fn test_robot_nudge_follows_scale() {
        assert_eq!(projection(Rotation::None, 4, 4, 4).robot_nudge(), (2, -1));
        assert_eq!(projection(Rotation::None, 4, 4, 1).robot_nudge(), (0, -1));
        assert_eq!(projection(Rotation::None, 4, 4, 7).robot_nudge(), (3, -1));
    }

    #[test]
    fn test_unknown_entities_are_ignored() {
        let p = projection(Rotation::None, 4, 4, 1);
        let out = draw(
            r#"{"pixelSize":5,"layers":[],"entities":[
                {"type":"no_mop_area","points":[50,100, 60,110]}]}"#,
            &p,
        );
        assert!(out.pixels().all(|px| *px == BLACK));
    }
}

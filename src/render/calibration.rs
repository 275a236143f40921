//! Robot to image calibration points.

use serde::Serialize;

use super::entities::Projection;
use crate::error::RenderError;
use crate::map::{Coord, Grid, RobotBounds, Vacuum};

/// Image pixel position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

/// One vacuum position and the pixel it lands on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CalibrationPoint {
    pub vacuum: Coord<Vacuum>,
    pub map: ImagePoint,
}

/// Three corners of the robot bounds, relative to its minimum: `(0, 0)`,
/// `(maxX - minX, 0)` and `(maxX - minX, maxY - minY)`.
///
/// The vacuum side is expressed in document units (cells times pixel size);
/// the map side goes through the same transform as entities.
///
/// # Errors
/// [`RenderError::InvalidBounds`] when a corner has no vacuum position in
/// the `i64` range.
pub fn calibration_points(
    bounds: &RobotBounds,
    projection: &Projection,
) -> Result<[CalibrationPoint; 3], RenderError> {
    let invalid = || RenderError::InvalidBounds {
        min_x: bounds.min.x,
        min_y: bounds.min.y,
        max_x: bounds.max.x,
        max_y: bounds.max.y,
    };
    let dx = bounds.max.x.checked_sub(bounds.min.x).ok_or_else(invalid)?;
    let dy = bounds.max.y.checked_sub(bounds.min.y).ok_or_else(invalid)?;

    let point = |x: i64, y: i64| -> Result<CalibrationPoint, RenderError> {
        let corner: Coord<Grid> = Coord::new(bounds.min.x + x, bounds.min.y + y);
        let vacuum = corner
            .to_vacuum(projection.pixel_size)
            .ok_or_else(invalid)?;
        let (mx, my) = projection.project_grid(x, y);
        Ok(CalibrationPoint {
            vacuum,
            map: ImagePoint { x: mx, y: my },
        })
    };
    Ok([point(0, 0)?, point(dx, 0)?, point(dx, dy)?])
}

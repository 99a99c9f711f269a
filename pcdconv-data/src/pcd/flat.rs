//! Flat-buffer entry points.
//!
//! These mirror the four calls of the C ABI: positions travel as `3 * N`
//! interleaved doubles, colors as `3 * N` interleaved bytes.

use super::{read_cloud, write_cloud};
use crate::error::{CodecError, Result};
use crate::types::{Attribute, AttributeKind, Point, PointCloud, Rgb};
use glam::DVec3;
use std::path::Path;

/// Positions as returned by the flat imports.
pub type PositionTriples = Vec<(f64, f64, f64)>;

/// Writes an intensity cloud from `3 * N` position values and `N`
/// intensities. Nothing is written when the buffers are inconsistent.
pub fn export_pointcloud(path: impl AsRef<Path>, points: &[f64], intensities: &[i32]) -> Result<()> {
    let positions = positions_from_flat(points)?;
    if intensities.len() != positions.len() {
        return Err(CodecError::format(format!(
            "{} intensities for {} points",
            intensities.len(),
            positions.len()
        )));
    }
    let cloud = PointCloud::with_intensities(positions, intensities.to_vec())?;
    write_cloud(path, &cloud)
}

/// Writes a color cloud from `3 * N` position values and `3 * N` color
/// channels.
pub fn export_color_pointcloud(path: impl AsRef<Path>, points: &[f64], colors: &[u8]) -> Result<()> {
    let positions = positions_from_flat(points)?;
    if colors.len() != 3 * positions.len() {
        return Err(CodecError::format(format!(
            "{} color channels for {} points, expected {}",
            colors.len(),
            positions.len(),
            3 * positions.len()
        )));
    }
    let colors = colors
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let cloud = PointCloud::with_colors(positions, colors)?;
    write_cloud(path, &cloud)
}

/// Reads an intensity cloud as position triples and intensities.
pub fn import_pointcloud(path: impl AsRef<Path>) -> Result<(PositionTriples, Vec<i32>)> {
    let (points, attribute) = read_cloud(path, AttributeKind::Intensity)?.into_parts();
    let intensities = match attribute {
        Attribute::Intensity(v) => v,
        Attribute::Color(_) => Vec::new(),
    };
    Ok((triples(&points), intensities))
}

/// Reads a color cloud as position triples and RGB triples.
pub fn import_color_pointcloud(
    path: impl AsRef<Path>,
) -> Result<(PositionTriples, Vec<(u8, u8, u8)>)> {
    let (points, attribute) = read_cloud(path, AttributeKind::Color)?.into_parts();
    let colors = match attribute {
        Attribute::Color(v) => v.into_iter().map(|[r, g, b]: Rgb| (r, g, b)).collect(),
        Attribute::Intensity(_) => Vec::new(),
    };
    Ok((triples(&points), colors))
}

fn positions_from_flat(points: &[f64]) -> Result<Vec<Point>> {
    if points.len() % 3 != 0 {
        return Err(CodecError::format(format!(
            "point buffer length {} is not a multiple of 3",
            points.len()
        )));
    }
    Ok(points
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect())
}

fn triples(points: &[Point]) -> PositionTriples {
    points.iter().map(|p| (p.x, p.y, p.z)).collect()
}

//! Core data types for point clouds and their per-point attributes.
//!
//! These are CPU-side representations shared by the codec, the scan
//! assembly and the C ABI layer.

use crate::error::{CodecError, Result};
use glam::DVec3;
use serde::Serialize;
use std::fmt;

/// A point position in double precision.
pub type Point = DVec3;

/// An 8-bit RGB color.
pub type Rgb = [u8; 3];

/// Which attribute a point cloud carries. Files do not record this, so the
/// caller picks it when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Intensity,
    Color,
}

impl AttributeKind {
    /// Number of bytes the attribute of one point occupies on disk.
    pub fn bytes_per_point(self) -> usize {
        match self {
            AttributeKind::Intensity => 4,
            AttributeKind::Color => 3,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeKind::Intensity => "intensity",
            AttributeKind::Color => "color",
        }
        .fmt(f)
    }
}

/// Per-point attribute values, aligned by index with the positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Intensity(Vec<i32>),
    Color(Vec<Rgb>),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Intensity(_) => AttributeKind::Intensity,
            Attribute::Color(_) => AttributeKind::Color,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Attribute::Intensity(v) => v.len(),
            Attribute::Color(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A list of points with exactly one attribute value per point.
///
/// The fields are private so that positions and attributes can only be
/// built or replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    points: Vec<Point>,
    attribute: Attribute,
}

impl PointCloud {
    /// Create a cloud from positions and an attribute of the same length.
    pub fn new(points: Vec<Point>, attribute: Attribute) -> Result<Self> {
        if points.len() != attribute.len() {
            return Err(CodecError::format(format!(
                "{} {} values for {} points",
                attribute.len(),
                attribute.kind(),
                points.len()
            )));
        }
        Ok(Self { points, attribute })
    }

    /// Create a cloud carrying one intensity per point.
    pub fn with_intensities(points: Vec<Point>, intensities: Vec<i32>) -> Result<Self> {
        Self::new(points, Attribute::Intensity(intensities))
    }

    /// Create a cloud carrying one RGB color per point.
    pub fn with_colors(points: Vec<Point>, colors: Vec<Rgb>) -> Result<Self> {
        Self::new(points, Attribute::Color(colors))
    }

    /// An empty cloud of the given kind.
    pub fn empty(kind: AttributeKind) -> Self {
        let attribute = match kind {
            AttributeKind::Intensity => Attribute::Intensity(Vec::new()),
            AttributeKind::Color => Attribute::Color(Vec::new()),
        };
        Self {
            points: Vec::new(),
            attribute,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn kind(&self) -> AttributeKind {
        self.attribute.kind()
    }

    pub fn intensities(&self) -> Option<&[i32]> {
        match &self.attribute {
            Attribute::Intensity(v) => Some(v),
            Attribute::Color(_) => None,
        }
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        match &self.attribute {
            Attribute::Color(v) => Some(v),
            Attribute::Intensity(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Point>, Attribute) {
        (self.points, self.attribute)
    }

    /// Positions as `x0, y0, z0, x1, ...`.
    pub fn flat_positions(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| p.to_array()).collect()
    }

    /// Colors as `r0, g0, b0, r1, ...`, or `None` for an intensity cloud.
    pub fn flat_colors(&self) -> Option<Vec<u8>> {
        self.colors()
            .map(|colors| colors.iter().flatten().copied().collect())
    }

    /// Axis-aligned bounds of the positions; `None` when empty.
    pub fn bounds(&self) -> Option<CloudBounds> {
        let first = *self.points.first()?;
        Some(self.points[1..].iter().fold(
            CloudBounds {
                min: first,
                max: first,
            },
            |b, p| CloudBounds {
                min: b.min.min(*p),
                max: b.max.max(*p),
            },
        ))
    }

    pub fn summary(&self) -> CloudSummary {
        CloudSummary {
            kind: self.kind(),
            num_points: self.len(),
            bounds: self.bounds(),
        }
    }
}

/// Axis-aligned bounding box of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudBounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl CloudBounds {
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

/// Short description of a decoded cloud.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudSummary {
    pub kind: AttributeKind,
    pub num_points: usize,
    pub bounds: Option<CloudBounds>,
}

impl fmt::Display for CloudSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} points ({})", self.num_points, self.kind)?;
        if let Some(b) = &self.bounds {
            let size = b.size();
            write!(
                f,
                ", bounds [{}, {}, {}] .. [{}, {}, {}], size [{}, {}, {}]",
                b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z, size.x, size.y, size.z
            )?;
        }
        Ok(())
    }
}

//! Assembling color scans from rendered position and color passes.
//!
//! A position pass stores world-space coordinates in its RGB channels, a
//! color pass stores linear light values. Both are float images of the same
//! size; each pixel becomes one point of the scan.

use crate::error::{CodecError, Result};
use crate::pcd::{self, EXTENSION};
use crate::types::{PointCloud, Rgb};
use glam::DVec3;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A float pixel buffer.
///
/// Rows run bottom to top, the order render hosts hand out pixel buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanImage {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub pixels: Vec<f32>,
}

impl ScanImage {
    pub fn new(width: u32, height: u32, channels: usize, pixels: Vec<f32>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(CodecError::format(format!(
                "unsupported channel count {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels;
        if pixels.len() != expected {
            return Err(CodecError::format(format!(
                "{} samples for a {}x{}x{} image",
                pixels.len(),
                width,
                height,
                channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Loads any image format the `image` crate decodes (OpenEXR included)
    /// as 32-bit float RGBA.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CodecError::NotFound(path.to_path_buf()));
        }
        let rgba = image::open(path)?.flipv().into_rgba32f();
        let (width, height) = rgba.dimensions();
        debug!("Loaded {}x{} image", width, height);
        Self::new(width, height, 4, rgba.into_raw())
    }

    pub fn num_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn pixel(&self, index: usize) -> &[f32] {
        let start = index * self.channels;
        &self.pixels[start..start + self.channels]
    }
}

/// Maps a linear color sample to a byte: gain, clamp to `[0, 1]`, scale to
/// 255 and truncate. NaN maps to 0.
pub fn quantize_color(sample: f32, gain: f64) -> u8 {
    ((sample as f64 * gain).clamp(0.0, 1.0) * 255.0) as u8
}

/// Pairs every position pixel with the color pixel at the same index. Any
/// fourth channel is dropped.
pub fn assemble_scan(position: &ScanImage, color: &ScanImage, gain: f64) -> Result<PointCloud> {
    if (position.width, position.height) != (color.width, color.height) {
        return Err(CodecError::format(format!(
            "position pass is {}x{} but color pass is {}x{}",
            position.width, position.height, color.width, color.height
        )));
    }

    let n = position.num_pixels();
    let mut points = Vec::with_capacity(n);
    let mut colors: Vec<Rgb> = Vec::with_capacity(n);
    for i in 0..n {
        let p = position.pixel(i);
        points.push(DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64));

        let c = color.pixel(i);
        colors.push([
            quantize_color(c[0], gain),
            quantize_color(c[1], gain),
            quantize_color(c[2], gain),
        ]);
    }

    PointCloud::with_colors(points, colors)
}

/// Inputs of a merge: two image names inside `src_dir`, written as
/// `out_dir/name.pcd`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    pub src_dir: PathBuf,
    pub position_name: String,
    pub color_name: String,
    pub out_dir: PathBuf,
    pub name: String,
    pub color_gain: f64,
}

impl Default for MergeRequest {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("."),
            position_name: "PositionPass0001.exr".to_string(),
            color_name: "ColorPass0001.exr".to_string(),
            out_dir: PathBuf::from("."),
            name: "test".to_string(),
            color_gain: 1.0,
        }
    }
}

impl MergeRequest {
    /// Output path, with the `.pcd` suffix appended when missing.
    pub fn output_path(&self) -> PathBuf {
        let suffix = format!(".{}", EXTENSION);
        if self.name.ends_with(&suffix) {
            self.out_dir.join(&self.name)
        } else {
            self.out_dir.join(format!("{}{}", self.name, suffix))
        }
    }
}

/// Loads both passes, assembles the scan and writes it as a color cloud.
/// Returns the written path.
#[tracing::instrument(skip_all, fields(name = %request.name))]
pub fn merge_to_scan(request: &MergeRequest) -> Result<PathBuf> {
    for dir in [&request.src_dir, &request.out_dir] {
        if !dir.is_dir() {
            return Err(CodecError::NotFound(dir.clone()));
        }
    }

    let position = ScanImage::open(request.src_dir.join(&request.position_name))?;
    let color = ScanImage::open(request.src_dir.join(&request.color_name))?;
    let cloud = assemble_scan(&position, &color, request.color_gain)?;

    let out = request.output_path();
    pcd::write_cloud(&out, &cloud)?;
    info!(
        "Merged {} and {} into {}",
        request.position_name,
        request.color_name,
        out.display()
    );
    Ok(out)
}

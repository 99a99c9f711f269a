//! Binary point cloud files.
//!
//! A file stores a little-endian `i32` point count `N`, then `N` positions as
//! interleaved `f64` triples, then one attribute per point: an `i32`
//! intensity or an RGB byte triplet. There is no magic number, so the caller
//! has to know which attribute a file carries.

mod flat;
mod reader;
mod writer;

pub use flat::{
    PositionTriples, export_color_pointcloud, export_pointcloud, import_color_pointcloud,
    import_pointcloud,
};
pub use reader::Reader;
pub use writer::Writer;

use crate::error::{CodecError, Result};
use crate::types::{AttributeKind, PointCloud};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Conventional file extension.
pub const EXTENSION: &str = "pcd";

/// Size in bytes of a file holding `num_points` points of the given kind.
pub fn expected_file_size(num_points: u64, kind: AttributeKind) -> u64 {
    4 + num_points * (24 + kind.bytes_per_point() as u64)
}

/// Writes `cloud` to `path`, replacing any existing file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_cloud(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    // Rejected clouds must not leave a file behind.
    writer::checked_count(cloud.len())?;
    Writer::create(path.as_ref())?.write(cloud)?;
    info!("Wrote {} points ({})", cloud.len(), cloud.kind());
    Ok(())
}

/// Reads the file at `path` as a cloud carrying `kind` attributes.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_cloud(path: impl AsRef<Path>, kind: AttributeKind) -> Result<PointCloud> {
    let cloud = Reader::open(path.as_ref())?.read(kind)?;
    info!("Read {} points ({})", cloud.len(), kind);
    Ok(cloud)
}

pub fn encode_to_vec(cloud: &PointCloud) -> Result<Vec<u8>> {
    let capacity = expected_file_size(cloud.len() as u64, cloud.kind()) as usize;
    Writer::new(Vec::with_capacity(capacity)).write(cloud)
}

pub fn decode_from_slice(data: &[u8], kind: AttributeKind) -> Result<PointCloud> {
    Reader::new(data).read(kind)
}

/// Reads every `.pcd` file directly inside `dir`, ordered by path.
///
/// Stops at the first file that fails to decode.
#[tracing::instrument(skip_all, fields(dir = %dir.as_ref().display()))]
pub fn import_directory(
    dir: impl AsRef<Path>,
    kind: AttributeKind,
) -> Result<Vec<(PathBuf, PointCloud)>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| CodecError::from_open(e, dir))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    debug!("Found {} point cloud files", paths.len());

    paths
        .into_iter()
        .map(|path| {
            let cloud = read_cloud(&path, kind)?;
            Ok((path, cloud))
        })
        .collect()
}

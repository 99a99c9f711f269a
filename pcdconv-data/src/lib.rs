//! pcdconv Data Crate
//!
//! Binary point cloud files carrying per-point intensity or RGB color, plus
//! the assembly of color scans from rendered position and color passes.
//! This crate is host-agnostic; the C ABI lives in pcdconv-ffi.

pub mod error;
pub mod pcd;
pub mod scan;
pub mod types;

pub use error::{CodecError, ErrorKind, Result};
pub use pcd::{
    export_color_pointcloud, export_pointcloud, import_color_pointcloud, import_directory,
    import_pointcloud, read_cloud, write_cloud,
};
pub use scan::{MergeRequest, ScanImage, assemble_scan, merge_to_scan, quantize_color};
pub use types::{Attribute, AttributeKind, CloudBounds, CloudSummary, Point, PointCloud, Rgb};

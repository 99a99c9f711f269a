//! Encoding point clouds into the binary layout.

use crate::error::{CodecError, Result};
use crate::types::{Attribute, PointCloud};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Writes point clouds to any `io::Write` destination.
#[derive(Debug)]
pub struct Writer<W: Write> {
    writer: W,
}

impl Writer<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`. Missing parent
    /// directories are not created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| CodecError::from_open(e, path))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> Writer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the whole cloud and flushes. Returns the inner writer so
    /// in-memory destinations can be recovered.
    pub fn write(mut self, cloud: &PointCloud) -> Result<W> {
        let count = checked_count(cloud.len())?;
        let w = &mut self.writer;

        w.write_i32::<LittleEndian>(count)?;
        for p in cloud.points() {
            w.write_f64::<LittleEndian>(p.x)?;
            w.write_f64::<LittleEndian>(p.y)?;
            w.write_f64::<LittleEndian>(p.z)?;
        }

        match cloud.attribute() {
            Attribute::Intensity(values) => {
                for v in values {
                    w.write_i32::<LittleEndian>(*v)?;
                }
            }
            Attribute::Color(values) => {
                for rgb in values {
                    w.write_all(rgb)?;
                }
            }
        }

        w.flush()?;
        debug!("Encoded {} points ({})", count, cloud.kind());
        Ok(self.writer)
    }
}

/// The point count is stored as `i32`.
pub(crate) fn checked_count(n: usize) -> Result<i32> {
    i32::try_from(n).map_err(|_| {
        CodecError::format(format!(
            "{} points exceed the maximum of {} per file",
            n,
            i32::MAX
        ))
    })
}

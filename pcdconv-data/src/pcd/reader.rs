//! Decoding point clouds from the binary layout.

use crate::error::{CodecError, Result};
use crate::types::{Attribute, AttributeKind, PointCloud};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use glam::DVec3;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Upper bound on elements reserved before any body bytes have been read.
const MAX_PREALLOC: usize = 1 << 20;

/// Reads point clouds from any `io::Read` source.
#[derive(Debug)]
pub struct Reader<R: Read> {
    reader: R,
}

impl Reader<BufReader<File>> {
    /// Opens the file at `path` for decoding.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CodecError::from_open(e, path))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> Reader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Decodes the whole source as a cloud carrying `kind` attributes. The
    /// source must end exactly after the attribute block.
    pub fn read(mut self, kind: AttributeKind) -> Result<PointCloud> {
        let count = self
            .reader
            .read_i32::<LittleEndian>()
            .map_err(|e| CodecError::from_decode(e, "point count"))?;
        if count < 0 {
            warn!("Negative point count {} in header", count);
            return Err(CodecError::format(format!(
                "negative point count {}",
                count
            )));
        }
        let n = count as usize;
        debug!("Header declares {} points ({})", n, kind);

        let mut points = Vec::with_capacity(n.min(MAX_PREALLOC));
        let mut buf = [0u8; 24];
        for _ in 0..n {
            self.reader
                .read_exact(&mut buf)
                .map_err(|e| CodecError::from_decode(e, "positions"))?;
            points.push(DVec3::new(
                LittleEndian::read_f64(&buf[0..8]),
                LittleEndian::read_f64(&buf[8..16]),
                LittleEndian::read_f64(&buf[16..24]),
            ));
        }

        let attribute = match kind {
            AttributeKind::Intensity => {
                let mut values = Vec::with_capacity(n.min(MAX_PREALLOC));
                for _ in 0..n {
                    let v = self
                        .reader
                        .read_i32::<LittleEndian>()
                        .map_err(|e| CodecError::from_decode(e, "intensities"))?;
                    values.push(v);
                }
                Attribute::Intensity(values)
            }
            AttributeKind::Color => {
                let mut values = Vec::with_capacity(n.min(MAX_PREALLOC));
                for _ in 0..n {
                    let mut rgb = [0u8; 3];
                    self.reader
                        .read_exact(&mut rgb)
                        .map_err(|e| CodecError::from_decode(e, "colors"))?;
                    values.push(rgb);
                }
                Attribute::Color(values)
            }
        };

        if self.has_trailing_bytes()? {
            warn!("Trailing bytes after {} declared points", n);
            return Err(CodecError::format(format!(
                "payload is larger than {} declared points",
                n
            )));
        }

        PointCloud::new(points, attribute)
    }

    fn has_trailing_bytes(&mut self) -> Result<bool> {
        let mut probe = [0u8; 1];
        loop {
            match self.reader.read(&mut probe) {
                Ok(read) => return Ok(read > 0),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

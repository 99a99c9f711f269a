//! Command implementations and logging setup.

use crate::errors::AppError;
use pcdconv_data::{
    Attribute, AttributeKind, MergeRequest, PointCloud, import_directory, merge_to_scan,
    read_cloud,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn init_logging(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn summarize(
    file: &Path,
    kind: AttributeKind,
    json: bool,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let summary = read_cloud(file, kind)?.summary();
    if json {
        serde_json::to_writer_pretty(&mut *out, &summary)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}: {}", file.display(), summary)?;
    }
    Ok(())
}

pub fn import(
    path: &Path,
    kind: AttributeKind,
    all: bool,
    limit: usize,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let clouds = if all {
        let dir = match path.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => return Err(AppError::NoParentDirectory(path.to_path_buf())),
        };
        import_directory(&dir, kind)?
    } else {
        vec![(path.to_path_buf(), read_cloud(path, kind)?)]
    };

    for (file, cloud) in &clouds {
        writeln!(out, "{}: {}", file.display(), cloud.summary())?;
        print_points(cloud, limit, out)?;
    }
    info!("Imported {} file(s)", clouds.len());
    Ok(())
}

fn print_points(cloud: &PointCloud, limit: usize, out: &mut impl Write) -> Result<(), AppError> {
    for (i, p) in cloud.points().iter().enumerate().take(limit) {
        match cloud.attribute() {
            Attribute::Intensity(v) => writeln!(out, "{} {} {} {}", p.x, p.y, p.z, v[i])?,
            Attribute::Color(v) => {
                let [r, g, b] = v[i];
                writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, r, g, b)?
            }
        }
    }
    if cloud.len() > limit {
        writeln!(out, "... {} more", cloud.len() - limit)?;
    }
    Ok(())
}

pub fn merge(request: &MergeRequest, out: &mut impl Write) -> Result<(), AppError> {
    let written = merge_to_scan(request)?;
    writeln!(out, "{}", written.display())?;
    Ok(())
}

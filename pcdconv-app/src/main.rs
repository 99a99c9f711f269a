//! pcdconv Application
//!
//! Command line front end for binary point cloud files.
//!
//! Commands:
//! - `info`: decode a file and print its summary
//! - `import`: decode one file, or every `.pcd` file next to it, and print points
//! - `merge`: merge rendered position and color passes into a color scan

mod app;
mod errors;

use app::LoggingConfig;
use clap::{Parser, Subcommand};
use pcdconv_data::{AttributeKind, MergeRequest};
use std::path::PathBuf;

/// pcdconv - Binary Point Cloud Conversion
#[derive(Parser, Debug)]
#[command(name = "pcdconv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print point count, attribute kind and bounds of a file
    Info {
        /// Point cloud file
        file: PathBuf,

        /// Read the file as a color cloud instead of an intensity cloud
        #[arg(short, long)]
        color: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the points of a file
    Import {
        /// Point cloud file
        path: PathBuf,

        /// Read the file as a color cloud instead of an intensity cloud
        #[arg(short, long)]
        color: bool,

        /// Import every .pcd file in the directory of PATH
        #[arg(short, long)]
        all: bool,

        /// Number of points printed per file
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Merge a position pass and a color pass into a color scan
    Merge {
        /// Directory holding both images
        #[arg(long)]
        src_dir: Option<PathBuf>,

        /// File name of the position pass
        #[arg(long)]
        position: Option<String>,

        /// File name of the color pass
        #[arg(long = "color")]
        color_pass: Option<String>,

        /// Output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Output name (".pcd" is appended when missing)
        #[arg(short, long)]
        name: Option<String>,

        /// Multiplier applied to color samples before clamping
        #[arg(short, long)]
        gain: Option<f64>,
    },
}

fn kind(color: bool) -> AttributeKind {
    if color {
        AttributeKind::Color
    } else {
        AttributeKind::Intensity
    }
}

impl Command {
    fn run(self, out: &mut impl std::io::Write) -> Result<(), errors::AppError> {
        match self {
            Command::Info { file, color, json } => app::summarize(&file, kind(color), json, out),
            Command::Import {
                path,
                color,
                all,
                limit,
            } => app::import(&path, kind(color), all, limit, out),
            Command::Merge {
                src_dir,
                position,
                color_pass,
                out_dir,
                name,
                gain,
            } => {
                let defaults = MergeRequest::default();
                let request = MergeRequest {
                    src_dir: src_dir.unwrap_or(defaults.src_dir),
                    position_name: position.unwrap_or(defaults.position_name),
                    color_name: color_pass.unwrap_or(defaults.color_name),
                    out_dir: out_dir.unwrap_or(defaults.out_dir),
                    name: name.unwrap_or(defaults.name),
                    color_gain: gain.unwrap_or(defaults.color_gain),
                };
                app::merge(&request, out)
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    app::init_logging(&LoggingConfig {
        level: args.log_level,
    });

    let stdout = std::io::stdout();
    if let Err(e) = args.command.run(&mut stdout.lock()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info() {
        let args = Args::try_parse_from(["pcdconv", "info", "scan.pcd", "--color", "--json"]).unwrap();
        assert_eq!(args.log_level, "info");
        match args.command {
            Command::Info { file, color, json } => {
                assert_eq!(file, PathBuf::from("scan.pcd"));
                assert!(color);
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_import_defaults() {
        let args =
            Args::try_parse_from(["pcdconv", "--log-level", "debug", "import", "a.pcd", "--all"])
                .unwrap();
        assert_eq!(args.log_level, "debug");
        match args.command {
            Command::Import {
                color, all, limit, ..
            } => {
                assert!(!color);
                assert!(all);
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_merge_partial() {
        let args =
            Args::try_parse_from(["pcdconv", "merge", "--name", "scan", "--gain", "2.5"]).unwrap();
        match args.command {
            Command::Merge {
                name,
                gain,
                src_dir,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("scan"));
                assert_eq!(gain, Some(2.5));
                assert!(src_dir.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_merge_color_pass() {
        let args = Args::try_parse_from([
            "pcdconv",
            "merge",
            "--position",
            "pos.exr",
            "--color",
            "ColorPass0001.exr",
        ])
        .unwrap();
        match args.command {
            Command::Merge {
                position,
                color_pass,
                ..
            } => {
                assert_eq!(position.as_deref(), Some("pos.exr"));
                assert_eq!(color_pass.as_deref(), Some("ColorPass0001.exr"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Args::try_parse_from(["pcdconv"]).is_err());
    }
}

//! Command-line interface definitions.
//!
//! All CLI arguments are defined here using the clap derive API. The tool
//! is a single-purpose command: deduplicate the images under an input
//! directory into an output directory.
//!
//! # Example
//!
//! ```bash
//! # Deduplicate with defaults (aHash, threshold 10)
//! imgdedupe ~/photos ~/photos-unique
//!
//! # Tighter matching with a larger fingerprint
//! imgdedupe ~/photos ~/photos-unique --threshold 4 --hash-size 16
//!
//! # pHash with group previews
//! imgdedupe ~/photos ~/photos-unique --algorithm phash --preview
//!
//! # Verbose mode for debugging
//! imgdedupe -v ~/photos ~/photos-unique
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::scanner::PerceptualAlgorithm;

/// Find and deduplicate visually similar images.
///
/// Computes a perceptual fingerprint per image (cached across runs),
/// groups images within a hamming-distance threshold, and copies one
/// representative per group to the output directory.
#[derive(Debug, Parser)]
#[command(name = "imgdedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input directory containing images
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Path to the output directory for unique images
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Hamming distance threshold for similarity
    ///
    /// Lower values require images to be more similar to share a group.
    /// Defaults to the configured value (10 out of the box).
    #[arg(short = 't', long, value_name = "DIST")]
    pub threshold: Option<u32>,

    /// Size of the perceptual hash grid (fingerprint is N*N bits)
    ///
    /// Higher values are more precise but slower, and invalidate cached
    /// fingerprints computed at other sizes.
    #[arg(short = 's', long, value_name = "N", value_parser = parse_hash_size)]
    pub hash_size: Option<u32>,

    /// Perceptual hash algorithm
    #[arg(long, value_enum, value_name = "ALGO")]
    pub algorithm: Option<PerceptualAlgorithm>,

    /// Render a montage preview PNG for each group with similar images
    #[arg(short = 'p', long)]
    pub preview: bool,

    /// Number of hashing threads (default: all available cores)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Path to the fingerprint cache database
    ///
    /// Defaults to the platform cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Save the effective threshold, hash size, and algorithm as the new
    /// configured defaults
    #[arg(long)]
    pub save_config: bool,

    /// Emit errors as structured JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Parse and validate the hash-size argument.
fn parse_hash_size(s: &str) -> Result<u32, String> {
    let size: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid hash size"))?;

    if !(2..=64).contains(&size) {
        return Err(format!("hash size must be between 2 and 64, got {size}"));
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("imgdedupe").chain(args.iter().copied()))
    }

    #[test]
    fn test_minimal_invocation() {
        let cli = parse(&["in", "out"]).unwrap();
        assert_eq!(cli.input_dir, PathBuf::from("in"));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert!(cli.threshold.is_none());
        assert!(cli.hash_size.is_none());
        assert!(!cli.preview);
    }

    #[test]
    fn test_full_invocation() {
        let cli = parse(&[
            "in",
            "out",
            "-t",
            "4",
            "-s",
            "16",
            "--algorithm",
            "phash",
            "--preview",
            "--io-threads",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.threshold, Some(4));
        assert_eq!(cli.hash_size, Some(16));
        assert_eq!(cli.algorithm, Some(PerceptualAlgorithm::Phash));
        assert!(cli.preview);
        assert_eq!(cli.io_threads, Some(2));
    }

    #[test]
    fn test_save_config_flag() {
        assert!(!parse(&["in", "out"]).unwrap().save_config);
        assert!(parse(&["in", "out", "--save-config"]).unwrap().save_config);
    }

    #[test]
    fn test_missing_dirs_rejected() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["only-input"]).is_err());
    }

    #[test]
    fn test_hash_size_bounds() {
        assert!(parse(&["in", "out", "-s", "1"]).is_err());
        assert!(parse(&["in", "out", "-s", "65"]).is_err());
        assert!(parse(&["in", "out", "-s", "abc"]).is_err());
        assert!(parse(&["in", "out", "-s", "2"]).is_ok());
        assert!(parse(&["in", "out", "-s", "64"]).is_ok());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(parse(&["in", "out", "-q", "-v"]).is_err());
    }
}

//! Create validity masks for label arrays in a Zarr hierarchy.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use zarrs_mask::{
    MaskOptions, MaskPattern, ZeroValues, generate_masks, pattern::DEFAULT_MASK_PATTERN,
    report::LogReporter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "WARN")]
    Warn,
    #[value(name = "INFO")]
    Info,
    #[value(name = "ERROR")]
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Debug => Self::Debug,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Error => Self::Error,
        }
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "zarrs-mask", version)]
#[command(about = "Create masks which are 0 wherever a label array holds a background value")]
struct Args {
    /// Zarr hierarchy containing the label arrays
    #[arg(value_name = "CONTAINER")]
    container: PathBuf,

    /// Arrays for which to create masks, processed in order
    #[arg(value_name = "DATASET", required = true, num_args = 1..)]
    datasets: Vec<String>,

    /// Mask array path; `{}` is replaced by the last segment of DATASET
    #[arg(short = 'm', long, value_name = "MASK_PATTERN", default_value = DEFAULT_MASK_PATTERN)]
    mask_pattern: MaskPattern,

    #[arg(long, value_enum, value_name = "LOG_LEVEL", default_value = "WARN")]
    log_level: LogLevel,

    /// Values that will be zeroed out in the mask
    #[arg(
        long,
        value_name = "IGNORE_VALUES",
        num_args = 1..,
        default_values_t = [0i64],
        allow_negative_numbers = true
    )]
    zero_in_mask: Vec<i64>,

    /// Overwrite existing mask arrays
    #[arg(long)]
    overwrite_existing: bool,

    /// Gzip-compress mask chunks at this level
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u32).range(0..=9))]
    gzip_level: Option<u32>,
}

impl Args {
    fn options(&self) -> zarrs_mask::Result<MaskOptions> {
        let zero_values = ZeroValues::new(self.zero_in_mask.iter().copied())?;
        Ok(MaskOptions::new(self.mask_pattern.clone(), zero_values)
            .with_overwrite(self.overwrite_existing)
            .with_gzip_level(self.gzip_level))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level.into())
        .parse_default_env()
        .init();
    log::debug!("args={args:?}");

    let options = args.options()?;
    for mask_path in generate_masks(&args.container, &args.datasets, &options, &LogReporter)? {
        log::info!("Wrote mask array {mask_path}");
    }
    Ok(())
}

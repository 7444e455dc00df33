use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::mask::ThresholdMethod;

#[derive(Debug, Parser)]
#[command(name = "imc-patchkit", version, about = "WS-IMC tissue masking and patch extraction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate tissue masks and mask metadata for a cohort
    Masks(MasksArgs),
    /// Extract coverage-filtered patches using previously generated masks
    Patches(PatchesArgs),
    /// Generate masks, then extract patches
    Run(RunArgs),
    /// Check configuration, inputs, and panel without touching any image
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct MasksArgs {
    #[arg(long, help = "Path to YAML configuration file")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = ThresholdMethodArg::Otsu)]
    pub threshold_method: ThresholdMethodArg,

    #[arg(long, default_value_t = false, help = "Keep small spurious objects")]
    pub no_remove_small_objects: bool,

    #[arg(long, default_value_t = false, help = "Keep small enclosed holes")]
    pub no_fill_small_holes: bool,

    #[arg(long, default_value_t = false, help = "Skip per-channel preprocessing")]
    pub no_preprocess: bool,

    #[arg(long, default_value_t = false, help = "Skip the mask metadata table")]
    pub no_metadata: bool,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct PatchesArgs {
    #[arg(long, help = "Path to YAML configuration file")]
    pub config: PathBuf,

    #[arg(long, default_value_t = false, help = "Skip per-channel preprocessing")]
    pub no_preprocess: bool,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Path to YAML configuration file")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = ThresholdMethodArg::Otsu)]
    pub threshold_method: ThresholdMethodArg,

    #[arg(long, default_value_t = false, help = "Keep small spurious objects")]
    pub no_remove_small_objects: bool,

    #[arg(long, default_value_t = false, help = "Keep small enclosed holes")]
    pub no_fill_small_holes: bool,

    #[arg(long, default_value_t = false, help = "Skip per-channel preprocessing")]
    pub no_preprocess: bool,

    #[arg(long, default_value_t = false, help = "Skip the mask metadata table")]
    pub no_metadata: bool,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long, help = "Path to YAML configuration file")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThresholdMethodArg {
    Otsu,
    Gmm,
}

impl From<ThresholdMethodArg> for ThresholdMethod {
    fn from(arg: ThresholdMethodArg) -> Self {
        match arg {
            ThresholdMethodArg::Otsu => ThresholdMethod::Otsu,
            ThresholdMethodArg::Gmm => ThresholdMethod::Gmm,
        }
    }
}

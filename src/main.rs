use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use imc_patchkit::cli::{Cli, Commands, MasksArgs, PatchesArgs, RunArgs, ValidateArgs};
use imc_patchkit::config::Config;
use imc_patchkit::ctx::Ctx;
use imc_patchkit::mask::ThresholdMethod;
use imc_patchkit::pipeline::stage0_scaffold::Stage0Scaffold;
use imc_patchkit::pipeline::stage1_discover::Stage1Discover;
use imc_patchkit::pipeline::stage2_panel::Stage2Panel;
use imc_patchkit::pipeline::stage3_masks::Stage3Masks;
use imc_patchkit::pipeline::stage4_patches::Stage4Patches;
use imc_patchkit::pipeline::stage5_output::Stage5Output;
use imc_patchkit::pipeline::Pipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Masks(args) => run_masks(args),
        Commands::Patches(args) => run_patches(args),
        Commands::Run(args) => run_full(args),
        Commands::Validate(args) => run_validate(args),
    }
}

fn run_masks(args: MasksArgs) -> Result<()> {
    let mut ctx = load_ctx(&args.config, args.threshold_method.into())?;
    ctx.remove_small_objects = !args.no_remove_small_objects;
    ctx.fill_small_holes = !args.no_fill_small_holes;
    ctx.preprocess = !args.no_preprocess;
    ctx.save_metadata = !args.no_metadata;
    ctx.threads = args.threads;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Panel::new()),
        Box::new(Stage3Masks::new()),
        Box::new(Stage5Output::new()),
    ]);
    pipeline.run(&mut ctx)?;
    print_summary(&ctx);
    Ok(())
}

fn run_patches(args: PatchesArgs) -> Result<()> {
    let mut ctx = load_ctx(&args.config, ThresholdMethod::Otsu)?;
    ctx.preprocess = !args.no_preprocess;
    ctx.threads = args.threads;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Panel::new()),
        Box::new(Stage4Patches::new()),
        Box::new(Stage5Output::new()),
    ]);
    pipeline.run(&mut ctx)?;
    print_summary(&ctx);
    Ok(())
}

fn run_full(args: RunArgs) -> Result<()> {
    let mut ctx = load_ctx(&args.config, args.threshold_method.into())?;
    ctx.remove_small_objects = !args.no_remove_small_objects;
    ctx.fill_small_holes = !args.no_fill_small_holes;
    ctx.preprocess = !args.no_preprocess;
    ctx.save_metadata = !args.no_metadata;
    ctx.threads = args.threads;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage0Scaffold::new()),
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Panel::new()),
        Box::new(Stage3Masks::new()),
        Box::new(Stage4Patches::new()),
        Box::new(Stage5Output::new()),
    ]);
    pipeline.run(&mut ctx)?;
    print_summary(&ctx);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let mut ctx = load_ctx(&args.config, ThresholdMethod::Otsu)?;

    let pipeline = Pipeline::new(vec![
        Box::new(Stage1Discover::new()),
        Box::new(Stage2Panel::new()),
    ]);
    pipeline.run(&mut ctx)?;
    print_validate_summary(&ctx);
    Ok(())
}

fn load_ctx(config_path: &std::path::Path, method: ThresholdMethod) -> Result<Ctx> {
    let config = Config::load(config_path)?;
    config.validate()?;
    Ok(Ctx::new(config, method))
}

fn print_summary(ctx: &Ctx) {
    println!("imc-patchkit run complete");
    if let Some(mapping) = &ctx.id_mapping {
        println!("images: {}", mapping.len());
    }
    if !ctx.mask_metadata.is_empty() {
        println!("masks generated: {}", ctx.mask_metadata.len());
    }
    if let Some(cohort) = &ctx.cohort {
        println!("patches attempted: {}", cohort.total_attempted_patches);
        println!("patches valid: {}", cohort.total_valid_patches);
    }
    print_warnings(ctx);
}

fn print_validate_summary(ctx: &Ctx) {
    println!("imc-patchkit validate ok");
    if let Some(mapping) = &ctx.id_mapping {
        println!("images: {}", mapping.len());
    }
    if let Some(panel) = &ctx.panel {
        println!("panel channels: {}", panel.retained_indices().len());
        println!("mask channels: {}", ctx.mask_tags.len());
    }
    print_warnings(ctx);
}

fn print_warnings(ctx: &Ctx) {
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}

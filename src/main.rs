use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::process::ExitCode;

use imgconv::image_processing::batch::BatchSummary;
use imgconv::utils::{create_progress_bar, format_duration, validate_inputs, verbose_println};
use imgconv::{
    Args, ConversionConfig, ConversionEngine, ConversionRequest, ConversionResult, JsonMessage,
};

/// Print one file's outcome in the selected output style
fn report_result(result: &ConversionResult, json: bool) {
    if json {
        JsonMessage::from_result(result).emit();
        return;
    }

    match &result.outcome {
        Ok(Some(_)) => println!(
            "{} {} -> {}",
            style("Success:").green(),
            result.source.display(),
            result.destination.display()
        ),
        Ok(None) => println!(
            "{} {} -> {}",
            style("Would convert:").cyan(),
            result.source.display(),
            result.destination.display()
        ),
        Err(e) => eprintln!(
            "{} {}: {}",
            style("Error converting").red().for_stderr(),
            result.source.display(),
            e
        ),
    }
}

fn print_configuration(args: &Args, config: &ConversionConfig) {
    eprintln!("{}", style("Image Converter").bold().blue().for_stderr());
    eprintln!("{}", style("Configuration:").bold().for_stderr());
    eprintln!("  Source: {}", args.source.display());
    eprintln!("  Destination: {}", args.destination.display());
    eprintln!("  Output format: {}", config.format.description());
    match config.quality {
        Some(q) if config.format.is_lossy() => eprintln!("  Quality: {}", q),
        Some(q) => eprintln!("  Quality: {} (not used by {})", q, config.format),
        None => eprintln!("  Quality: encoder default"),
    }
    eprintln!("  Parallel jobs: {}", config.parallel_jobs);
    if config.dry_run {
        eprintln!("  Dry run mode: enabled (simulation only - no files will be created)");
    }
    eprintln!();
}

fn run_single(engine: &ConversionEngine, request: &ConversionRequest, json: bool) -> ExitCode {
    let result = engine.convert_single(&request.source, &request.destination);
    report_result(&result, json);

    verbose_println(
        engine.config().verbose,
        &format!("Finished in {}", format_duration(result.duration)),
    );

    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_directory(
    engine: &ConversionEngine,
    request: &ConversionRequest,
    json: bool,
) -> Result<ExitCode> {
    let progress = create_progress_bar(0);
    if json {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    progress.set_message("Converting");

    let (_, summary) = engine.convert_directory(
        &request.source,
        &request.destination,
        |result, completed, total| {
            progress.set_length(total as u64);
            progress.suspend(|| report_result(result, json));
            progress.inc(1);

            if json {
                let name = result
                    .source
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("unknown");
                JsonMessage::progress(completed, total, format!("Converted {}", name));
            }
        },
    )?;
    progress.finish_and_clear();

    report_summary(engine, &summary, json);
    Ok(ExitCode::SUCCESS)
}

fn report_summary(engine: &ConversionEngine, summary: &BatchSummary, json: bool) {
    if json {
        JsonMessage::summary(
            summary.total_files,
            summary.successful,
            summary.failed,
            summary.total_duration.as_secs_f64(),
        );
        return;
    }

    if engine.config().dry_run {
        println!("Done: Would convert {} images.", summary.successful);
    } else {
        println!("Done: Converted {} images.", summary.successful);
    }

    let verbose = engine.config().verbose;
    verbose_println(
        verbose,
        &format!(
            "{} of {} files succeeded ({:.1}%), {} failed",
            summary.successful,
            summary.total_files,
            summary.success_rate(),
            summary.failed
        ),
    );
    verbose_println(
        verbose,
        &format!(
            "Total time: {}, average per image: {}",
            format_duration(summary.total_duration),
            format_duration(summary.average_duration())
        ),
    );
}

fn main() -> Result<ExitCode> {
    let mut args = Args::parse();
    args.load_and_merge_config()?;

    let format = args.format.context(
        "No output format given: pass --format or set \"format\" in the config file",
    )?;
    let request = ConversionRequest {
        source: args.source.clone(),
        destination: args.destination.clone(),
        format,
        compression: args.compress.map(u32::from),
    };

    // Compression is checked before the source is even looked at
    let mut config = request.validate()?;
    config.parallel_jobs = args.parallel_jobs();
    config.verbose = args.verbose;
    config.dry_run = args.dry_run;

    validate_inputs(&args)?;

    if config.verbose {
        print_configuration(&args, &config);
    }

    let engine = ConversionEngine::new(config);
    if request.source.is_dir() {
        run_directory(&engine, &request, args.json_progress)
    } else {
        Ok(run_single(&engine, &request, args.json_progress))
    }
}

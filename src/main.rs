//! Command-line front end for lumagrid.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lumagrid::grid;
use lumagrid::model::{Category, DatasetId, ImageId, SelectedCell};
use lumagrid::{AnalysisError, AppConfig, ManualAnalysis, MarkupDocument, MarkupExporter, MarkupImporter};

#[derive(Parser)]
#[command(name = "lumagrid", version, about = "Manual grid brightness analysis")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import markup documents (.json) and archives of them (.zip) into a dataset
    Import {
        /// Target dataset id
        dataset_id: DatasetId,
        /// Description attached to every uploaded image
        #[arg(short, long, default_value = "")]
        description: String,
        /// Markup files or ZIP archives
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Export the stored analysis of an image as a markup document
    Export {
        /// Image id
        image_id: ImageId,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a summary of a markup document
    Inspect {
        /// Markup file
        file: PathBuf,
    },
}

fn init_logging(config: &AppConfig) {
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
}

async fn run_import(
    config: &AppConfig,
    dataset_id: DatasetId,
    description: &str,
    paths: &[PathBuf],
) -> Result<bool, AnalysisError> {
    let mut analysis = ManualAnalysis::from_config(config)?;
    let importer = MarkupImporter::new(dataset_id).with_description(description);
    log::info!("Importing {} path(s) into dataset {}", paths.len(), importer.dataset_id());
    let results = importer
        .import_paths(&mut analysis, paths, |progress| {
            log::info!(
                "Progress: {}/{} ({}%)",
                progress.completed,
                progress.total,
                progress.percent
            );
        })
        .await;

    for result in &results {
        match (result.success, result.image_id) {
            (true, Some(id)) => println!("ok      {} -> image {}", result.filename, id),
            _ => println!("failed  {}: {}", result.filename, result.message),
        }
    }
    Ok(results.iter().all(|r| r.success))
}

async fn run_export(config: &AppConfig, image_id: ImageId, output: &Path) -> Result<(), AnalysisError> {
    let mut analysis = ManualAnalysis::from_config(config)?;
    analysis.load_original_image(image_id).await?;
    analysis.blurred_image(image_id).await?;
    if analysis.check_existing_result(image_id).await?.is_none() {
        return Err(AnalysisError::NoBrightnessData { image_id });
    }

    let (cells, categories) = match analysis.categorized_result(image_id).await? {
        Some(result) => {
            let categories: Vec<Category> = result
                .category_results
                .iter()
                .map(|c| Category::new(&c.category_id, &c.category_name, &c.color))
                .collect();
            let cells: Vec<SelectedCell> = analysis
                .restore_cell_selections(image_id)
                .await?
                .into_iter()
                .map(|(pos, category_id)| SelectedCell::new(pos.row, pos.col, &category_id))
                .collect();
            (cells, categories)
        }
        None => (Vec::new(), Vec::new()),
    };

    let name = output
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| format!("{}.png", stem));
    let document =
        MarkupExporter::new().export(&analysis, image_id, &cells, &categories, name.as_deref())?;
    let json = document.to_json()?;
    tokio::fs::write(output, json)
        .await
        .map_err(|e| AnalysisError::io(output, e))?;
    log::info!("Exported image {} to {:?}", image_id, output);
    Ok(())
}

fn format_means(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.2}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn run_inspect(file: &Path) -> Result<(), AnalysisError> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| AnalysisError::io(file, e))?;
    let document = MarkupDocument::from_slice(&bytes)?;
    let original = document.original()?;
    let dims = original.probe_dimensions()?;
    let metadata = &document.metadata;

    println!("name:       {}", document.file_name());
    println!("image:      {} {}x{}", original.mime, dims.width, dims.height);
    println!("blurred:    {}", if document.blurred_image.is_some() { "yes" } else { "no" });
    println!("vertical:   {:?}", metadata.vertical_lines);
    println!("horizontal: {:?}", metadata.horizontal_lines);
    println!(
        "luminance:  {}x{}",
        metadata.luminance.rows(),
        metadata.luminance.cols()
    );

    if !metadata.luminance.is_empty() {
        let summary = grid::summarize(&metadata.luminance);
        println!("row means:  {}", format_means(&summary.row_means));
        println!("col means:  {}", format_means(&summary.col_means));
        println!("overall:    {:.2}", summary.overall_mean);
    }

    let aggregates = grid::aggregate_by_category(
        &metadata.luminance,
        &metadata.selected_cells,
        &metadata.selection_categories,
    );
    for category in &aggregates {
        let average = category
            .row_means_average
            .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        println!(
            "category:   {} ({}) mean {:.2}, {} cells, row means average {}",
            category.category_name, category.category_id, category.mean, category.cell_count, average
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let outcome = match &cli.command {
        Command::Import {
            dataset_id,
            description,
            paths,
        } => run_import(&config, *dataset_id, description, paths).await,
        Command::Export { image_id, output } => {
            run_export(&config, *image_id, output).await.map(|()| true)
        }
        Command::Inspect { file } => run_inspect(file).await.map(|()| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

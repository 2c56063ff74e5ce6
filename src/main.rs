use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use efiscen_export::{
    analysis::{Aggregator, Metric},
    config::RunConfig,
    export::{CsvWriter, DatabaseWriter, Exporter, SimulationInfo},
    io,
    models::{parse_id_list, Experiment, Selection},
    visualization::{
        print_distribution_chart, print_export_report, print_series_chart, print_series_table,
        print_summary_table,
    },
};

#[derive(Parser)]
#[command(
    name = "efiscen-export",
    about = "Aggregate and export recorded EFISCEN forest simulation output",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which strata to aggregate over. Each list is comma separated; "all" or 0 matches everything.
#[derive(Args)]
struct SelectionArgs {
    #[arg(long, default_value = "all")]
    regions: String,

    #[arg(long, default_value = "all")]
    owners: String,

    #[arg(long, default_value = "all")]
    sites: String,

    #[arg(long, default_value = "all")]
    species: String,
}

impl SelectionArgs {
    fn to_selection(&self) -> Result<Selection> {
        Ok(Selection {
            regions: parse_id_list(&self.regions)?,
            owners: parse_id_list(&self.owners)?,
            sites: parse_id_list(&self.sites)?,
            species: parse_id_list(&self.species)?,
        })
    }
}

/// Simulation identifiers; flags override the run configuration file.
#[derive(Args)]
struct RunArgs {
    /// Run configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    scenario_id: Option<i64>,

    #[arg(long)]
    country_id: Option<i64>,

    #[arg(long)]
    project_id: Option<i64>,

    #[arg(long)]
    param_file: Option<String>,
}

impl RunArgs {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(id) = self.scenario_id {
            config.export.scenario_id = id;
        }
        if let Some(id) = self.country_id {
            config.export.country_id = id;
        }
        if let Some(id) = self.project_id {
            config.export.project_id = id;
        }
        if let Some(file) = &self.param_file {
            config.export.param_file = file.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the aggregated history of one metric
    Series {
        /// Recorded experiment (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Metric tag, e.g. Area, GrStock, IncrAv, tCarbon
        #[arg(short, long)]
        metric: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Draw a bar chart instead of a table
        #[arg(long)]
        chart: bool,

        /// Also show the age-class distribution at this step
        #[arg(long)]
        distribution: Option<usize>,

        /// Write the series to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show the latest value of one or more metrics
    Latest {
        #[arg(short, long)]
        input: PathBuf,

        /// Metric tags; all metrics when omitted
        #[arg(short, long, value_delimiter = ',')]
        metrics: Vec<String>,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Export the experiment into a SQLite database
    Export {
        #[arg(short, long)]
        input: PathBuf,

        /// Output database file
        #[arg(short, long)]
        database: PathBuf,

        /// Selection file listing the tables to export; all tables when omitted
        #[arg(short, long)]
        tables: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Export the experiment as one CSV file per table
    Csv {
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Display a quick summary of the experiment
    Summary {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn load_experiment(path: &Path, config: Option<&RunConfig>) -> Result<Experiment> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mut experiment = match ext.as_str() {
        "json" => io::read_json(path)?,
        _ => anyhow::bail!("Unsupported file format: .{ext}. Use .json"),
    };
    if let Some(config) = config {
        config.apply_to(&mut experiment);
        experiment.validate()?;
    }
    info!(
        name = %experiment.name,
        strata = experiment.num_strata(),
        steps = experiment.history_length(),
        "experiment loaded"
    );
    Ok(experiment)
}

fn parse_metrics(tags: &[String]) -> Result<Vec<Metric>> {
    if tags.is_empty() {
        return Ok(Metric::ALL.to_vec());
    }
    Ok(tags
        .iter()
        .map(|t| t.parse::<Metric>())
        .collect::<Result<Vec<_>, _>>()?)
}

fn describe(info: &SimulationInfo) -> String {
    format!(
        "scenario {} | country {} | project {}",
        info.scenario_id, info.country_id, info.project_id
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Series {
            input,
            metric,
            selection,
            chart,
            distribution,
            csv,
        } => {
            let experiment = load_experiment(&input, None)?;
            let metric: Metric = metric.parse()?;
            let selection = selection.to_selection()?;
            let aggregator = Aggregator::new(&experiment, &selection);
            if aggregator.num_matched() == 0 {
                eprintln!("{}: no strata match the selection", "Warning".yellow());
            }

            let series = aggregator.series(metric);
            if chart {
                print_series_chart(&experiment, metric, series.clone());
            } else {
                print_series_table(&experiment, metric, series.clone());
            }

            if let Some(step) = distribution {
                match aggregator.distribution_at(metric, step) {
                    Some(classes) => {
                        print_distribution_chart(metric, experiment.year_of(step), &classes)
                    }
                    None => eprintln!(
                        "{}: {metric} is not recorded by age class",
                        "Warning".yellow()
                    ),
                }
            }

            if let Some(path) = csv {
                io::write_series_csv(&experiment, &[(metric, series)], &path)?;
                println!("{} Wrote {}", "Success:".green().bold(), path.display());
            }
        }

        Commands::Latest {
            input,
            metrics,
            selection,
        } => {
            let experiment = load_experiment(&input, None)?;
            let metrics = parse_metrics(&metrics)?;
            let selection = selection.to_selection()?;
            let aggregator = Aggregator::new(&experiment, &selection);
            let scope = if selection.is_all() {
                "all strata".to_string()
            } else {
                format!("{} strata", aggregator.num_matched())
            };
            let title = format!("Latest values: {} ({scope})", experiment.name);
            print_summary_table(&title, &aggregator.summary(&metrics));
        }

        Commands::Export {
            input,
            database,
            tables,
            run,
        } => {
            let config = run.resolve()?;
            let experiment = load_experiment(&input, Some(&config))?;
            let info = config.to_info();
            println!(
                "\n{}",
                format!("Exporting {} to {}", experiment.name, database.display())
                    .bold()
                    .cyan()
            );
            println!("  {}", describe(&info).dimmed());

            let shared = experiment.into_shared();
            let mut exporter = Exporter::from_shared(&shared, DatabaseWriter::open(&database)?)?;
            let report = match tables {
                Some(path) => exporter.save_selected_database(&info, path)?,
                None => exporter.save(&info)?,
            };
            print_export_report(&report);
            if !report.is_complete() {
                anyhow::bail!("{} table(s) failed to export", report.failed.len());
            }
        }

        Commands::Csv { input, output, run } => {
            let config = run.resolve()?;
            let experiment = load_experiment(&input, Some(&config))?;
            let info = config.to_info();
            let shared = experiment.into_shared();
            let mut exporter = Exporter::from_shared(&shared, CsvWriter::create(&output)?)?;
            let report = exporter.save(&info)?;
            print_export_report(&report);
            if !report.is_complete() {
                anyhow::bail!("{} table(s) failed to export", report.failed.len());
            }
            println!(
                "{} Wrote CSV tables to {}",
                "Success:".green().bold(),
                output.display()
            );
        }

        Commands::Summary { input } => {
            let experiment = load_experiment(&input, None)?;
            let selection = Selection::all();
            let aggregator = Aggregator::new(&experiment, &selection);

            println!("\n{}", "Quick Summary".bold().cyan());
            println!("{}", "=".repeat(40));
            println!("  Name:           {}", experiment.name);
            println!("  Strata:         {}", experiment.num_strata());
            println!("  Steps:          {}", experiment.history_length());
            println!("  Base year:      {}", experiment.base_year);
            println!("  Step length:    {} yr", experiment.step_length);
            println!(
                "  Area:           {:.1} ha",
                aggregator.latest(Metric::Area)
            );
            println!(
                "  Growing stock:  {:.1} m3",
                aggregator.latest(Metric::GrowingStock)
            );
            println!(
                "  Total carbon:   {:.1} tC",
                aggregator.latest(Metric::TCarbon)
            );
        }
    }

    Ok(())
}

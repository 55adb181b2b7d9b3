use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cqlz_lang::{
    CancelToken, Dataset, EffectTable, Optimizer, OptimizerConfig, Weights, dump_tree,
};
use miette::IntoDiagnostic;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cqlz")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To score queries:\n\
    cqlz score '[word=\".*ing\"]' '[lemma=\"house\"] within <s/>'\n\n\
    ## To score with fitted weights:\n\
    cqlz score -w weights.json '[tag=\"N.*\"]'\n\n\
    ## To fit weights to measured query times:\n\
    cqlz fit samples.csv --config optimizer.toml -o weights.json")]
#[command(
    about = "cqlz estimates how slow CQL corpus queries are.",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    commands: Commands,
}

#[derive(Clone, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the slowness score of each query
    Score {
        /// JSON file with one weight per slot
        #[arg(short, long)]
        weights: Option<PathBuf>,
        /// Set output format
        #[arg(short = 'F', long, value_enum, default_value_t)]
        output_format: OutputFormat,
        #[arg(required = true, value_name = "QUERY")]
        queries: Vec<String>,
    },
    /// Print the cost program of a query
    Compile {
        /// JSON file with one weight per slot
        #[arg(short, long)]
        weights: Option<PathBuf>,
        query: String,
    },
    /// Print the syntax tree of a query with the effect of its wildcards
    Tree { query: String },
    /// Fit weights to measured query times
    Fit {
        /// CSV file with `query;seconds` records
        dataset: PathBuf,
        /// TOML file with optimizer settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        generations: Option<usize>,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Write the fitted weights here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        self.init_tracing();

        match &self.commands {
            Commands::Score {
                weights,
                output_format,
                queries,
            } => {
                let weights = load_weights(weights.as_deref())?;
                tracing::debug!(queries = queries.len(), "Scoring queries");
                let scores = queries
                    .par_iter()
                    .map(|query| cqlz_lang::score_text(query, &weights))
                    .collect::<Result<Vec<_>, _>>()?;

                let stdout = io::stdout();
                let mut handle = BufWriter::new(stdout.lock());

                match output_format {
                    OutputFormat::Text => {
                        for (query, score) in queries.iter().zip(scores) {
                            writeln!(handle, "{score:.6}\t{query}").into_diagnostic()?;
                        }
                    }
                    OutputFormat::Json => {
                        let values = queries
                            .iter()
                            .zip(scores)
                            .map(|(query, score)| serde_json::json!({"query": query, "score": score}))
                            .collect::<Vec<_>>();
                        serde_json::to_writer_pretty(&mut handle, &values).into_diagnostic()?;
                        writeln!(handle).into_diagnostic()?;
                    }
                }

                handle.flush().into_diagnostic()
            }
            Commands::Compile { weights, query } => {
                let weights = load_weights(weights.as_deref())?;
                let parsed = cqlz_lang::parse(query)?;
                let program = cqlz_lang::compile(&parsed, &weights).map_err(|e| {
                    cqlz_lang::Error::from_error(query.as_str(), cqlz_lang::InnerError::Compile(e))
                })?;

                print!("{program}");
                Ok(())
            }
            Commands::Tree { query } => {
                let parsed = cqlz_lang::parse(query)?;
                let effects = EffectTable::compute(&parsed);

                print!("{}", dump_tree(&parsed, Some(&effects)));
                Ok(())
            }
            Commands::Fit {
                dataset,
                config,
                generations,
                population,
                workers,
                seed,
                output,
            } => {
                let mut config = match config {
                    Some(path) => OptimizerConfig::load(path).map_err(cqlz_lang::Error::from)?,
                    None => OptimizerConfig::default(),
                };
                config.generations = generations.unwrap_or(config.generations);
                config.population_size = population.unwrap_or(config.population_size);
                config.workers = workers.unwrap_or(config.workers);
                config.seed = seed.or(config.seed);

                let dataset = Dataset::load(dataset).map_err(cqlz_lang::Error::from)?;
                tracing::info!(samples = dataset.len(), "Loaded dataset");
                let beta = config.f_beta;
                let result = Optimizer::new(config)
                    .and_then(|mut optimizer| optimizer.run(&dataset, &CancelToken::new()))
                    .map_err(cqlz_lang::Error::from)?;

                eprintln!("{}, F{beta}: {:.4}", result.stats, result.f_beta);
                let json = serde_json::to_string_pretty(&result.weights).into_diagnostic()?;

                match output {
                    Some(path) => std::fs::write(path, format!("{json}\n")).into_diagnostic(),
                    None => {
                        println!("{json}");
                        Ok(())
                    }
                }
            }
        }
    }

    fn init_tracing(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .try_init();
    }
}

fn load_weights(path: Option<&Path>) -> miette::Result<Weights> {
    match path {
        Some(path) => Ok(Weights::load(path).map_err(cqlz_lang::Error::from)?),
        None => Ok(Weights::default()),
    }
}

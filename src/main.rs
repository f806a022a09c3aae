use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::info;

use heredity::logging::{init_logging, level_for};
use heredity::prelude::*;
use heredity::report::{render_json, render_text, DEFAULT_PRECISION};

/// Posterior gene copies and trait presence for every member of a family.
#[derive(Debug, Parser)]
#[command(name = "heredity", author, version)]
struct Cli {
    /// CSV file with `name`, `mother`, `father` and `trait` columns.
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// TOML file overriding the gene prior, trait table or mutation rate.
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Decimal places in text output.
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: usize,

    /// Print the joint probability of a single world instead of running inference.
    #[arg(long)]
    joint: bool,

    /// Individuals carrying one copy (with --joint).
    #[arg(long, value_delimiter = ',', requires = "joint")]
    one_gene: Vec<String>,

    /// Individuals carrying two copies (with --joint).
    #[arg(long, value_delimiter = ',', requires = "joint")]
    two_genes: Vec<String>,

    /// Individuals showing the trait (with --joint).
    #[arg(long, value_delimiter = ',', requires = "joint")]
    have_trait: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(level_for(cli.verbose));

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let probabilities = match &cli.model {
        Some(path) => Probabilities::from_path(path)?,
        None => Probabilities::default(),
    };

    let mut population = Population::new();
    population.observe(CsvBuilder::new().from_path(&cli.data)?)?;
    info!(
        individuals = population.len(),
        path = %cli.data.display(),
        "loaded pedigree"
    );

    if cli.joint {
        let world = World::from_names(
            &population,
            &names(&cli.one_gene),
            &names(&cli.two_genes),
            &names(&cli.have_trait),
        )?;
        let p = joint_probability(&population, &world, &probabilities)?;
        return Ok(format!("{}\n", p));
    }

    let posteriors = population.infer(&probabilities)?;
    match cli.format {
        Format::Text => Ok(render_text(&posteriors, cli.precision)),
        Format::Json => Ok(render_json(&posteriors)? + "\n"),
    }
}

fn names(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

//! Command-line interface for catalog-pathgen
//!
//! # Usage Examples
//!
//! ```bash
//! # 1370 record API paths for a QA host
//! RECORD_API_KEY=... RECORD_API_SECRET=... catalog-pathgen generate \
//!   --base-url https://qa-catalog.example.org \
//!   --count 1370 \
//!   --profile sierra \
//!   --outfile sierra-api-paths.csv
//!
//! # Discovery traffic (61% search, 39% record lookup), fixed seed
//! catalog-pathgen generate \
//!   --base-url https://qa-platform.example.org \
//!   --profile discovery-api \
//!   --keywords data/search-keywords.csv \
//!   --seed 42
//!
//! # Inspect quotas without touching the network
//! catalog-pathgen plan --count 1000 --profile research-catalog
//! ```

use anyhow::Context;
use catalog_pathgen::{
    allocate_quotas, seeds, ApiCredentials, DateBounds, HttpRecordApi, Mix, Profile,
    RunCoordinator, RunSettings, SeedData,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalog-pathgen")]
#[command(about = "Generates synthetic request-path corpora for catalog API load testing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a path corpus and write it to a file
    Generate(GenerateArgs),

    /// Print the effective category quotas for a count (no network I/O)
    Plan(PlanArgs),
}

/// Built-in traffic profile for CLI.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileChoice {
    Sierra,
    DiscoveryApi,
    ResearchCatalog,
}

impl From<ProfileChoice> for Profile {
    fn from(choice: ProfileChoice) -> Self {
        match choice {
            ProfileChoice::Sierra => Profile::Sierra,
            ProfileChoice::DiscoveryApi => Profile::DiscoveryApi,
            ProfileChoice::ResearchCatalog => Profile::ResearchCatalog,
        }
    }
}

#[derive(Args)]
struct MixArgs {
    /// Built-in traffic profile
    #[arg(long, value_enum, default_value = "sierra")]
    profile: ProfileChoice,

    /// YAML mix file overriding the built-in profile
    #[arg(long, value_name = "PATH")]
    mix: Option<PathBuf>,
}

impl MixArgs {
    fn load(&self) -> anyhow::Result<Mix> {
        let mix = match &self.mix {
            Some(path) => Mix::from_file(path)?,
            None => Profile::from(self.profile).mix(),
        };
        Ok(mix)
    }
}

#[derive(Args)]
struct GenerateArgs {
    /// Total number of paths to generate
    #[arg(long, short = 'c', default_value_t = 1000)]
    count: u64,

    /// Base URL of the target host
    #[arg(long, env = "PATHGEN_BASE_URL")]
    base_url: String,

    #[command(flatten)]
    mix: MixArgs,

    /// Search keyword seed CSV (first column)
    #[arg(long, default_value = "data/search-keywords.csv")]
    keywords: PathBuf,

    /// Subject-heading navigation URL seed CSV
    #[arg(long, default_value = "data/subject-heading-urls.csv")]
    subject_headings: PathBuf,

    /// Output file
    #[arg(long, short = 'o', default_value = "paths.csv")]
    outfile: PathBuf,

    /// Start of the date-window bound interval (RFC 3339 or YYYY-MM-DD);
    /// peg to the target instance's range of highest activity
    #[arg(long, default_value = "2021-01-01T00:00:00-04:00")]
    date_start: String,

    /// End of the date-window bound interval
    #[arg(long, default_value = "2021-12-31T23:59:59-04:00")]
    date_end: String,

    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Record API key for the token endpoint
    #[arg(long, env = "RECORD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Record API secret for the token endpoint
    #[arg(long, env = "RECORD_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Page size for record API queries
    #[arg(long, default_value_t = 200)]
    page_size: u32,

    /// Identifiers sampled from each resolution page
    #[arg(long, default_value_t = 10)]
    sample_per_page: usize,

    /// Record API queries allowed per category before giving up
    #[arg(long, default_value_t = 100)]
    max_attempts: u32,

    /// Category tasks allowed to query the record API concurrently
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

#[derive(Args)]
struct PlanArgs {
    /// Total number of paths to plan for
    #[arg(long, short = 'c', default_value_t = 1000)]
    count: u64,

    #[command(flatten)]
    mix: MixArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args).await,
        Commands::Plan(args) => plan(args),
    }
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mix = args.mix.load()?;

    let bounds = DateBounds::parse(&args.date_start, &args.date_end)?;
    let seed = args.seed.unwrap_or_else(rand::random);

    // Load only the seed files the mix actually draws from.
    let seed_data = SeedData {
        keywords: if mix.uses_keywords() {
            seeds::load_keywords(&args.keywords)?
        } else {
            Vec::new()
        },
        subject_headings: if mix.uses_subject_headings() {
            seeds::load_subject_headings(&args.subject_headings)?
        } else {
            Vec::new()
        },
    };

    let credentials = match (args.api_key, args.api_secret) {
        (Some(key), Some(secret)) => Some(ApiCredentials { key, secret }),
        _ => None,
    };
    if mix.needs_record_api_auth() && credentials.is_none() {
        anyhow::bail!(
            "this mix queries the record API; set RECORD_API_KEY and RECORD_API_SECRET \
             (or pass --api-key/--api-secret)"
        );
    }

    tracing::info!(
        "Generating {} paths for {} (seed={})",
        args.count,
        args.base_url,
        seed
    );

    let api = HttpRecordApi::connect(&args.base_url, credentials.as_ref())
        .await
        .with_context(|| format!("failed to connect to record API at {}", args.base_url))?;

    let settings = RunSettings {
        total: args.count,
        seed,
        bounds,
        page_size: args.page_size,
        sample_per_page: args.sample_per_page,
        max_attempts: args.max_attempts,
        concurrency: args.concurrency,
    };

    let coordinator = RunCoordinator::new(api, settings);
    let paths = coordinator.run(&mix, &seed_data).await?;

    let count = paths.len();
    std::fs::write(&args.outfile, paths.join("\n") + "\n")
        .with_context(|| format!("failed to write output file {:?}", args.outfile))?;

    tracing::info!("Done. Wrote {} paths to {:?}", count, args.outfile);
    Ok(())
}

fn plan(args: PlanArgs) -> anyhow::Result<()> {
    let mix = args.mix.load()?;
    let quotas = allocate_quotas(&mix, args.count)?;

    println!("Planning {} paths with the following target breakdown:", args.count);
    let mut sum = 0u64;
    for (name, quota) in &quotas {
        println!("  {name}: {quota}");
        sum += quota;
    }
    println!("  total quota: {sum} (merged output is trimmed to {})", args.count.min(sum));
    Ok(())
}

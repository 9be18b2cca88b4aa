use anyhow::{Context, Result};
use clap::Parser;
use skilltime::cli::{BblogArgs, Cli, Command, GenerateArgs, StoreArgs};
use skilltime::config::GenerateConfig;
use skilltime::duration::DurationBounds;
use skilltime::event::SkillEvent;
use skilltime::generate::{generate, rng_from_seed};
use skilltime::lookup::{LookupEntry, LookupEntryBuilder, LookupWriter};
use skilltime::mixture::GaussianComponent;
use skilltime::store::{DocumentStore, JsonlCollection};
use skilltime::transform::transform;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; logs go to stderr, entries to stdout
fn init_tracing(store: &StoreArgs) {
    let level = if store.debug {
        tracing::Level::TRACE
    } else if store.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Print one entry as a JSON line
fn print_entry(entry: &LookupEntry) {
    match serde_json::to_string(entry) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::warn!(error = %e, "could not render entry"),
    }
}

fn open_lookup(store: &DocumentStore, args: &StoreArgs) -> Result<JsonlCollection<LookupEntry>> {
    store
        .open_collection(&args.db, &args.collection)
        .with_context(|| {
            format!(
                "Failed to open lookup collection {}.{}",
                args.db, args.collection
            )
        })
}

fn drop_first(
    writer: &mut LookupWriter<'_, JsonlCollection<LookupEntry>>,
    args: &StoreArgs,
) -> Result<()> {
    if args.drop_collection_first && writer.drop_all()? {
        tracing::info!(
            db = %args.db,
            collection = %args.collection,
            "dropped lookup collection before uploading"
        );
    }
    Ok(())
}

fn run_bblog(args: &BblogArgs) -> Result<()> {
    let bounds = DurationBounds::new(args.lower_bound, args.upper_bound)
        .context("Invalid --lower-bound/--upper-bound")?;
    let store = DocumentStore::new(&args.store.store_dir);
    let src_store = match &args.src_store_dir {
        Some(dir) => DocumentStore::new(dir),
        None => store.clone(),
    };

    let log: JsonlCollection<SkillEvent> = src_store
        .open_collection(&args.src_db, &args.src_col)
        .with_context(|| format!("Failed to open skiller log {}.{}", args.src_db, args.src_col))?;
    if log.is_empty() {
        tracing::warn!(db = %args.src_db, collection = %args.src_col, "skiller log is empty");
    }

    let mut lookup = open_lookup(&store, &args.store)?;
    let mut writer = LookupWriter::new(&mut lookup, args.store.dry_run);
    drop_first(&mut writer, &args.store)?;

    let report = transform(&log, &LookupEntryBuilder::new(bounds), &mut writer, print_entry)
        .context("Skiller log transformation aborted")?;
    tracing::info!(
        starts = report.starts,
        paired = report.paired,
        unmatched = report.unmatched,
        non_terminal = report.non_terminal,
        out_of_range = report.out_of_range,
        duplicates = report.duplicates,
        added = report.added,
        dry_run = args.store.dry_run,
        "transform finished"
    );

    if args.drop_src_col && !args.store.dry_run {
        src_store.drop_collection(&args.src_db, &args.src_col)?;
    }
    Ok(())
}

/// Merge the optional config file with command-line values
fn generate_config(args: &GenerateArgs) -> Result<GenerateConfig> {
    let mut config = match &args.config {
        Some(path) => GenerateConfig::from_file(path)?,
        None => GenerateConfig::default(),
    };

    if let Some(quantity) = args.quantity {
        config.quantity = quantity;
    }
    if let Some(name) = &args.skill_name {
        config.skill_name = name.clone();
    }
    if !args.skill_args.is_empty() {
        config.args = args.skill_args.clone();
    }
    if !args.gauss_params.is_empty() {
        config.components = args
            .gauss_params
            .chunks_exact(2)
            .map(|p| GaussianComponent::new(p[0], p[1]))
            .collect();
    }
    if let Some(weights) = &args.dist_weights {
        config.weights = weights.clone();
    }
    if let Some(lower) = args.lower_bound {
        config.lower_bound = lower;
    }
    if let Some(upper) = args.upper_bound {
        config.upper_bound = upper;
    }
    if args.max_draws.is_some() {
        config.max_draws = args.max_draws;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = generate_config(args).context("Invalid generate settings")?;
    let store = DocumentStore::new(&args.store.store_dir);

    let mut lookup = open_lookup(&store, &args.store)?;
    let mut writer = LookupWriter::new(&mut lookup, args.store.dry_run);
    drop_first(&mut writer, &args.store)?;

    let mut rng = rng_from_seed(config.seed);
    let report = generate(&config, &mut writer, &mut rng, print_entry)
        .context("Sampling synthetic durations failed")?;
    tracing::info!(
        added = report.added,
        draws = report.draws,
        mean = report.mean.unwrap_or(f64::NAN),
        dry_run = args.store.dry_run,
        "generate finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Bblog(args) => {
            init_tracing(&args.store);
            run_bblog(args)
        }
        Command::Generate(args) => {
            init_tracing(&args.store);
            run_generate(args)
        }
    }
}

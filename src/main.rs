//! kg-truthy CLI: truthy consolidation and cleanup for Wikibase-shaped stores.

use std::ops::Range;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use oxigraph::model::Triple;

use kg_truthy::cleanup::PredicatePurge;
use kg_truthy::config::Settings;
use kg_truthy::graph::Graph;
use kg_truthy::graph::serialize::Format;
use kg_truthy::sparql::Mode;
use kg_truthy::sparql::http::HttpEndpoint;
use kg_truthy::truthy::{KeySet, TruthyEngine};
use kg_truthy::vocab;

#[derive(Parser)]
#[command(name = "kg-truthy", version, about = "Truthy-rank consolidation for SPARQL stores")]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SPARQL endpoint URL (overrides the settings file).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Basic auth user.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Basic auth password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Report what would change instead of committing.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute best-rank markers and shortcut edges for a set of keys.
    Truthy {
        /// File with one `ENTITY PROPERTY` pair per line.
        #[arg(long)]
        keys: PathBuf,

        /// Maximum keys per bulk rewrite.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Dispatch batches concurrently.
        #[arg(long)]
        parallel: bool,
    },

    /// Delete every triple using the given predicates.
    Purge {
        /// Predicate as a prefixed name or absolute IRI (repeatable).
        #[arg(long)]
        predicate: Vec<String>,

        /// Numbered predicate range, e.g. `wdt:C3001..3020` (end exclusive).
        #[arg(long, value_parser = parse_range)]
        range: Vec<PredicateRange>,
    },

    /// Convert an N-Triples document to another serialization.
    Convert {
        /// N-Triples input file.
        #[arg(long)]
        input: PathBuf,

        /// Output format: ttl, nt or json-ld.
        #[arg(long, default_value = "ttl")]
        format: String,

        /// Extra prefix binding `NAME=IRI` (repeatable).
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },
}

#[derive(Debug, Clone)]
struct PredicateRange {
    prefix: String,
    stem: String,
    numbers: Range<u32>,
}

fn parse_range(s: &str) -> std::result::Result<PredicateRange, String> {
    let err = || format!("expected PREFIX:STEM<start>..<end>, got \"{s}\"");
    let (prefix, local) = s.split_once(':').ok_or_else(err)?;
    let (from, end) = local.split_once("..").ok_or_else(err)?;
    let stem_len = from.len() - from.trim_start_matches(|c: char| !c.is_ascii_digit()).len();
    let (stem, start) = from.split_at(stem_len);
    let start: u32 = start.parse().map_err(|_| err())?;
    let end: u32 = end.parse().map_err(|_| err())?;
    if prefix.is_empty() || end < start {
        return Err(err());
    }
    Ok(PredicateRange {
        prefix: prefix.to_string(),
        stem: stem.to_string(),
        numbers: start..end,
    })
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mode = Mode::from_dry_run(cli.dry_run);

    match &cli.command {
        Commands::Truthy {
            keys,
            batch_size,
            parallel,
        } => {
            let mut settings = settings(&cli)?;
            if let Some(size) = *batch_size {
                settings.truthy.batch_size = size;
            }
            settings.truthy.parallel |= *parallel;

            let text = std::fs::read_to_string(keys).into_diagnostic()?;
            let keys = KeySet::parse(&text)?;
            let endpoint = HttpEndpoint::new(&settings.endpoint)?;
            let engine = TruthyEngine::new(endpoint, settings.truthy)?;
            let report = engine.run(&keys, mode)?;

            println!("{} key(s) in {} batch(es)", report.keys, report.batches);
            if mode == Mode::Preview {
                print_triples("promote would insert", &report.promoted);
                print_triples("demote would delete", &report.demoted);
            }
        }

        Commands::Purge { predicate, range } => {
            let settings = settings(&cli)?;
            let mut purge = PredicatePurge::new();
            for p in predicate {
                purge = purge.predicate(p.clone())?;
            }
            for r in range {
                purge = purge.range(&r.prefix, &r.stem, r.numbers.clone())?;
            }
            if purge.is_empty() {
                miette::bail!("nothing to purge: pass --predicate or --range");
            }

            let endpoint = HttpEndpoint::new(&settings.endpoint)?;
            let touched = purge.run(&endpoint, mode)?;
            match mode {
                Mode::Preview => print_triples("purge would delete", &touched),
                Mode::Apply => println!("purged {} predicate(s)", purge.predicates().len()),
            }
        }

        Commands::Convert {
            input,
            format,
            prefixes,
        } => {
            let format: Format = format.parse()?;
            let text = std::fs::read_to_string(input).into_diagnostic()?;
            let mut graph = Graph::from_ntriples(&text)?;
            for (prefix, namespace) in vocab::PREFIXES {
                graph.bind(prefix, namespace)?;
            }
            for binding in prefixes {
                let Some((prefix, namespace)) = binding.split_once('=') else {
                    miette::bail!("invalid prefix binding \"{binding}\", expected NAME=IRI");
                };
                graph.bind(prefix, namespace)?;
            }
            print!("{}", graph.serialize(format));
        }
    }

    Ok(())
}

/// Settings from `--config` (or defaults) with command-line overrides applied.
fn settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(url) = &cli.endpoint {
        settings.endpoint.url = url.clone();
    }
    if let Some(user) = &cli.user {
        settings.endpoint.user = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        settings.endpoint.password = Some(password.clone());
    }
    settings.validate()?;
    Ok(settings)
}

fn print_triples(label: &str, triples: &[Triple]) {
    println!("# {label}: {} triple(s)", triples.len());
    for triple in triples {
        println!("{triple} .");
    }
}

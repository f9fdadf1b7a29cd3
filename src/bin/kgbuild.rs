//! kgbuild CLI: compile a path query and build its knowledge graph.
//!
//! Usage:
//!   kgbuild build --fixture FILE --path SPEC [--label NAME] [--db path] [--json path]
//!   kgbuild check --fixture FILE --path SPEC

use clap::{Parser, Subcommand};
use kgbuild::storage::render_tree;
use kgbuild::{AdapterFixture, BuilderConfig, GraphBuilder, JsonExport, PathSpec, SqliteSink, UserQuery};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kgbuild", version, about = "Query-driven knowledge graph builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a graph and write it to SQLite (and optionally JSON)
    Build {
        #[command(flatten)]
        query: QueryArgs,
        /// Label the graph is stored under (defaults to the path spec)
        #[arg(long)]
        label: Option<String>,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Also write a node-link JSON document here
        #[arg(long)]
        json: Option<PathBuf>,
        /// Builder configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compile the query and print its traversal patterns and plans
    Check {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Type graph plus recorded adapter answers (YAML)
    #[arg(long)]
    fixture: PathBuf,
    /// Path specification, e.g. "Disease(DOID:123)-Gene-GeneticCondition"
    #[arg(long)]
    path: String,
    /// Free-text name for the start anchor
    #[arg(long)]
    start_name: Option<String>,
    /// Free-text name for the end anchor
    #[arg(long)]
    end_name: Option<String>,
}

impl QueryArgs {
    fn user_query(&self) -> Result<UserQuery, String> {
        let spec = PathSpec::parse(&self.path).map_err(|e| e.to_string())?;
        spec.to_user_query(self.start_name.as_deref(), self.end_name.as_deref())
            .map_err(|e| e.to_string())
    }
}

fn load_fixture(path: &Path) -> Result<AdapterFixture, String> {
    AdapterFixture::load(path).map_err(|e| format!("Failed to load fixture {}: {}", path.display(), e))
}

fn load_config(path: Option<&Path>) -> Result<BuilderConfig, String> {
    match path {
        Some(path) => BuilderConfig::load(path).map_err(|e| format!("Failed to load config {}: {}", path.display(), e)),
        None => Ok(BuilderConfig::default()),
    }
}

async fn cmd_check(args: &QueryArgs) -> i32 {
    let setup = load_fixture(&args.fixture).and_then(|fixture| {
        let type_graph = fixture.type_graph().map_err(|e| e.to_string())?;
        Ok((fixture, type_graph))
    });
    let (fixture, type_graph) = match setup {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let registry = match fixture.registry(false) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let query = match args.user_query() {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let builder = GraphBuilder::new(Arc::new(type_graph), Arc::new(registry), BuilderConfig::default());
    match builder.compile(&query).await {
        Ok(compiled) => {
            for pattern in compiled.traversal_queries() {
                println!("{}", pattern.to_cypher());
            }
            for run in compiled.programs() {
                let side = if run.reversed { "end" } else { "start" };
                println!("{} {}: {}", side, run.start.identifier, run.plan);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_build(
    args: &QueryArgs,
    label: Option<String>,
    db: Option<PathBuf>,
    json: Option<PathBuf>,
    config: Option<PathBuf>,
) -> i32 {
    let config = match load_config(config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let fixture = match load_fixture(&args.fixture) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let parts = fixture
        .type_graph()
        .and_then(|t| Ok((t, fixture.registry(config.cache_responses)?)));
    let (type_graph, registry) = match parts {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let query = match args.user_query() {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let db_path = db.unwrap_or_else(|| config.database_path());
    let sink = match SqliteSink::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Failed to open database {}: {}", db_path.display(), e);
            return 1;
        }
    };
    let mut builder = GraphBuilder::new(Arc::new(type_graph), Arc::new(registry), config).with_sink(Arc::new(sink));
    if let Some(json) = json {
        builder = builder.with_sink(Arc::new(JsonExport::new(json)));
    }

    let label = label.unwrap_or_else(|| args.path.clone());
    match builder.run(&query, &label).await {
        Ok(build) => {
            print!("{}", render_tree(&build.graph, &build.roots()));
            let report = &build.report;
            println!(
                "Built '{}': {} nodes, {} edges ({} plans, {} pruned, {} support)",
                label, report.nodes, report.edges, report.plans, report.pruned, report.support_edges
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "kgbuild=debug" } else { "kgbuild=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Build {
            query,
            label,
            db,
            json,
            config,
        } => cmd_build(&query, label, db, json, config).await,
        Commands::Check { query } => cmd_check(&query).await,
    };
    std::process::exit(code);
}

//! Doraemon — blast-radius analysis for JS/TS repos.
//!
//! One binary, three subcommands, one per runnable process.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use doraemon::graphstore::http_client::HttpGraphStoreClient;
use doraemon::graphstore::neo4j::Neo4jGraphStore;
use doraemon::graphstore::{self as graph_service_module, GraphStore};
use doraemon::ingester::{self, IngesterState};
use doraemon::jobqueue::redis::RedisJobQueue;
use doraemon::jobqueue::JobQueue;
use doraemon::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "doraemon")]
#[command(about = "Blast-radius analysis for JS/TS repos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the GraphStore HTTP service, backed by Neo4j.
    GraphStore {
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the Analyzer worker loop against the Redis job queue.
    Worker {
        /// Consumer name within the configured consumer group.
        #[arg(long, default_value = "worker-1")]
        consumer_name: String,
    },

    /// Run the Ingester's trigger endpoint.
    Ingester {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,doraemon=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::GraphStore { port } => run_graph_store(config, port).await,
        Commands::Worker { consumer_name } => run_worker(config, &consumer_name).await,
        Commands::Ingester { port } => run_ingester(config, port).await,
    }
}

async fn run_graph_store(config: Config, port: Option<u16>) -> Result<()> {
    tracing::info!("connecting to Neo4j at {}", config.neo4j_uri);
    let store: Arc<dyn GraphStore> = Arc::new(
        Neo4jGraphStore::connect(
            &config.neo4j_uri,
            &config.neo4j_user,
            &config.neo4j_password,
            config.traversal_depth_cap,
        )
        .await?,
    );

    let app = graph_service_module::service::create_router(store);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.graph_service_port)));
    tracing::info!("graph-store service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_worker(config: Config, consumer_name: &str) -> Result<()> {
    tracing::info!("starting analyzer worker, consumer={}", consumer_name);

    let _graph: Arc<dyn GraphStore> = Arc::new(HttpGraphStoreClient::new(config.graph_service_url.clone()));
    let _queue: Arc<dyn JobQueue> = Arc::new(
        RedisJobQueue::connect(
            &config.redis_url,
            config.analysis_stream.clone(),
            config.dispatch_stream.clone(),
            config.consumer_group.clone(),
        )
        .await?,
    );

    // `SourceProvider` and `ImportExtractor` are external collaborators
    // (forge client, JS/TS import resolver) consumed only through their
    // traits — no concrete adapter ships in this crate. Wire one at this
    // composition root (via `Analyzer::new`) before running the worker for real.
    bail!(
        "no SourceProvider/ImportExtractor configured — wire concrete adapters at this \
         composition root before running `doraemon worker`"
    );
}

async fn run_ingester(config: Config, port: Option<u16>) -> Result<()> {
    let queue: Arc<dyn JobQueue> = Arc::new(
        RedisJobQueue::connect(
            &config.redis_url,
            config.analysis_stream.clone(),
            config.dispatch_stream.clone(),
            config.consumer_group.clone(),
        )
        .await?,
    );

    let state = IngesterState {
        queue,
        secret: config.ingester_secret.clone(),
    };

    let app = ingester::create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.ingester_port)));
    tracing::info!("ingester listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

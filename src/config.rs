//! Configuration loaded from the environment, one fallback literal per var.

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    pub redis_url: String,
    pub analysis_stream: String,
    pub dispatch_stream: String,
    pub consumer_group: String,

    pub graph_service_url: String,
    pub graph_service_port: u16,

    pub ingester_port: u16,
    pub ingester_secret: String,

    pub github_token: Option<String>,

    /// Cap on `IMPORTS*1..N` traversal depth for `RecursiveDependents`.
    pub traversal_depth_cap: u32,
    /// Bound on concurrent per-file upserts within one analysis job.
    pub upsert_concurrency: usize,
    /// Base directory for on-disk repo mirrors used by the worker.
    pub mirror_base_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".into()),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".into()),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "doraemon".into()),

            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into()),
            analysis_stream: std::env::var("ANALYSIS_STREAM").unwrap_or_else(|_| "doraemon:analysis".into()),
            dispatch_stream: std::env::var("DISPATCH_STREAM").unwrap_or_else(|_| "doraemon:dispatch".into()),
            consumer_group: std::env::var("CONSUMER_GROUP").unwrap_or_else(|_| "analyzers".into()),

            graph_service_url: std::env::var("GRAPH_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            graph_service_port: std::env::var("GRAPH_SERVICE_PORT")
                .unwrap_or_else(|_| "8081".into())
                .parse()
                .unwrap_or(8081),

            ingester_port: std::env::var("INGESTER_PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .unwrap_or(8080),
            ingester_secret: std::env::var("INGESTER_SECRET")
                .unwrap_or_else(|_| "change-me".into()),

            github_token: std::env::var("GITHUB_TOKEN").ok(),

            traversal_depth_cap: std::env::var("TRAVERSAL_DEPTH_CAP")
                .unwrap_or_else(|_| "50".into())
                .parse()
                .unwrap_or(50),
            upsert_concurrency: std::env::var("UPSERT_CONCURRENCY")
                .unwrap_or_else(|_| "16".into())
                .parse()
                .unwrap_or(16),
            mirror_base_dir: std::env::var("MIRROR_BASE_DIR").unwrap_or_else(|_| "/var/lib/doraemon/mirrors".into()),
        })
    }
}

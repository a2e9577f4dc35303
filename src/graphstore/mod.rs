pub mod http_client;
pub mod mock;
pub mod neo4j;
pub mod service;
pub mod traits;

pub use traits::GraphStore;

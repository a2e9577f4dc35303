pub mod mock;
pub mod state;
pub mod traits;
pub mod worker;

pub use state::AnalyzerState;
pub use traits::{ImportExtractor, SourceProvider};
pub use worker::Analyzer;

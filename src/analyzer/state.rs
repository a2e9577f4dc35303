//! The per-job state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerState {
    Received,
    Parsing,
    Comparing,
    NoChange,
    Incremental,
    FullAnalysis,
    Committing,
    Publishing,
    PublishedSuccess,
    PublishedNoChange,
    PublishedFailure,
}

impl AnalyzerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AnalyzerState::PublishedSuccess | AnalyzerState::PublishedNoChange | AnalyzerState::PublishedFailure
        )
    }
}

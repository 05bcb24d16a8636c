use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchRunSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
}

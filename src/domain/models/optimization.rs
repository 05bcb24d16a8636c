#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationOutcome {
    OptimizedSmaller,
    OptimizedNotSmaller,
    SkippedTooLarge,
    Failed,
}

/// Optimizer output. `buffer` is the original input unless the outcome is
/// `OptimizedSmaller`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationResult {
    pub buffer: Vec<u8>,
    pub outcome: OptimizationOutcome,
}

impl OptimizationResult {
    pub fn unchanged(buffer: Vec<u8>, outcome: OptimizationOutcome) -> Self {
        Self { buffer, outcome }
    }

    pub fn is_improved(&self) -> bool {
        self.outcome == OptimizationOutcome::OptimizedSmaller
    }
}

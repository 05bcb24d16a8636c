use std::{ffi::OsString, path::Path, path::PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    application::services::Optimizer,
    domain::{
        config::pipeline::OptimizerConfig,
        models::optimization::{OptimizationOutcome, OptimizationResult},
    },
    services::process::{run_bounded, ProcessError},
};

/// Lossy GIF recompression through the `gifsicle` command line tool.
pub struct GifsicleOptimizer {
    config: OptimizerConfig,
    temp_root: PathBuf,
}

impl GifsicleOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            temp_root: std::env::temp_dir(),
        }
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            format!("--optimize={}", self.config.optimize_level).into(),
            format!("--colors={}", self.config.colors).into(),
            format!("--lossy={}", self.config.lossy).into(),
            "--resize-fit".into(),
            format!("{}x{}", self.config.max_width, self.config.max_height).into(),
            input.as_os_str().to_owned(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ]
    }

    async fn run(&self, input: &[u8]) -> Result<Vec<u8>, ProcessError> {
        // Everything created for this call lives in `workdir` and goes with it.
        let workdir = tempfile::Builder::new()
            .prefix("gif-optimize-")
            .tempdir_in(&self.temp_root)?;
        let input_path = workdir.path().join("input.gif");
        let output_path = workdir.path().join("output.gif");

        tokio::fs::write(&input_path, input).await?;

        run_bounded(
            &self.config.program,
            &self.args(&input_path, &output_path),
            self.config.timeout,
            self.config.max_output_bytes,
        )
        .await?;

        let program = self.config.program.display().to_string();
        let size = tokio::fs::metadata(&output_path).await?.len();
        if size > self.config.max_output_bytes {
            return Err(ProcessError::OutputTooLarge {
                program,
                limit: self.config.max_output_bytes,
            });
        }
        if size == 0 {
            return Err(ProcessError::Failed {
                program,
                status: "exit status: 0".to_string(),
                stderr: "empty output file".to_string(),
            });
        }

        Ok(tokio::fs::read(&output_path).await?)
    }
}

#[async_trait]
impl Optimizer for GifsicleOptimizer {
    async fn optimize(&self, input: Vec<u8>) -> OptimizationResult {
        let input_len = input.len() as u64;

        if input_len > self.config.max_input_bytes {
            info!(
                "GIF too large ({}MB), skipping optimization",
                input_len / (1024 * 1024)
            );
            return OptimizationResult::unchanged(input, OptimizationOutcome::SkippedTooLarge);
        }

        match self.run(&input).await {
            Ok(optimized) if (optimized.len() as u64) < input_len => {
                let reduction = 100 - (optimized.len() as u64 * 100 / input_len.max(1));
                info!(
                    "GIF optimized: {} -> {} bytes ({}% reduction)",
                    input_len,
                    optimized.len(),
                    reduction
                );
                OptimizationResult {
                    buffer: optimized,
                    outcome: OptimizationOutcome::OptimizedSmaller,
                }
            }
            Ok(optimized) => {
                debug!(
                    "GIF optimization did not reduce size ({} -> {} bytes), keeping original",
                    input_len,
                    optimized.len()
                );
                OptimizationResult::unchanged(input, OptimizationOutcome::OptimizedNotSmaller)
            }
            Err(e) => {
                warn!("GIF optimization failed: {}", e);
                OptimizationResult::unchanged(input, OptimizationOutcome::Failed)
            }
        }
    }
}

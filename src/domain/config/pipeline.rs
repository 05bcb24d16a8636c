use std::{path::PathBuf, time::Duration};

const MIB: u64 = 1024 * 1024;

/// Fixed parameters handed to the external GIF optimizer.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub program: PathBuf,
    pub max_input_bytes: u64,
    pub timeout: Duration,
    pub max_output_bytes: u64,
    pub optimize_level: u8,
    pub colors: u16,
    pub lossy: u16,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gifsicle"),
            max_input_bytes: 10 * MIB,
            timeout: Duration::from_secs(20),
            max_output_bytes: 20 * MIB,
            optimize_level: 3,
            colors: 256,
            lossy: 20,
            max_width: 1500,
            max_height: 1500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub program: PathBuf,
    pub quality: u8,
    pub timeout: Duration,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("cwebp"),
            quality: 85,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub page_size: u32,
    pub throttle: Duration,
    pub scratch_root: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            throttle: Duration::from_millis(100),
            scratch_root: PathBuf::from("./temp-media-processing"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub optimizer: OptimizerConfig,
    pub encoder: EncoderConfig,
    pub batch: BatchConfig,
}

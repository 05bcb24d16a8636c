pub mod recompress;

pub use recompress::BatchRecompressionJob;

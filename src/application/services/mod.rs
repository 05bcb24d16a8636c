pub mod image_encoder;
pub mod optimizer;
pub mod remote_store;

pub use image_encoder::ImageEncoder;
pub use optimizer::Optimizer;
pub use remote_store::RemoteStore;

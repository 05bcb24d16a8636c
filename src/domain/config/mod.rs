pub mod pipeline;
pub mod secrets;
pub mod settings;
pub mod store;

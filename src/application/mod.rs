pub mod batch;
pub mod dto;
pub mod error;
pub mod pipeline;
pub mod repositories;
pub mod services;

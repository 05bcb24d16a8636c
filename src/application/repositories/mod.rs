pub mod media_repository;

pub use media_repository::MediaRepository;

mod pg_media_repository;

pub use pg_media_repository::PgMediaRepository;

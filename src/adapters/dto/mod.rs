pub mod media_dto;
pub mod recompress_dto;

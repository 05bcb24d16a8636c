pub mod media_dto;

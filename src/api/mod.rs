pub mod config_dto;
pub mod metadata_dto;

pub mod csv_export;
pub mod fs;
pub mod toml_config;

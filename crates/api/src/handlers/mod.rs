pub mod characters;
pub mod examples;
pub mod export;
pub mod generation;
pub mod imports;
pub mod projects;
pub mod props;
pub mod scenes;
pub mod shots;
pub mod templates;

pub mod builders;
pub mod config;
pub mod domain;
pub mod entities;
pub mod infra;
pub mod persistence;
pub mod repositories;
pub mod services;

#[cfg(test)]
mod testing;

pub use builders::{build_all, Repositories, Services};
pub use config::Settings;

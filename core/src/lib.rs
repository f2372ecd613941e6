pub mod budget;
pub mod catalog;
pub mod db;
pub mod energy;
pub mod error;
pub mod models;
pub mod recommend;
pub mod service;

pub use error::DietError;
pub use service::{DietService, ProfileStore};

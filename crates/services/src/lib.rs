#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod progress_store;
pub mod stats_service;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use catalog::{CurriculumCatalog, StaticCatalog};
pub use error::{AppServicesError, HydrationError, ProgressStoreError};
pub use progress_store::{PROGRESS_KEY, ProgressStore};
pub use stats_service::{ProgressOverview, ProgressStatsService};

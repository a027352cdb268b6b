//! HTTP handlers for the Kitchen Stock back office

mod activity;
mod alerts;
mod auth;
mod checklists;
mod dashboard;
mod health;
mod mappings;
mod operations;
mod registry;
mod sales;
mod stock;
pub mod upload;

pub use activity::*;
pub use alerts::*;
pub use auth::*;
pub use checklists::*;
pub use dashboard::*;
pub use health::*;
pub use mappings::*;
pub use operations::*;
pub use registry::*;
pub use sales::*;
pub use stock::*;

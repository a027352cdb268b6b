//! Domain models for the Kitchen Stock back office

mod activity;
mod alert;
mod draft_order;
mod ingredient;
mod inventory_count;
mod mapping;
mod purchase;
mod receiving;
mod recipe;
mod sales;
mod stock_movement;
mod supplier;
mod task;
mod user;

pub use activity::*;
pub use alert::*;
pub use draft_order::*;
pub use ingredient::*;
pub use inventory_count::*;
pub use mapping::*;
pub use purchase::*;
pub use receiving::*;
pub use recipe::*;
pub use sales::*;
pub use stock_movement::*;
pub use supplier::*;
pub use task::*;
pub use user::*;

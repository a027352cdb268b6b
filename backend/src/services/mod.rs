//! Business logic services for the Kitchen Stock back office

pub mod activity;
pub mod alerts;
pub mod auth;
pub mod checklists;
pub mod counts;
pub mod dashboard;
pub mod drafts;
pub mod ingredients;
pub mod inventory;
pub mod mappings;
pub mod purchasing;
pub mod receiving;
pub mod recipes;
pub mod reporting;
pub mod sales;
pub mod staff;
pub mod suppliers;

pub use activity::{ActivityService, Actor};
pub use alerts::AlertService;
pub use auth::AuthService;
pub use checklists::ChecklistService;
pub use counts::CountService;
pub use dashboard::DashboardService;
pub use drafts::DraftOrderService;
pub use ingredients::IngredientService;
pub use inventory::InventoryService;
pub use mappings::MappingService;
pub use purchasing::PurchaseService;
pub use receiving::ReceivingService;
pub use recipes::RecipeService;
pub use reporting::ReportingService;
pub use sales::SalesService;
pub use staff::StaffService;
pub use suppliers::SupplierService;

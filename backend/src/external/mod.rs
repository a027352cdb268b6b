//! External integrations: identity provider, object storage, sales pipeline

pub mod identity;
pub mod object_store;
pub mod sales_pipeline;

pub use identity::IdentityClient;
pub use object_store::ObjectStoreClient;
pub use sales_pipeline::{PipelineOutcome, SalesPipeline};

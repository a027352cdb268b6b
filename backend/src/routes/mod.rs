//! Route definitions for the Kitchen Stock back office

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::upload::MAX_UPLOAD_BYTES;
use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/auth", auth_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/ingredients", ingredient_routes())
        .nest("/recipes", recipe_routes())
        .nest("/staff", staff_routes())
        .nest("/stock", stock_routes())
        .nest("/operations", operations_routes())
        .nest("/alerts", alert_routes())
        .nest("/checklists", checklist_routes())
        .nest("/mappings", mapping_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/reports", report_routes())
        .nest("/sales", sales_routes())
        .route("/activity", get(handlers::list_activity))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Owner bootstrap (public)
        .route("/auth/setup-owner", post(handlers::setup_owner))
        .merge(protected)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/invite", post(handlers::invite_staff))
        .route("/resend-invite", post(handlers::resend_invite))
        .route("/me", get(handlers::me))
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route(
            "/:id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_ingredients).post(handlers::create_ingredient))
        .route(
            "/:id",
            get(handlers::get_ingredient)
                .put(handlers::update_ingredient)
                .delete(handlers::delete_ingredient),
        )
}

fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_recipes).post(handlers::create_recipe))
        .route("/minimal", post(handlers::create_minimal_recipe))
        .route(
            "/:id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
}

fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_staff).post(handlers::create_staff_member))
        .route(
            "/:id",
            get(handlers::get_staff_member)
                .put(handlers::update_staff_member)
                .delete(handlers::delete_staff_member),
        )
}

fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(handlers::get_current_stock))
        .route("/ingredients/:id/movements", get(handlers::get_ingredient_movements))
        .route("/ingredients/:id/adjust", post(handlers::adjust_stock))
        .route(
            "/draft-orders",
            get(handlers::list_draft_orders).post(handlers::add_draft_item),
        )
        .route(
            "/draft-orders/:id",
            put(handlers::update_draft_order).delete(handlers::delete_draft_order),
        )
        .route("/draft-orders/:id/finalize", post(handlers::finalize_draft_order))
}

fn operations_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchases",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route(
            "/purchases/:id",
            get(handlers::get_purchase)
                .put(handlers::update_purchase)
                .delete(handlers::cancel_purchase),
        )
        .route("/receivings", get(handlers::list_receivings))
        .route("/receivings/:id", get(handlers::get_receiving))
        .route(
            "/receivings/:id/photo",
            post(handlers::upload_receiving_photo).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/receivings/:id/checklist/:index",
            put(handlers::update_receiving_checklist_item),
        )
        .route("/receivings/:id/complete", post(handlers::complete_receiving))
        .route(
            "/inventory-counts",
            get(handlers::list_inventory_counts).post(handlers::start_inventory_count),
        )
        .route(
            "/inventory-counts/:id",
            get(handlers::get_inventory_count)
                .put(handlers::update_inventory_count)
                .delete(handlers::cancel_inventory_count),
        )
        .route(
            "/inventory-counts/:id/complete",
            post(handlers::complete_inventory_count),
        )
        .route("/stock-movements", get(handlers::list_stock_movements))
}

fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts).post(handlers::create_alert))
        .route("/stats", get(handlers::get_alert_stats))
        .route("/:id", get(handlers::get_alert))
}

fn checklist_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/apply-template", post(handlers::apply_checklist_template))
        .route(
            "/tasks/:id",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route(
            "/templates",
            get(handlers::list_checklist_templates).post(handlers::create_checklist_template),
        )
}

fn mapping_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_mappings))
        .route("/stats", get(handlers::get_mapping_stats))
        .route("/sku/:sku", get(handlers::get_mapping_by_sku))
        .route("/:sku", put(handlers::update_mapping))
}

fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(handlers::get_dashboard_summary))
        .route("/below-minimum", get(handlers::get_below_minimum))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales-by-product", get(handlers::get_sales_by_product))
        .route("/stock-value", get(handlers::get_stock_value))
}

fn sales_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(handlers::upload_sales).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/history", get(handlers::get_sales_history))
        .route("/uploads/:id", get(handlers::get_sales_upload))
}

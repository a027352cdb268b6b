//! Activity feed vocabulary

text_enum! {
    pub enum ActivityAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        Completed => "completed",
        Cancelled => "cancelled",
        Adjusted => "adjusted",
        Finalized => "finalized",
        Invited => "invited",
        Uploaded => "uploaded",
    }
}

text_enum! {
    pub enum EntityType {
        Supplier => "supplier",
        Ingredient => "ingredient",
        Recipe => "recipe",
        User => "user",
        Purchase => "purchase",
        Receiving => "receiving",
        DraftOrder => "draft_order",
        InventoryCount => "inventory_count",
        Alert => "alert",
        Task => "task",
        ChecklistTemplate => "checklist_template",
        Mapping => "mapping",
        SalesUpload => "sales_upload",
    }
}

/// Default page size of the activity feed
pub const ACTIVITY_DEFAULT_LIMIT: i64 = 50;

/// Largest page the activity feed serves
pub const ACTIVITY_MAX_LIMIT: i64 = 100;

//! Registry handlers: suppliers, ingredients, recipes and staff

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{ActivityAction, EntityType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::ingredients::{
    CreateIngredientInput, Ingredient, IngredientQuery, UpdateIngredientInput,
};
use crate::services::recipes::{
    CreateRecipeInput, MinimalRecipeInput, Recipe, RecipeQuery, UpdateRecipeInput,
};
use crate::services::staff::{CreateStaffInput, StaffMember, UpdateStaffInput};
use crate::services::suppliers::{CreateSupplierInput, Supplier, UpdateSupplierInput};
use crate::services::{
    ActivityService, IngredientService, RecipeService, StaffService, SupplierService,
};
use crate::AppState;

async fn log_change(
    state: &AppState,
    staff: &Staff,
    action: ActivityAction,
    entity: EntityType,
    id: Uuid,
    summary: String,
) {
    ActivityService::new(state.db.clone())
        .record(&staff.actor(), action, entity, id, summary, None)
        .await;
}

// Suppliers

pub async fn list_suppliers(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<Vec<Supplier>>>> {
    let suppliers = SupplierService::new(state.db).list().await?;
    Ok(Json(ApiResponse::list(suppliers)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    let supplier = SupplierService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(supplier)))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Supplier>>)> {
    let supplier = SupplierService::new(state.db.clone()).create(input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Created,
        EntityType::Supplier,
        supplier.id,
        format!("Cadastrou o fornecedor {}", supplier.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(supplier))))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    let supplier = SupplierService::new(state.db.clone()).update(id, input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Updated,
        EntityType::Supplier,
        supplier.id,
        format!("Atualizou o fornecedor {}", supplier.name),
    )
    .await;
    Ok(Json(ApiResponse::ok(supplier)))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let supplier = SupplierService::new(state.db.clone()).delete(id).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Deleted,
        EntityType::Supplier,
        supplier.id,
        format!("Removeu o fornecedor {}", supplier.name),
    )
    .await;
    Ok(Json(ApiResponse::message("Fornecedor deletado com sucesso")))
}

// Ingredients

pub async fn list_ingredients(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<ApiResponse<Vec<Ingredient>>>> {
    let ingredients = IngredientService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(ingredients)))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    let ingredient = IngredientService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(ingredient)))
}

pub async fn create_ingredient(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateIngredientInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Ingredient>>)> {
    let ingredient = IngredientService::new(state.db.clone()).create(input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Created,
        EntityType::Ingredient,
        ingredient.id,
        format!("Cadastrou o ingrediente {}", ingredient.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ingredient))))
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateIngredientInput>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    let ingredient = IngredientService::new(state.db.clone()).update(id, input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Updated,
        EntityType::Ingredient,
        ingredient.id,
        format!("Atualizou o ingrediente {}", ingredient.name),
    )
    .await;
    Ok(Json(ApiResponse::ok(ingredient)))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let ingredient = IngredientService::new(state.db.clone()).delete(id).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Deleted,
        EntityType::Ingredient,
        ingredient.id,
        format!("Removeu o ingrediente {}", ingredient.name),
    )
    .await;
    Ok(Json(ApiResponse::message("Ingrediente deletado com sucesso")))
}

// Recipes

pub async fn list_recipes(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<ApiResponse<Vec<Recipe>>>> {
    let recipes = RecipeService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(recipes)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let recipe = RecipeService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(recipe)))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Recipe>>)> {
    let recipe = RecipeService::new(state.db.clone()).create(input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Created,
        EntityType::Recipe,
        recipe.id,
        format!("Cadastrou a receita {}", recipe.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(recipe))))
}

/// Name-only recipe stub, completed later
pub async fn create_minimal_recipe(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<MinimalRecipeInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Recipe>>)> {
    let recipe = RecipeService::new(state.db.clone()).create_minimal(input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Created,
        EntityType::Recipe,
        recipe.id,
        format!("Criou a receita provisória {}", recipe.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(recipe))))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRecipeInput>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let recipe = RecipeService::new(state.db.clone()).update(id, input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Updated,
        EntityType::Recipe,
        recipe.id,
        format!("Atualizou a receita {}", recipe.name),
    )
    .await;
    Ok(Json(ApiResponse::ok(recipe)))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let recipe = RecipeService::new(state.db.clone()).delete(id).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Deleted,
        EntityType::Recipe,
        recipe.id,
        format!("Removeu a receita {}", recipe.name),
    )
    .await;
    Ok(Json(ApiResponse::message("Receita deletada com sucesso")))
}

// Staff

pub async fn list_staff(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<Vec<StaffMember>>>> {
    let members = StaffService::new(state.db).list().await?;
    Ok(Json(ApiResponse::list(members)))
}

pub async fn get_staff_member(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StaffMember>>> {
    let member = StaffService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(member)))
}

pub async fn create_staff_member(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateStaffInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<StaffMember>>)> {
    staff.require_admin()?;

    let member = StaffService::new(state.db.clone()).create(input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Created,
        EntityType::User,
        member.id,
        format!("Cadastrou o funcionário {}", member.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(member))))
}

pub async fn update_staff_member(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStaffInput>,
) -> AppResult<Json<ApiResponse<StaffMember>>> {
    staff.require_admin()?;

    let member = StaffService::new(state.db.clone()).update(id, input).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Updated,
        EntityType::User,
        member.id,
        format!("Atualizou o funcionário {}", member.name),
    )
    .await;
    Ok(Json(ApiResponse::ok(member)))
}

pub async fn delete_staff_member(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    staff.require_admin()?;

    let member = StaffService::new(state.db.clone()).delete(id).await?;
    log_change(
        &state,
        &staff,
        ActivityAction::Deleted,
        EntityType::User,
        member.id,
        format!("Removeu o funcionário {}", member.name),
    )
    .await;
    Ok(Json(ApiResponse::message("Funcionário removido com sucesso")))
}

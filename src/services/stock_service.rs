//! Stock Service - Inventory operations over the materials table

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::models::material::{self, Entity as Material, UpsertStockDto};
use crate::services::ServiceError;

/// List all materials, ordered by name
pub async fn list_materials(db: &DatabaseConnection) -> Result<Vec<material::Model>, ServiceError> {
    let materials = Material::find()
        .order_by_asc(material::Column::Name)
        .all(db)
        .await?;
    Ok(materials)
}

/// Result of a restock-by-name call
#[derive(Debug)]
pub struct UpsertOutcome {
    pub material: material::Model,
    pub created: bool,
    pub quantity_added: i32,
}

/// Add stock to an existing material by name, or create it if absent
pub async fn upsert_material(
    db: &DatabaseConnection,
    dto: UpsertStockDto,
) -> Result<UpsertOutcome, ServiceError> {
    let name = dto
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            ServiceError::InvalidInput("Name and valid quantity are required".to_string())
        })?;
    let quantity = dto.quantity.filter(|q| *q >= 0).ok_or_else(|| {
        ServiceError::InvalidInput("Name and valid quantity are required".to_string())
    })?;

    let txn = db.begin().await?;

    let existing = Material::find()
        .filter(material::Column::Name.eq(&name))
        .one(&txn)
        .await?;

    let outcome = match existing {
        Some(found) => {
            adjust_quantity(&txn, found.id, quantity).await?;
            let refreshed = Material::find_by_id(found.id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Material not found".to_string()))?;
            UpsertOutcome {
                material: refreshed,
                created: false,
                quantity_added: quantity,
            }
        }
        None => {
            let new_material = material::ActiveModel {
                name: Set(name.clone()),
                quantity_available: Set(quantity),
                created_at: Set(Utc::now().to_rfc3339()),
                ..Default::default()
            };
            let created = new_material.insert(&txn).await.map_err(|e| {
                if e.to_string().contains("UNIQUE") {
                    ServiceError::NameConflict(name.clone())
                } else {
                    ServiceError::from(e)
                }
            })?;
            UpsertOutcome {
                material: created,
                created: true,
                quantity_added: quantity,
            }
        }
    };

    txn.commit().await?;
    Ok(outcome)
}

/// Set a material's available quantity directly (stock editor)
pub async fn set_quantity(
    db: &DatabaseConnection,
    material_id: i32,
    quantity: Option<i32>,
) -> Result<material::Model, ServiceError> {
    let quantity = quantity
        .filter(|q| *q >= 0)
        .ok_or_else(|| ServiceError::InvalidInput("Valid quantity is required".to_string()))?;

    let found = Material::find_by_id(material_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Material not found".to_string()))?;

    let mut active: material::ActiveModel = found.into();
    active.quantity_available = Set(quantity);
    let updated = active.update(db).await?;

    Ok(updated)
}

/// Apply a relative stock delta as a single UPDATE expression.
///
/// The caller must have validated sufficiency inside the surrounding
/// transaction; the result must never go below zero.
pub(crate) async fn adjust_quantity<C: ConnectionTrait>(
    conn: &C,
    material_id: i32,
    delta: i32,
) -> Result<(), ServiceError> {
    Material::update_many()
        .col_expr(
            material::Column::QuantityAvailable,
            Expr::col(material::Column::QuantityAvailable).add(delta),
        )
        .filter(material::Column::Id.eq(material_id))
        .exec(conn)
        .await?;
    Ok(())
}

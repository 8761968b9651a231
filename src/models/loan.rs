use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub borrower_id: i32,
    pub material_id: i32,
    pub quantity: i32,
    pub borrow_date: String,
    pub is_returned: bool,
    pub return_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::borrower::Entity",
        from = "Column::BorrowerId",
        to = "super::borrower::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Borrower,
    #[sea_orm(
        belongs_to = "super::material::Entity",
        from = "Column::MaterialId",
        to = "super::material::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Material,
}

impl Related<super::borrower::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrower.def()
    }
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payload for POST /api/borrow. Field names match the borrow form.
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowDto {
    pub student_name: Option<String>,
    pub class_name: Option<String>,
    pub section_or_trade: Option<String>,
    pub material_id: Option<i32>,
    pub quantity: Option<i32>,
    /// Defaults to today when omitted.
    pub borrow_date: Option<String>,
}

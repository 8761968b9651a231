//! Stats Service - read-only dashboard aggregates over the ledger

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::models::borrower::Entity as Borrower;
use crate::models::loan::{self, Entity as Loan};
use crate::models::material::{self, Entity as Material};
use crate::services::{overdue_cutoff, ServiceError, LOW_STOCK_THRESHOLD};

const POPULAR_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct LowStockItem {
    pub name: String,
    pub quantity_available: i32,
}

#[derive(Debug, Serialize)]
pub struct PopularMaterial {
    pub name: String,
    pub borrow_count: i64,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_materials: u64,
    pub total_borrowers: u64,
    pub currently_borrowed: u64,
    pub overdue_items: u64,
    pub low_stock_items: Vec<LowStockItem>,
    pub popular_materials: Vec<PopularMaterial>,
}

pub async fn get_stats(db: &DatabaseConnection, today: NaiveDate) -> Result<Stats, ServiceError> {
    let total_materials = Material::find().count(db).await?;
    let total_borrowers = Borrower::find().count(db).await?;

    let currently_borrowed = Loan::find()
        .filter(loan::Column::IsReturned.eq(false))
        .count(db)
        .await?;

    let overdue_items = Loan::find()
        .filter(loan::Column::IsReturned.eq(false))
        .filter(loan::Column::BorrowDate.lt(overdue_cutoff(today)))
        .count(db)
        .await?;

    let low_stock_items = Material::find()
        .filter(material::Column::QuantityAvailable.lt(LOW_STOCK_THRESHOLD))
        .order_by_asc(material::Column::QuantityAvailable)
        .all(db)
        .await?
        .into_iter()
        .map(|m| LowStockItem {
            name: m.name,
            quantity_available: m.quantity_available,
        })
        .collect();

    // Historical borrow counts per material, zero-count materials included
    let materials = Material::find().all(db).await?;
    let mut counts: HashMap<i32, i64> = materials.iter().map(|m| (m.id, 0)).collect();
    for item in Loan::find().all(db).await? {
        if let Some(count) = counts.get_mut(&item.material_id) {
            *count += 1;
        }
    }

    let mut popular_materials: Vec<PopularMaterial> = materials
        .into_iter()
        .map(|m| PopularMaterial {
            borrow_count: counts.get(&m.id).copied().unwrap_or(0),
            name: m.name,
        })
        .collect();
    popular_materials.sort_by(|a, b| {
        b.borrow_count
            .cmp(&a.borrow_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    popular_materials.truncate(POPULAR_LIMIT);

    Ok(Stats {
        total_materials,
        total_borrowers,
        currently_borrowed,
        overdue_items,
        low_stock_items,
        popular_materials,
    })
}

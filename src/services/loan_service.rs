//! Loan Service - the borrow/return workflow and ledger queries
//!
//! `create_loan` and `close_loan` run their read-validate-write sequence
//! inside a single transaction so the stock check and the duplicate-loan
//! check cannot interleave with another borrow of the same material.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::models::borrower::{self, Entity as Borrower};
use crate::models::loan::{self, BorrowDto, Entity as Loan};
use crate::models::material::{self, Entity as Material};
use crate::services::{
    days_since, overdue_cutoff, stock_service, ServiceError, DATE_FMT, OVERDUE_DAYS,
};

#[derive(Debug, Clone)]
pub struct CreatedLoan {
    pub loan_id: i32,
    pub borrower_id: i32,
}

/// Create a borrow record and decrement stock atomically
pub async fn create_loan(
    db: &DatabaseConnection,
    dto: BorrowDto,
    today: NaiveDate,
) -> Result<CreatedLoan, ServiceError> {
    let full_name = required_text(dto.student_name)?;
    let class = required_text(dto.class_name)?;
    let section_or_trade = required_text(dto.section_or_trade)?;
    let material_id = dto
        .material_id
        .ok_or_else(|| ServiceError::InvalidInput("All fields are required".to_string()))?;
    let quantity = dto
        .quantity
        .ok_or_else(|| ServiceError::InvalidInput("All fields are required".to_string()))?;
    if quantity < 1 {
        return Err(ServiceError::InvalidInput(
            "Quantity must be a positive integer".to_string(),
        ));
    }
    let borrow_date = match dto.borrow_date {
        Some(raw) => parse_date(&raw)?,
        None => today,
    }
    .format(DATE_FMT)
    .to_string();

    let txn = db.begin().await?;

    // 1. Material must exist and have enough stock
    let found = Material::find_by_id(material_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Material not found".to_string()))?;

    if found.quantity_available < quantity {
        return Err(ServiceError::InsufficientStock {
            available: found.quantity_available,
            requested: quantity,
        });
    }

    // 2. Resolve the borrower by natural key
    let borrower_id = find_or_create_borrower(&txn, &full_name, &class, &section_or_trade).await?;

    // 3. One open loan per (borrower, material)
    let open = Loan::find()
        .filter(loan::Column::BorrowerId.eq(borrower_id))
        .filter(loan::Column::MaterialId.eq(material_id))
        .filter(loan::Column::IsReturned.eq(false))
        .one(&txn)
        .await?;
    if open.is_some() {
        return Err(ServiceError::DuplicateOpenLoan);
    }

    // 4. Ledger insert + stock decrement, both or neither
    let now = Utc::now().to_rfc3339();
    let new_loan = loan::ActiveModel {
        borrower_id: Set(borrower_id),
        material_id: Set(material_id),
        quantity: Set(quantity),
        borrow_date: Set(borrow_date),
        is_returned: Set(false),
        return_date: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let saved = new_loan.insert(&txn).await?;

    stock_service::adjust_quantity(&txn, material_id, -quantity).await?;

    txn.commit().await?;

    Ok(CreatedLoan {
        loan_id: saved.id,
        borrower_id,
    })
}

/// Close an open loan and restore its quantity to stock.
///
/// "Never existed" and "already returned" are deliberately the same
/// `NotFound`; the return list only cares that there is nothing to close.
pub async fn close_loan(
    db: &DatabaseConnection,
    loan_id: i32,
    today: NaiveDate,
) -> Result<String, ServiceError> {
    let return_date = today.format(DATE_FMT).to_string();

    let txn = db.begin().await?;

    let open = Loan::find_by_id(loan_id)
        .filter(loan::Column::IsReturned.eq(false))
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound("Borrow record not found or already returned".to_string())
        })?;

    let mut active: loan::ActiveModel = open.clone().into();
    active.is_returned = Set(true);
    active.return_date = Set(Some(return_date.clone()));
    active.updated_at = Set(Utc::now().to_rfc3339());
    active.update(&txn).await?;

    stock_service::adjust_quantity(&txn, open.material_id, open.quantity).await?;

    txn.commit().await?;

    Ok(return_date)
}

/// Look up a borrower by (full_name, class, section_or_trade), inserting on
/// first sight. A unique index on the tuple backs this against races.
pub async fn find_or_create_borrower<C: ConnectionTrait>(
    conn: &C,
    full_name: &str,
    class: &str,
    section_or_trade: &str,
) -> Result<i32, ServiceError> {
    if let Some(existing) = Borrower::find()
        .filter(borrower::Column::FullName.eq(full_name))
        .filter(borrower::Column::Class.eq(class))
        .filter(borrower::Column::SectionOrTrade.eq(section_or_trade))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }

    let created = borrower::ActiveModel {
        full_name: Set(full_name.to_string()),
        class: Set(class.to_string()),
        section_or_trade: Set(section_or_trade.to_string()),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(created.id)
}

/// A currently-open loan, as shown on the return list
#[derive(Debug, Clone, Serialize)]
pub struct OpenLoanView {
    pub id: i32,
    pub full_name: String,
    pub class: String,
    pub section_or_trade: String,
    pub material_name: String,
    pub quantity: i32,
    pub borrow_date: String,
    pub days_borrowed: i64,
}

/// List open loans, oldest borrow first
pub async fn list_open_loans(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<OpenLoanView>, ServiceError> {
    let loans_with_borrowers = Loan::find()
        .filter(loan::Column::IsReturned.eq(false))
        .order_by_asc(loan::Column::BorrowDate)
        .find_also_related(Borrower)
        .all(db)
        .await?;

    let material_names = material_name_map(
        db,
        loans_with_borrowers.iter().map(|(l, _)| l.material_id),
    )
    .await?;

    let rows = loans_with_borrowers
        .into_iter()
        .map(|(item, holder)| {
            let (full_name, class, section_or_trade) = borrower_identity(holder);
            let material_name = material_names
                .get(&item.material_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            OpenLoanView {
                id: item.id,
                full_name,
                class,
                section_or_trade,
                material_name,
                quantity: item.quantity,
                days_borrowed: days_since(&item.borrow_date, today),
                borrow_date: item.borrow_date,
            }
        })
        .collect();

    Ok(rows)
}

/// Filter parameters for the history view
#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    pub student: Option<String>,
    pub class_name: Option<String>,
    pub material: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// "returned" | "borrowed" | "overdue"; anything else is ignored
    pub return_status: Option<String>,
}

/// A ledger row enriched with borrower and material identity
#[derive(Debug, Clone, Serialize)]
pub struct LoanView {
    pub id: i32,
    pub full_name: String,
    pub class: String,
    pub section_or_trade: String,
    pub material_name: String,
    pub quantity: i32,
    pub borrow_date: String,
    pub is_returned: bool,
    pub return_date: Option<String>,
    pub status: String,
    pub days_since_borrow: i64,
}

/// Query the full borrow/return history, newest borrow first
pub async fn query_history(
    db: &DatabaseConnection,
    filter: HistoryFilter,
    today: NaiveDate,
) -> Result<Vec<LoanView>, ServiceError> {
    let mut condition = Condition::all();

    if let Some(from) = &filter.date_from {
        condition = condition.add(loan::Column::BorrowDate.gte(from.clone()));
    }
    if let Some(to) = &filter.date_to {
        condition = condition.add(loan::Column::BorrowDate.lte(to.clone()));
    }
    match filter.return_status.as_deref() {
        Some("returned") => condition = condition.add(loan::Column::IsReturned.eq(true)),
        Some("borrowed") => condition = condition.add(loan::Column::IsReturned.eq(false)),
        Some("overdue") => {
            // Stored dates are YYYY-MM-DD, so string order is date order
            condition = condition
                .add(loan::Column::IsReturned.eq(false))
                .add(loan::Column::BorrowDate.lt(overdue_cutoff(today)));
        }
        _ => {}
    }

    let loans_with_borrowers = Loan::find()
        .filter(condition)
        .order_by_desc(loan::Column::BorrowDate)
        .find_also_related(Borrower)
        .all(db)
        .await?;

    let material_names = material_name_map(
        db,
        loans_with_borrowers.iter().map(|(l, _)| l.material_id),
    )
    .await?;

    let rows = loans_with_borrowers
        .into_iter()
        .filter_map(|(item, holder)| {
            let (full_name, class, section_or_trade) = borrower_identity(holder);
            let material_name = material_names
                .get(&item.material_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());

            if let Some(student) = &filter.student {
                if !contains_ci(&full_name, student) {
                    return None;
                }
            }
            if let Some(class_name) = &filter.class_name {
                if !contains_ci(&class, class_name) {
                    return None;
                }
            }
            if let Some(needle) = &filter.material {
                if !contains_ci(&material_name, needle) {
                    return None;
                }
            }

            let days_since_borrow = days_since(&item.borrow_date, today);
            let status = if item.is_returned {
                "Returned"
            } else if days_since_borrow > OVERDUE_DAYS {
                "Overdue"
            } else {
                "Borrowed"
            };

            Some(LoanView {
                id: item.id,
                full_name,
                class,
                section_or_trade,
                material_name,
                quantity: item.quantity,
                borrow_date: item.borrow_date,
                is_returned: item.is_returned,
                return_date: item.return_date,
                status: status.to_string(),
                days_since_borrow,
            })
        })
        .collect();

    Ok(rows)
}

// A ledger row must never vanish from a report, even if its borrower row is
// somehow gone; fall back to a placeholder identity instead.
fn borrower_identity(holder: Option<borrower::Model>) -> (String, String, String) {
    match holder {
        Some(found) => (found.full_name, found.class, found.section_or_trade),
        None => (
            "Unknown".to_string(),
            "Unknown".to_string(),
            "Unknown".to_string(),
        ),
    }
}

async fn material_name_map<I: Iterator<Item = i32>>(
    db: &DatabaseConnection,
    material_ids: I,
) -> Result<HashMap<i32, String>, ServiceError> {
    let ids: Vec<i32> = material_ids.collect();
    let mut names = HashMap::new();

    if !ids.is_empty() {
        let materials = Material::find()
            .filter(material::Column::Id.is_in(ids))
            .all(db)
            .await?;
        for item in materials {
            names.insert(item.id, item.name);
        }
    }

    Ok(names)
}

fn required_text(value: Option<String>) -> Result<String, ServiceError> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("All fields are required".to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|_| {
        ServiceError::InvalidInput(format!("Invalid date: '{}' (expected YYYY-MM-DD)", raw))
    })
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

use chrono::Utc;
use sea_orm::*;

use crate::clock::Clock;
use crate::models::loan::BorrowDto;
use crate::models::material;
use crate::services::{loan_service, ServiceError};

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), ServiceError> {
    // 1. Materials
    let materials = [
        ("Broom", 12),
        ("Bucket", 10),
        ("Dustpan", 4),
        ("Mop", 8),
        ("Squeegee", 3),
    ];

    for (name, quantity) in materials {
        let item = material::ActiveModel {
            name: Set(name.to_owned()),
            quantity_available: Set(quantity),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };
        let inserted = material::Entity::insert(item)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(material::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        match inserted {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    // 2. A couple of open loans, through the workflow so stock stays consistent
    let today = Clock::System.today();
    let demo_borrows = [
        ("Jane Doe", "Form 2", "A", "Broom", 2),
        ("John Smith", "Form 3", "Carpentry", "Mop", 1),
    ];

    for (student, class, section, material_name, quantity) in demo_borrows {
        let Some(found) = material::Entity::find()
            .filter(material::Column::Name.eq(material_name))
            .one(db)
            .await?
        else {
            continue;
        };

        let dto = BorrowDto {
            student_name: Some(student.to_owned()),
            class_name: Some(class.to_owned()),
            section_or_trade: Some(section.to_owned()),
            material_id: Some(found.id),
            quantity: Some(quantity),
            borrow_date: None,
        };

        match loan_service::create_loan(db, dto, today).await {
            Ok(_) => {}
            // Re-running the seed leaves the earlier loan in place
            Err(ServiceError::DuplicateOpenLoan) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

use crate::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub conn: DatabaseConnection,
    pub clock: Clock,
}

impl AppState {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            clock: Clock::System,
        }
    }

    pub fn with_clock(conn: DatabaseConnection, clock: Clock) -> Self {
        Self { conn, clock }
    }
}

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create materials table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            quantity_available INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create borrowers table
    // The unique index on the identity tuple is what makes find-or-create
    // safe against concurrent inserts of the same student.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS borrowers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            class TEXT NOT NULL,
            section_or_trade TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_borrowers_identity
            ON borrowers(full_name, class, section_or_trade);
        "#
        .to_owned(),
    ))
    .await?;

    // Create loans table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS loans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            borrower_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            borrow_date TEXT NOT NULL,
            is_returned INTEGER NOT NULL DEFAULT 0,
            return_date TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (borrower_id) REFERENCES borrowers(id) ON DELETE CASCADE,
            FOREIGN KEY (material_id) REFERENCES materials(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_loans_borrower_id ON loans(borrower_id);
        CREATE INDEX IF NOT EXISTS idx_loans_material_id ON loans(material_id);
        CREATE INDEX IF NOT EXISTS idx_loans_is_returned ON loans(is_returned);
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}

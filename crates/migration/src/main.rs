use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./order_desk.db?mode=rwc";

enum Action {
    Up,
    Down,
    Fresh,
    Refresh,
    Status,
}

impl Action {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "fresh" => Some(Self::Fresh),
            "refresh" => Some(Self::Refresh),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let raw = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let Some(action) = Action::parse(&raw) else {
        eprintln!("Usage: migration [up|down|fresh|refresh|status]  (DATABASE_URL selects the db)");
        std::process::exit(2);
    };

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match action {
        Action::Up => migration::Migrator::up(&db, None).await?,
        Action::Down => migration::Migrator::down(&db, None).await?,
        Action::Fresh => migration::Migrator::fresh(&db).await?,
        Action::Refresh => migration::Migrator::refresh(&db).await?,
        Action::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}

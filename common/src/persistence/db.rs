use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    tracing::info!(backend = ?db.get_database_backend(), "database connected");
    Ok(db)
}

/// In-memory SQLite with tables created straight from the entity definitions.
#[cfg(test)]
pub(crate) async fn memory_db() -> DatabaseConnection {
    schema_db("sqlite::memory:").await
}

/// File-backed SQLite under the temp dir, for tests that need several pooled
/// connections writing at once. The file is removed when the guard drops.
#[cfg(test)]
pub(crate) async fn file_db(name: &str) -> (DatabaseConnection, TempDbFile) {
    let path = std::env::temp_dir().join(format!(
        "eventisa-{}-{}-{}.db",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    (schema_db(&url).await, TempDbFile(path))
}

#[cfg(test)]
pub(crate) struct TempDbFile(std::path::PathBuf);

#[cfg(test)]
impl Drop for TempDbFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(test)]
async fn schema_db(url: &str) -> DatabaseConnection {
    use crate::entities::prelude::*;
    use sea_orm::Schema;

    let db = establish_connection(url)
        .await
        .expect("sqlite connection");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = [
        builder.build(schema.create_table_from_entity(Hosts).if_not_exists()),
        builder.build(schema.create_table_from_entity(Users).if_not_exists()),
        builder.build(schema.create_table_from_entity(Events).if_not_exists()),
        builder.build(schema.create_table_from_entity(Participants).if_not_exists()),
        builder.build(schema.create_table_from_entity(Tickets).if_not_exists()),
        builder.build(schema.create_table_from_entity(OtpRecords).if_not_exists()),
    ];
    for stmt in statements {
        db.execute_raw(stmt).await.expect("create table from entity");
    }

    db
}

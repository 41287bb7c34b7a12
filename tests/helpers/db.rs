use migration::MigratorTrait;
use rolegate::authz::{Authorizer, NewRole, Role};
use sea_orm::{Database, DatabaseConnection};
use tempfile::NamedTempFile;

/// Test database with automatic cleanup
pub struct TestDb {
    connection: DatabaseConnection,
    _temp_file: NamedTempFile,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        // Create temporary SQLite database file
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_str().expect("Invalid temp file path");
        let db_url = format!("sqlite://{}?mode=rwc", db_path);

        // Connect to database
        let connection = Database::connect(&db_url)
            .await
            .expect("Failed to connect to test database");

        // Run migrations
        migration::Migrator::up(&connection, None)
            .await
            .expect("Failed to run migrations");

        Self {
            connection,
            _temp_file: temp_file,
        }
    }

    /// Get database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

/// Create a role for testing
pub async fn seed_role(authz: &Authorizer, id: &str, permissions: &[&str]) -> Role {
    authz
        .create_role(NewRole::new(id, permissions))
        .await
        .expect("Failed to create test role")
}

/// Create a session for `user_id` and return its cookie header value
pub async fn start_session(db: &DatabaseConnection, user_id: &str) -> String {
    let session = rolegate::storage::create_session(db, user_id, 3600)
        .await
        .expect("Failed to create test session");
    format!("{}={}", rolegate::session::SESSION_COOKIE_NAME, session.session_id)
}

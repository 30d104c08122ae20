//! Data source configuration types

use serde::{Deserialize, Serialize};

/// Database backend a data source points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseKind {
    #[serde(rename = "POSTGRESQL")]
    PostgreSql,
    #[serde(rename = "MYSQL")]
    MySql,
    Sqlite,
}

impl DatabaseKind {
    pub const ALL: [DatabaseKind; 3] = [
        DatabaseKind::PostgreSql,
        DatabaseKind::MySql,
        DatabaseKind::Sqlite,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            DatabaseKind::PostgreSql => "PostgreSQL",
            DatabaseKind::MySql => "MySQL",
            DatabaseKind::Sqlite => "SQLite",
        }
    }

    /// Driver identifier used to pick the connection backend
    pub fn driver(self) -> &'static str {
        match self {
            DatabaseKind::PostgreSql => "postgres",
            DatabaseKind::MySql => "mysql",
            DatabaseKind::Sqlite => "sqlite",
        }
    }

    /// URL template offered when a new data source of this kind is created
    pub fn default_url(self) -> &'static str {
        match self {
            DatabaseKind::PostgreSql => "postgres://localhost:5432/batch_db",
            DatabaseKind::MySql => "mysql://localhost:3306/batch_db",
            DatabaseKind::Sqlite => "sqlite://batch_db.db",
        }
    }

    /// Resolve a driver identifier (including common aliases) to a backend
    pub fn from_driver(driver: &str) -> Option<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(DatabaseKind::PostgreSql),
            "mysql" | "mariadb" => Some(DatabaseKind::MySql),
            "sqlite" => Some(DatabaseKind::Sqlite),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseKind::from_driver(s)
            .ok_or_else(|| format!("unknown database kind '{}' (expected postgres, mysql or sqlite)", s))
    }
}

/// Named, credentialed connection descriptor for one monitored database
///
/// Owned by the engine's registry. The `id` is assigned once and never
/// changes; two configurations with the same id are the same data source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "databaseType")]
    pub kind: DatabaseKind,
    /// Explicit driver override; blank means "use the kind's driver"
    #[serde(default, rename = "driverClassName")]
    pub driver: String,
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

impl DataSourceConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: DatabaseKind,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            driver: kind.driver().to_string(),
            url: url.into(),
            username: username.into(),
            password: password.into(),
            active: true,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// Change the kind, resetting the driver to the kind's default
    pub fn set_kind(&mut self, kind: DatabaseKind) {
        self.kind = kind;
        self.driver = kind.driver().to_string();
    }

    /// Driver identifier actually used to connect
    pub fn effective_driver(&self) -> &str {
        if self.driver.trim().is_empty() {
            self.kind.driver()
        } else {
            self.driver.trim()
        }
    }

    /// True when two configurations would open identical connections
    pub fn same_connection_settings(&self, other: &DataSourceConfig) -> bool {
        self.effective_driver() == other.effective_driver()
            && self.url == other.url
            && self.username == other.username
            && self.password == other.password
    }
}

impl std::fmt::Debug for DataSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("active", &self.active)
            .field("description", &self.description)
            .finish()
    }
}

impl std::fmt::Display for DataSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sets_driver() {
        let mut config = DataSourceConfig::new(
            "pg",
            "Primary",
            DatabaseKind::PostgreSql,
            DatabaseKind::PostgreSql.default_url(),
            "batch",
            "secret",
        );
        assert_eq!(config.effective_driver(), "postgres");

        config.set_kind(DatabaseKind::MySql);
        assert_eq!(config.effective_driver(), "mysql");
    }

    #[test]
    fn test_driver_override_wins() {
        let config = DataSourceConfig::new("m", "Maria", DatabaseKind::MySql, "mysql://h/db", "", "")
            .with_driver("mariadb");
        assert_eq!(config.effective_driver(), "mariadb");
        assert_eq!(
            DatabaseKind::from_driver(config.effective_driver()),
            Some(DatabaseKind::MySql)
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let config =
            DataSourceConfig::new("x", "X", DatabaseKind::Sqlite, "sqlite::memory:", "", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_deserialize_minimal_payload() {
        let json = r#"{"name":"Local","databaseType":"SQLITE","url":"sqlite::memory:"}"#;
        let config: DataSourceConfig = serde_json::from_str(json).unwrap();
        assert!(config.id.is_empty());
        assert!(config.active);
        assert_eq!(config.effective_driver(), "sqlite");
    }

    #[test]
    fn test_connection_settings_ignore_display_fields() {
        let a = DataSourceConfig::new("a", "A", DatabaseKind::Sqlite, "sqlite::memory:", "", "");
        let mut b = a.clone();
        b.name = "Renamed".to_string();
        b.active = false;
        assert!(a.same_connection_settings(&b));

        b.url = "sqlite://other.db".to_string();
        assert!(!a.same_connection_settings(&b));
    }
}

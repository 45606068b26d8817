use serde_derive::Deserialize;
use std::path::PathBuf;

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    5000
}

fn default_site_name() -> String {
    "Booking Directory".to_owned()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("directory.db")
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Logs go to stderr unless this is set.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Reads `name` (any format the `config` crate knows, extension optional)
    /// and lets `BOOKING_*` environment variables override it. A missing file
    /// is not an error.
    pub fn load(name: &str) -> Result<Settings, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(config::Environment::with_prefix("BOOKING").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "port = 8080\nsite_name = \"Fyyur\"\ndb_path = \"/var/lib/booking/directory.db\"\n",
        )
        .unwrap();

        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.listen_address(), "127.0.0.1:8080");
        assert_eq!(settings.site_name, "Fyyur");
        assert_eq!(
            settings.db_path,
            PathBuf::from("/var/lib/booking/directory.db")
        );
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.db_path, PathBuf::from("directory.db"));
    }
}

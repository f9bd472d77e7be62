//! Saved connection targets
//!
//! `ssd run --alias <name>` connects to the endpoint stored under that name
//! instead of resolving AWS credentials from the environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// How bucket names are placed in request URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketLookup {
    /// Path style, which every S3-compatible server accepts
    #[default]
    Auto,
    Path,
    /// Virtual-hosted style (`bucket.host`)
    Dns,
}

impl BucketLookup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Path => "path",
            Self::Dns => "dns",
        }
    }
}

impl FromStr for BucketLookup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "path" => Ok(Self::Path),
            "dns" => Ok(Self::Dns),
            other => Err(Error::Config(format!(
                "Bucket lookup must be 'auto', 'path', or 'dns', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for BucketLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named endpoint plus the static credentials used to sign requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Signing region; buckets outside us-east-1 get a location constraint
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub bucket_lookup: BucketLookup,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Alias {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
            bucket_lookup: BucketLookup::default(),
        }
    }

    /// Reject an empty name and endpoints that are not http(s) URLs
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("Alias name cannot be empty".into()));
        }

        let url = url::Url::parse(&self.endpoint)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Endpoint must use http or https: {}",
                self.endpoint
            )));
        }
        Ok(())
    }

    pub fn force_path_style(&self) -> bool {
        self.bucket_lookup != BucketLookup::Dns
    }
}

/// Reads and writes the aliases held in the config file
pub struct AliasManager {
    config_manager: ConfigManager,
}

impl AliasManager {
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Manager over the default config location
    pub fn new() -> Result<Self> {
        ConfigManager::new().map(Self::with_config_manager)
    }

    pub fn list(&self) -> Result<Vec<Alias>> {
        Ok(self.config_manager.load()?.aliases)
    }

    pub fn get(&self, name: &str) -> Result<Alias> {
        self.config_manager
            .load()?
            .aliases
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AliasNotFound(name.to_string()))
    }

    /// Store `alias`. An alias already saved under the same name is only
    /// overwritten when `replace` is set.
    pub fn save(&self, alias: Alias, replace: bool) -> Result<()> {
        alias.validate()?;
        let mut config = self.config_manager.load()?;

        match config.aliases.iter_mut().find(|a| a.name == alias.name) {
            Some(_) if !replace => return Err(Error::AliasExists(alias.name)),
            Some(existing) => *existing = alias,
            None => config.aliases.push(alias),
        }

        self.config_manager.save(&config)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let before = config.aliases.len();
        config.aliases.retain(|a| a.name != name);

        if config.aliases.len() == before {
            return Err(Error::AliasNotFound(name.to_string()));
        }
        self.config_manager.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, AliasManager) {
        let dir = TempDir::new().unwrap();
        let config = ConfigManager::with_path(dir.path().join("config.toml"));
        (dir, AliasManager::with_config_manager(config))
    }

    fn minio(endpoint: &str) -> Alias {
        Alias::new("minio", endpoint, "minioadmin", "minioadmin")
    }

    #[test]
    fn test_bucket_lookup_controls_path_style() {
        let mut alias = minio("http://localhost:9000");
        assert_eq!(alias.bucket_lookup, BucketLookup::Auto);
        assert!(alias.force_path_style());

        alias.bucket_lookup = "dns".parse().unwrap();
        assert!(!alias.force_path_style());

        let err = "virtual".parse::<BucketLookup>().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_endpoint_must_be_http_url() {
        assert!(minio("https://s3.example.com").validate().is_ok());
        assert!(matches!(
            minio("not a url").validate(),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            minio("ftp://host").validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_save_refuses_to_overwrite_without_replace() {
        let (_dir, manager) = manager();
        manager.save(minio("http://old:9000"), false).unwrap();

        let err = manager.save(minio("http://new:9000"), false).unwrap_err();
        assert!(matches!(err, Error::AliasExists(ref name) if name == "minio"));
        assert_eq!(manager.get("minio").unwrap().endpoint, "http://old:9000");

        manager.save(minio("http://new:9000"), true).unwrap();
        let aliases = manager.list().unwrap();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].endpoint, "http://new:9000");
    }

    #[test]
    fn test_invalid_alias_is_not_saved() {
        let (_dir, manager) = manager();
        assert!(manager.save(minio("not a url"), true).is_err());
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_remove_then_lookup_fails() {
        let (_dir, manager) = manager();
        manager.save(minio("http://localhost:9000"), false).unwrap();
        manager.remove("minio").unwrap();

        assert!(matches!(manager.get("minio"), Err(Error::AliasNotFound(_))));
        assert!(matches!(
            manager.remove("minio"),
            Err(Error::AliasNotFound(_))
        ));
    }

    #[test]
    fn test_lookup_style_round_trips_through_toml() {
        let mut alias = minio("http://localhost:9000");
        alias.bucket_lookup = BucketLookup::Path;
        let text = toml::to_string(&alias).unwrap();
        assert!(text.contains("bucket_lookup = \"path\""));

        let parsed: Alias = toml::from_str(
            "name = \"m\"\nendpoint = \"http://h\"\naccess_key = \"a\"\nsecret_key = \"s\"\n",
        )
        .unwrap();
        assert_eq!(parsed.bucket_lookup, BucketLookup::Auto);
        assert_eq!(parsed.region, "us-east-1");
    }
}

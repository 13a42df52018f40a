use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    model::{Category, MAX_FINGERPRINT_DECIMALS},
    query::SyntaxError,
};

/// A configuration that cannot be used for mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A path expression is malformed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Surface geometry cannot be fingerprinted at this precision.
    #[error("fingerprint_decimals must be at most {MAX_FINGERPRINT_DECIMALS}, got {0}")]
    FingerprintDecimals(u32),
}

/// Configuration for identifier correspondence.
///
/// This struct says where each object category lives in a model document and
/// tunes the matching tolerances. The defaults describe the RPD layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Paths locating zones.
    ///
    /// Surfaces are always read from the `surfaces` array of each zone.
    zone_paths: Vec<String>,

    /// Categories resolved by graph propagation, in diagnostic order.
    categories: Vec<CategoryConfig>,

    /// Field names that hold object references.
    ///
    /// If this is empty, any string equal to the id of another object is
    /// treated as a reference.
    reference_fields: Vec<String>,

    /// Decimal places kept when fingerprinting surface geometry.
    fingerprint_decimals: u32,

    /// Similarity scores closer than this are considered tied.
    tie_tolerance: f64,
}

/// Where the members of one object category are found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name, used in diagnostics.
    pub name: String,
    /// Path expressions locating the members.
    pub paths: Vec<String>,
}

impl CategoryConfig {
    fn new(name: &str, paths: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            paths: paths.iter().map(ToString::to_string).collect(),
        }
    }

    fn parse(&self) -> Result<Category, SyntaxError> {
        let paths = self
            .paths
            .iter()
            .map(|path| path.parse())
            .collect::<Result<_, _>>()?;
        Ok(Category::new(self.name.clone(), paths))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zone_paths: default_zone_paths(),
            categories: default_categories(),
            reference_fields: Vec::new(),
            fingerprint_decimals: default_fingerprint_decimals(),
            tie_tolerance: default_tie_tolerance(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the paths locating zones.
    #[must_use]
    pub fn zone_paths(&self) -> &[String] {
        &self.zone_paths
    }

    /// Returns the propagated categories.
    #[must_use]
    pub fn categories(&self) -> &[CategoryConfig] {
        &self.categories
    }

    /// Returns the configured reference field names.
    #[must_use]
    pub fn reference_fields(&self) -> &[String] {
        &self.reference_fields
    }

    /// Returns the number of decimals kept in surface fingerprints.
    #[must_use]
    pub const fn fingerprint_decimals(&self) -> u32 {
        self.fingerprint_decimals
    }

    /// Returns the score tolerance below which pairs are tied.
    #[must_use]
    pub const fn tie_tolerance(&self) -> f64 {
        self.tie_tolerance
    }

    /// Adds a category, or replaces the paths of an existing one.
    ///
    /// Returns `true` if the category was added, `false` if it replaced an
    /// existing entry.
    pub fn set_category(&mut self, name: &str, paths: &[&str]) -> bool {
        let category = CategoryConfig::new(name, paths);
        if let Some(existing) = self.categories.iter_mut().find(|c| c.name == name) {
            *existing = category;
            false
        } else {
            self.categories.push(category);
            true
        }
    }

    /// Removes a category.
    ///
    /// Returns `true` if the category was removed, `false` if it didn't exist.
    pub fn remove_category(&mut self, name: &str) -> bool {
        if let Some(pos) = self.categories.iter().position(|c| c.name == name) {
            self.categories.remove(pos);
            true
        } else {
            false
        }
    }

    /// Replaces the zone paths.
    pub fn set_zone_paths(&mut self, paths: &[&str]) {
        self.zone_paths = paths.iter().map(ToString::to_string).collect();
    }

    /// Sets the number of decimals kept in surface fingerprints.
    pub const fn set_fingerprint_decimals(&mut self, decimals: u32) {
        self.fingerprint_decimals = decimals;
    }

    /// Restricts reference detection to the given field names.
    pub fn set_reference_fields(&mut self, fields: Vec<String>) {
        self.reference_fields = fields;
    }

    /// Parses the zone paths.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyntaxError`] among the zone paths.
    pub fn parsed_zone_paths(&self) -> Result<Vec<crate::query::Path>, SyntaxError> {
        self.zone_paths.iter().map(|path| path.parse()).collect()
    }

    /// Parses the category paths.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyntaxError`] among the category paths.
    pub fn parsed_categories(&self) -> Result<Vec<Category>, SyntaxError> {
        self.categories.iter().map(CategoryConfig::parse).collect()
    }

    /// Checks every configured path expression and the fingerprint
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyntaxError`] found, or
    /// [`ConfigError::FingerprintDecimals`] if more than
    /// [`MAX_FINGERPRINT_DECIMALS`] decimals are requested.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fingerprint_decimals > MAX_FINGERPRINT_DECIMALS {
            return Err(ConfigError::FingerprintDecimals(self.fingerprint_decimals));
        }
        self.parsed_zone_paths()?;
        self.parsed_categories()?;
        Ok(())
    }
}

fn default_zone_paths() -> Vec<String> {
    vec!["$.buildings[*].building_segments[*].zones[*]".to_string()]
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "Terminals",
            &["$.buildings[*].building_segments[*].zones[*].terminals[*]"],
        ),
        CategoryConfig::new(
            "Systems",
            &["$.buildings[*].building_segments[*].heating_ventilating_air_conditioning_systems[*]"],
        ),
        CategoryConfig::new("Loops", &["$.fluid_loops[*]", "$.fluid_loops[*].child_loops[*]"]),
        CategoryConfig::new("Pumps", &["$.pumps[*]"]),
        CategoryConfig::new("Boilers", &["$.boilers[*]"]),
        CategoryConfig::new("Chillers", &["$.chillers[*]"]),
        CategoryConfig::new("HeatRejections", &["$.heat_rejections[*]"]),
        CategoryConfig::new("ExteriorLighting", &["$.exterior_lightings[*]"]),
    ]
}

const fn default_fingerprint_decimals() -> u32 {
    2
}

const fn default_tie_tolerance() -> f64 {
    1e-9
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_zone_paths")]
        zone_paths: Vec<String>,

        #[serde(default = "default_categories")]
        categories: Vec<CategoryConfig>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        reference_fields: Vec<String>,

        #[serde(default = "default_fingerprint_decimals")]
        fingerprint_decimals: u32,

        #[serde(default = "default_tie_tolerance")]
        tie_tolerance: f64,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                zone_paths,
                categories,
                reference_fields,
                fingerprint_decimals,
                tie_tolerance,
            } => Self {
                zone_paths,
                categories,
                reference_fields,
                fingerprint_decimals,
                tie_tolerance,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            zone_paths: config.zone_paths,
            categories: config.categories,
            reference_fields: config.reference_fields,
            fingerprint_decimals: config.fingerprint_decimals,
            tie_tolerance: config.tie_tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"_version = "1"
zone_paths = ["$.zones[*]"]
reference_fields = ["served_by"]
fingerprint_decimals = 3

[[categories]]
name = "Pumps"
paths = ["$.pumps[*]"]
"#,
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.zone_paths(), &["$.zones[*]".to_string()]);
        assert_eq!(config.categories().len(), 1);
        assert_eq!(config.categories()[0].name, "Pumps");
        assert_eq!(config.reference_fields(), &["served_by".to_string()]);
        assert_eq!(config.fingerprint_decimals(), 3);
        assert!((config.tie_tolerance() - 1e-9).abs() < f64::EPSILON);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nfingerprint_decimals = \"two\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rpd-match.toml");

        let mut config = Config::default();
        config.set_category("Pumps", &["$.plant.pumps[*]"]);
        config.set_reference_fields(vec!["loop_or_piping".to_string()]);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn default_paths_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn validate_reports_bad_paths() {
        let mut config = Config::default();
        assert!(config.set_category("Fans", &["$.fans["]));
        assert!(config.validate().is_err());
        assert!(config.remove_category("Fans"));
        assert!(!config.remove_category("Fans"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_bounds_fingerprint_decimals() {
        let mut config = Config::default();
        config.set_fingerprint_decimals(MAX_FINGERPRINT_DECIMALS);
        assert!(config.validate().is_ok());

        config.set_fingerprint_decimals(19);
        assert_eq!(config.validate(), Err(ConfigError::FingerprintDecimals(19)));
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "fingerprint_decimals must be at most 9, got 19"
        );
    }
}

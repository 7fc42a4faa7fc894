use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use maskforge_core::{ChipOutline, JoinStyle};
use maskforge_resolve::config::{
    DEFAULT_DEVICE_CD_COMPENSATION, DEFAULT_DEVICE_ISOLATION, DEFAULT_HANDLE_CD_COMPENSATION,
    DEFAULT_HANDLE_ISOLATION,
};
use maskforge_resolve::{IsolationTable, ResolveConfig};

pub const DEFAULT_CHIP_SIZE: f64 = 6000.0;
pub const DEFAULT_OUTPUT_PREFIX: &str = "mega_2d";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Which of the two written artifacts a file name is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStage {
    /// The raw tagged device, before resolution.
    Source,
    /// The resolved, compensated mask.
    Build,
}

impl fmt::Display for ArtifactStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStage::Source => write!(f, "SOURCE"),
            ArtifactStage::Build => write!(f, "BUILD"),
        }
    }
}

/// Per-build settings, read from a JSON file next to the device sources.
///
/// Only `version` is required; everything else falls back to the standard
/// process values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub version: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default = "default_true")]
    pub merge_device_patterns: bool,
    #[serde(default = "default_device_compensation")]
    pub device_cd_compensation: f64,
    #[serde(default = "default_handle_compensation")]
    pub handle_cd_compensation: f64,
    /// Per-priority device clearance.
    #[serde(default = "default_device_isolation")]
    pub device_isolation: IsolationTable,
    /// Handle border width, shared by every handle tier.
    #[serde(default = "default_handle_isolation")]
    pub handle_isolation: f64,
    /// Side of the square chip, um.
    #[serde(default = "default_chip_size")]
    pub chip_size: f64,
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    /// Corner treatment of halos, borders and CD offsets.
    #[serde(default)]
    pub join_style: JoinStyle,
}

fn default_true() -> bool {
    true
}

fn default_device_compensation() -> f64 {
    DEFAULT_DEVICE_CD_COMPENSATION
}

fn default_handle_compensation() -> f64 {
    DEFAULT_HANDLE_CD_COMPENSATION
}

fn default_device_isolation() -> IsolationTable {
    IsolationTable::uniform(DEFAULT_DEVICE_ISOLATION)
}

fn default_handle_isolation() -> f64 {
    DEFAULT_HANDLE_ISOLATION
}

fn default_chip_size() -> f64 {
    DEFAULT_CHIP_SIZE
}

fn default_output_prefix() -> String {
    DEFAULT_OUTPUT_PREFIX.to_string()
}

impl BuildSettings {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            hash: String::new(),
            merge_device_patterns: true,
            device_cd_compensation: DEFAULT_DEVICE_CD_COMPENSATION,
            handle_cd_compensation: DEFAULT_HANDLE_CD_COMPENSATION,
            device_isolation: default_device_isolation(),
            handle_isolation: DEFAULT_HANDLE_ISOLATION,
            chip_size: DEFAULT_CHIP_SIZE,
            output_prefix: default_output_prefix(),
            join_style: JoinStyle::Miter,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded build settings for version {} from {}",
            settings.version,
            path.display()
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks what the resolver cannot: the version string and the chip
    /// size. Isolation and compensation are checked by the pipeline.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.version.trim().is_empty() {
            return Err(SettingsError::Invalid("version must not be empty".to_string()));
        }
        if !self.chip_outline().is_valid() {
            return Err(SettingsError::Invalid(format!(
                "chip size {} must be positive",
                self.chip_size
            )));
        }
        Ok(())
    }

    pub fn resolve_config(&self) -> ResolveConfig {
        ResolveConfig::default()
            .with_merge(self.merge_device_patterns)
            .with_compensation(self.device_cd_compensation, self.handle_cd_compensation)
            .with_device_isolation(self.device_isolation)
            .with_handle_isolation(IsolationTable::uniform(self.handle_isolation))
            .with_join(self.join_style)
    }

    pub fn chip_outline(&self) -> ChipOutline {
        ChipOutline::square(self.chip_size)
    }

    /// The text engraved on the chip: version, short hash and build date.
    pub fn version_label(&self, date: &str) -> String {
        let short: String = self.hash.chars().take(7).collect();
        format!("Ver {}\n{}\n{}", self.version, short, date)
    }

    pub fn artifact_name(&self, stage: ArtifactStage) -> String {
        format!("{}_{}_{}.gds", self.output_prefix, self.version, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskforge_core::Priority;

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = BuildSettings::from_json(r#"{"version": "3.1"}"#).unwrap();
        assert_eq!(settings, BuildSettings::new("3.1"));
        assert_eq!(settings.chip_size, 6000.0);
        assert_eq!(settings.handle_isolation, 50.0);
        assert!((settings.device_cd_compensation - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_missing_version_rejected() {
        assert!(matches!(
            BuildSettings::from_json(r#"{"chip_size": 6000}"#),
            Err(SettingsError::Json(_))
        ));
        assert!(matches!(
            BuildSettings::from_json(r#"{"version": " "}"#),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_chip_size_rejected() {
        let err = BuildSettings::from_json(r#"{"version": "1", "chip_size": -10}"#).unwrap_err();
        assert!(err.to_string().contains("-10"));
    }

    #[test]
    fn test_isolation_table_from_json() {
        let json = r#"{
            "version": "2",
            "device_isolation": [1, 2, 3, 4, 5, 6, 7, 8],
            "handle_isolation": 40,
            "merge_device_patterns": false,
            "join_style": "round"
        }"#;
        let settings = BuildSettings::from_json(json).unwrap();
        let config = settings.resolve_config();
        assert_eq!(config.device_isolation.get(Priority::new(7).unwrap()), 8.0);
        assert_eq!(config.handle_isolation.get(Priority::HIGHEST), 40.0);
        assert!(!config.merge_device_patterns);
        assert_eq!(config.join, JoinStyle::Round);
    }

    #[test]
    fn test_version_label_and_artifacts() {
        let mut settings = BuildSettings::new("4.2");
        settings.hash = "0123456789abcdef".to_string();
        assert_eq!(settings.version_label("2024-05-01"), "Ver 4.2\n0123456\n2024-05-01");
        assert_eq!(
            settings.artifact_name(ArtifactStage::Source),
            "mega_2d_4.2_SOURCE.gds"
        );
        assert_eq!(
            settings.artifact_name(ArtifactStage::Build),
            "mega_2d_4.2_BUILD.gds"
        );
    }

    #[test]
    fn test_short_hash_kept_whole() {
        let mut settings = BuildSettings::new("1");
        settings.hash = "abc".to_string();
        assert_eq!(settings.version_label("d"), "Ver 1\nabc\nd");
    }

    #[test]
    fn test_json_round_trip_preserves_overrides() {
        let mut settings = BuildSettings::new("5");
        settings.handle_cd_compensation = -0.5;
        let back = BuildSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back, settings);
    }
}

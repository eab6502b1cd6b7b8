//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use formgrade_common::{Error, FieldType, Result};

/// Harness configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    /// Observation timing
    pub timing: TimingConfig,

    /// Form structure requirements
    pub structure: StructureConfig,

    /// Report output
    pub report: ReportConfig,

    /// Values typed into fields during a journey
    pub samples: SampleValues,
}

/// Observation timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between observation polls
    pub poll_interval_ms: u64,

    /// Default observation timeout
    pub observe_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            observe_timeout_ms: 5000,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn observe_timeout(&self) -> Duration {
        Duration::from_millis(self.observe_timeout_ms)
    }
}

/// Form structure requirements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Minimum number of input/select/textarea elements
    pub min_controls: Option<usize>,
}

/// Report output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving `grade-report.json`
    pub output_dir: Option<PathBuf>,
}

/// Journey fill values per field type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleValues {
    pub text: String,
    pub email: String,
    pub number: String,
    pub password: String,
    pub tel: String,
}

impl Default for SampleValues {
    fn default() -> Self {
        Self {
            text: "test".to_string(),
            email: "test@example.com".to_string(),
            number: "25".to_string(),
            password: "password123".to_string(),
            tel: "+1234567890".to_string(),
        }
    }
}

impl SampleValues {
    /// Value to type into a field of the given type
    pub fn for_type(&self, field_type: &FieldType) -> &str {
        match field_type {
            FieldType::Email => &self.email,
            FieldType::Number => &self.number,
            FieldType::Password => &self.password,
            FieldType::Tel => &self.tel,
            _ => &self.text,
        }
    }
}

impl GraderConfig {
    /// Load configuration from file, defaulting when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
                path: path.display().to_string(),
                source,
            })?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GraderConfig::load(&dir.path().join("formgrade.toml")).unwrap();
        assert_eq!(config, GraderConfig::default());
        assert_eq!(config.timing.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.timing.observe_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[timing]\nobserve_timeout_ms = 200\n\n[structure]\nmin_controls = 4\n\n[samples]\nemail = \"qa@example.org\""
        )
        .unwrap();

        let config = GraderConfig::load(file.path()).unwrap();
        assert_eq!(config.timing.observe_timeout_ms, 200);
        assert_eq!(config.timing.poll_interval_ms, 50);
        assert_eq!(config.structure.min_controls, Some(4));
        assert_eq!(config.samples.for_type(&FieldType::Email), "qa@example.org");
        assert_eq!(config.samples.for_type(&FieldType::Tel), "+1234567890");
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timing\npoll_interval_ms = ").unwrap();
        assert!(matches!(
            GraderConfig::load(file.path()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_samples_fall_back_to_text() {
        let samples = SampleValues::default();
        assert_eq!(samples.for_type(&FieldType::Textarea), "test");
        assert_eq!(samples.for_type(&FieldType::Other("url".to_string())), "test");
        assert_eq!(samples.for_type(&FieldType::Number), "25");
    }
}

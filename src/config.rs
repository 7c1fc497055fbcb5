use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Top-level configuration, loaded from YAML.
///
/// Every field has a default, so an empty document is a valid configuration
/// that reproduces the stock simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Ordered catalog of vessel image references. Only length and position
    /// matter to the core; the render surface resolves the entries.
    #[serde(default = "Configuration::default_catalog")]
    pub vessel_catalog: Vec<String>,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub toast: ToastConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetectionConfig {
    /// South-west corner of the surveillance bounding box.
    #[serde(default = "DetectionConfig::default_lat_origin")]
    pub lat_origin: f64,
    #[serde(default = "DetectionConfig::default_lng_origin")]
    pub lng_origin: f64,

    /// Extent of the box; points land in `[origin, origin + span)`.
    #[serde(default = "DetectionConfig::default_span")]
    pub lat_span: f64,
    #[serde(default = "DetectionConfig::default_span")]
    pub lng_span: f64,

    /// How many recent selections the image picker refuses to repeat.
    #[serde(default = "DetectionConfig::default_avoid_last")]
    pub avoid_last: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Bounds for the randomized delay between detections, inclusive.
    #[serde(with = "humantime_serde", default = "SchedulerConfig::default_min_interval")]
    pub min_interval: Duration,
    #[serde(with = "humantime_serde", default = "SchedulerConfig::default_max_interval")]
    pub max_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToastConfig {
    /// How long the alert stays up after its latest (re)appearance.
    #[serde(with = "humantime_serde", default = "ToastConfig::default_duration")]
    pub duration: Duration,
}

impl Configuration {
    fn default_catalog() -> Vec<String> {
        (1..=6).map(|n| format!("/boat{n}.jpg")).collect()
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: Configuration = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.vessel_catalog.is_empty(),
            "vessel-catalog must contain at least one entry"
        );
        ensure!(
            self.detection.lat_span >= 0.0 && self.detection.lng_span >= 0.0,
            "detection spans must be non-negative"
        );
        ensure!(
            self.scheduler.min_interval <= self.scheduler.max_interval,
            "scheduler.min-interval must not exceed scheduler.max-interval"
        );
        ensure!(
            !self.scheduler.max_interval.is_zero(),
            "scheduler.max-interval must be positive"
        );
        ensure!(
            !self.toast.duration.is_zero(),
            "toast.duration must be positive"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            vessel_catalog: Self::default_catalog(),
            detection: DetectionConfig::default(),
            scheduler: SchedulerConfig::default(),
            toast: ToastConfig::default(),
        }
    }
}

impl DetectionConfig {
    const fn default_lat_origin() -> f64 {
        18.9
    }
    const fn default_lng_origin() -> f64 {
        72.8
    }
    const fn default_span() -> f64 {
        0.2
    }
    const fn default_avoid_last() -> usize {
        1
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            lat_origin: Self::default_lat_origin(),
            lng_origin: Self::default_lng_origin(),
            lat_span: Self::default_span(),
            lng_span: Self::default_span(),
            avoid_last: Self::default_avoid_last(),
        }
    }
}

impl SchedulerConfig {
    const fn default_min_interval() -> Duration {
        Duration::from_secs(5)
    }
    const fn default_max_interval() -> Duration {
        Duration::from_secs(10)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval: Self::default_min_interval(),
            max_interval: Self::default_max_interval(),
        }
    }
}

impl ToastConfig {
    const fn default_duration() -> Duration {
        Duration::from_secs(5)
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            duration: Self::default_duration(),
        }
    }
}

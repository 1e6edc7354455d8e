//! Application configuration.
//!
//! Settings come from a TOML file (`cellzone.toml`) where every field has a
//! default, then environment variables override individual values:
//!
//! - `CELLZONE_PRODUCER_URL`: producer base URL
//! - `CELLZONE_KPI_URL`: KPI service base URL
//! - `CELLZONE_SILENCE_TIMEOUT_SECS`: seconds without a snapshot before the
//!   stream is reported silent
//! - `CELLZONE_RECONNECT`: `true`/`false`
//! - `CELLZONE_QUALITY_CONFIG`: path to a quality configuration TOML file
//! - `HOST`, `PORT`: server bind address

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, VizError, VizResult};
use crate::geometry::SurfaceSize;
use crate::quality::QualityConfig;
use crate::render::RenderStyle;
use crate::stream::{ClientOptions, CLUSTER_UPDATE_EVENT};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub producer: ProducerSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub server: ServerSettings,
    /// Separate quality ladder/palette file; built-in values when absent.
    #[serde(default)]
    pub quality_config: Option<PathBuf>,
}

/// Where snapshots and KPIs come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_event_name")]
    pub event_name: String,
    #[serde(default = "default_kpi_url")]
    pub kpi_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_kpi_timeout")]
    pub kpi_timeout_secs: u64,
}

/// Stream client behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "default_silence_timeout")]
    pub silence_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub reconnect: bool,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
    /// Consecutive failed connects before giving up; unlimited when absent.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default = "default_grid_divisions")]
    pub grid_divisions: u32,
    #[serde(default = "default_centroid_radius")]
    pub centroid_radius: f64,
    #[serde(default = "default_point_radius")]
    pub point_radius: f64,
    #[serde(default = "default_hull_fill_alpha")]
    pub hull_fill_alpha: u8,
    #[serde(default = "default_hit_radius")]
    pub hit_radius: f64,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_true")]
    pub show_points: bool,
    #[serde(default = "default_true")]
    pub show_overlay: bool,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default = "default_true")]
    pub show_kpi_panels: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/adb".to_string()
}

fn default_event_name() -> String {
    CLUSTER_UPDATE_EVENT.to_string()
}

fn default_kpi_url() -> String {
    "http://localhost:8080/api/clustering".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_kpi_timeout() -> u64 {
    30
}

fn default_silence_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_max_secs() -> u64 {
    60
}

fn default_width() -> f64 {
    800.0
}

fn default_height() -> f64 {
    600.0
}

fn default_padding() -> f64 {
    40.0
}

fn default_grid_divisions() -> u32 {
    10
}

fn default_centroid_radius() -> f64 {
    8.0
}

fn default_point_radius() -> f64 {
    3.0
}

fn default_hull_fill_alpha() -> u8 {
    0x20
}

fn default_hit_radius() -> f64 {
    12.0
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            event_name: default_event_name(),
            kpi_url: default_kpi_url(),
            connect_timeout_secs: default_connect_timeout(),
            kpi_timeout_secs: default_kpi_timeout(),
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            silence_timeout_secs: default_silence_timeout(),
            reconnect: true,
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_secs: default_backoff_max_secs(),
            max_attempts: None,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
            grid_divisions: default_grid_divisions(),
            centroid_radius: default_centroid_radius(),
            point_radius: default_point_radius(),
            hull_fill_alpha: default_hull_fill_alpha(),
            hit_radius: default_hit_radius(),
            show_grid: true,
            show_points: true,
            show_overlay: true,
            show_legend: true,
            show_kpi_panels: true,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// `VizError::Configuration` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> VizResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VizError::configuration_with_context(
                format!("Failed to read config file: {}", e),
                ErrorContext::new("load_config").with_details(path.display().to_string()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> VizResult<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| VizError::configuration(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the stream client cannot run with.
    pub fn validate(&self) -> VizResult<()> {
        if self.stream.silence_timeout_secs == 0 {
            return Err(VizError::configuration_with_context(
                "silence_timeout_secs must be at least 1",
                ErrorContext::new("validate_config").with_entity_id("silence_timeout_secs"),
            ));
        }
        Ok(())
    }

    /// First `cellzone.toml` found in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn find_default_location() -> Option<PathBuf> {
        [
            PathBuf::from("cellzone.toml"),
            PathBuf::from("backend/cellzone.toml"),
            PathBuf::from("../cellzone.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load configuration from the default location.
    pub fn from_default_location() -> VizResult<Self> {
        match Self::find_default_location() {
            Some(path) => Self::from_file(path),
            None => Err(VizError::configuration(
                "No cellzone.toml found in standard locations",
            )),
        }
    }

    /// Default-location file if there is one, built-in defaults otherwise,
    /// then environment overrides.
    pub fn load() -> VizResult<Self> {
        Self::load_from(Self::find_default_location())
    }

    /// `path` if given, built-in defaults otherwise, then environment
    /// overrides. A file that exists but does not read or parse is an error.
    pub fn load_from(path: Option<PathBuf>) -> VizResult<Self> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::info!("No cellzone.toml found; using defaults");
                Self::default()
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    /// `VizError::Configuration` when a numeric or boolean variable does not
    /// parse.
    pub fn apply_env(&mut self) -> VizResult<()> {
        if let Ok(url) = env::var("CELLZONE_PRODUCER_URL") {
            self.producer.base_url = url;
        }
        if let Ok(url) = env::var("CELLZONE_KPI_URL") {
            self.producer.kpi_url = url;
        }
        if let Some(secs) = parse_env::<u64>("CELLZONE_SILENCE_TIMEOUT_SECS")? {
            self.stream.silence_timeout_secs = secs;
        }
        if let Some(reconnect) = parse_env::<bool>("CELLZONE_RECONNECT")? {
            self.stream.reconnect = reconnect;
        }
        if let Ok(path) = env::var("CELLZONE_QUALITY_CONFIG") {
            self.quality_config = Some(PathBuf::from(path));
        }
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env::<u16>("PORT")? {
            self.server.port = port;
        }
        self.validate()
    }

    /// The configured quality file, or the built-in ladders and schemes.
    pub fn quality(&self) -> VizResult<QualityConfig> {
        match self.quality_config.as_ref() {
            Some(path) => QualityConfig::from_file(path),
            None => Ok(QualityConfig::default()),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            event_name: self.producer.event_name.clone(),
            silence_timeout: Duration::from_secs(self.stream.silence_timeout_secs),
            reconnect: self.stream.reconnect,
            backoff_base: Duration::from_millis(self.stream.backoff_base_ms),
            backoff_max: Duration::from_secs(self.stream.backoff_max_secs),
            max_attempts: self.stream.max_attempts,
            ..ClientOptions::default()
        }
    }

    pub fn render_style(&self) -> RenderStyle {
        let r = &self.render;
        RenderStyle {
            size: SurfaceSize::new(r.width, r.height),
            padding: r.padding,
            grid_divisions: r.grid_divisions,
            centroid_radius: r.centroid_radius,
            point_radius: r.point_radius,
            hull_fill_alpha: r.hull_fill_alpha,
            hit_radius: r.hit_radius,
            show_grid: r.show_grid,
            show_points: r.show_points,
            show_overlay: r.show_overlay,
            show_legend: r.show_legend,
            show_kpi_panels: r.show_kpi_panels,
            ..RenderStyle::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.producer.connect_timeout_secs)
    }

    pub fn kpi_timeout(&self) -> Duration {
        Duration::from_secs(self.producer.kpi_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> VizResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            VizError::configuration_with_context(
                format!("{} has an invalid value '{}'", key, raw),
                ErrorContext::new("apply_env").with_entity_id(key),
            )
        }),
        Err(_) => Ok(None),
    }
}

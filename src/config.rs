use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use diffdrive_kinematics::{DifferentialDrive, KinematicsError};
use serde::Deserialize;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CONFIG_PATH_ENV: &str = "ODOMETRY_CONFIG";
const ENV_PREFIX: &str = "ODOMETRY";

/// Drivetrain parameters, read once at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KinematicsSettings {
    pub wheel_distance: f64,
    pub axial_distance: f64,
    pub alpha: f64,
}

impl Default for KinematicsSettings {
    fn default() -> Self {
        KinematicsSettings {
            wheel_distance: 1.0,
            axial_distance: 1.0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OdometrySettings {
    /// Integration and publish rate.
    pub rate_hz: f64,
    pub frame_id: String,
    pub child_frame_id: String,
    /// Outlet buffer depth before slow subscribers start lagging.
    pub topic_capacity: usize,
}

impl Default for OdometrySettings {
    fn default() -> Self {
        OdometrySettings {
            rate_hz: 10.0,
            frame_id: "odom".to_string(),
            child_frame_id: "base_footprint".to_string(),
            topic_capacity: 50,
        }
    }
}

/// Simulated motor controller that stands in for a real wheel-speed feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub enabled: bool,
    pub right: f64,
    pub left: f64,
    pub rate_hz: f64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            enabled: true,
            right: 0.0,
            left: 0.0,
            rate_hz: 20.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub kinematics: KinematicsSettings,
    pub odometry: OdometrySettings,
    pub source: SourceSettings,
}

impl Settings {
    /// Builds the kinematic model, failing on degenerate parameters.
    pub fn kinematics(&self) -> Result<DifferentialDrive, KinematicsError> {
        DifferentialDrive::new(
            self.kinematics.wheel_distance,
            self.kinematics.axial_distance,
            self.kinematics.alpha,
        )
    }

    pub fn tick_period(&self) -> Result<Duration, ConfigError> {
        period_from_rate("odometry.rate_hz", self.odometry.rate_hz)
    }

    pub fn source_period(&self) -> Result<Duration, ConfigError> {
        period_from_rate("source.rate_hz", self.source.rate_hz)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.tick_period()?;
        if self.source.enabled {
            self.source_period()?;
        }
        if self.odometry.topic_capacity == 0 {
            return Err(ConfigError::Message(
                "odometry.topic_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Period of a loop running at `rate_hz`.
///
/// Fails unless the rate is positive and finite and its period is
/// representable and non-zero.
pub fn period_from_rate(key: &str, rate_hz: f64) -> Result<Duration, ConfigError> {
    let period = if rate_hz.is_finite() && rate_hz > 0.0 {
        Duration::try_from_secs_f64(1.0 / rate_hz).ok()
    } else {
        None
    };
    match period {
        Some(period) if !period.is_zero() => Ok(period),
        _ => Err(ConfigError::Message(format!(
            "{} must be a positive, finite rate with a non-zero period (got {})",
            key, rate_hz
        ))),
    }
}

/// Picks the override file from `--config <path>`, then `ODOMETRY_CONFIG`.
pub fn config_path_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    select_config_path(args, std::env::var_os(CONFIG_PATH_ENV))
}

fn select_config_path<I>(args: I, from_env: Option<OsString>) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    from_env.map(PathBuf::from)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Loads settings from `config/default.toml` (optional), the override file
/// (required when given) and `ODOMETRY__SECTION__KEY` environment variables.
pub fn load_config(override_path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", DEFAULT_CONFIG_PATH);

    let builder = layered_builder(
        Path::new(DEFAULT_CONFIG_PATH),
        override_path.as_deref(),
        environment(),
    );

    match build_settings(builder) {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

/// Sources, lowest priority first: the defaults file, the override file,
/// then the environment.
fn layered_builder(
    default_path: &Path,
    override_path: Option<&Path>,
    env: Environment,
) -> ConfigBuilder<DefaultState> {
    let mut builder = Config::builder()
        .add_source(File::from(default_path).format(FileFormat::Toml).required(false));
    if let Some(path) = override_path {
        info!(path = %path.display(), "Layering configuration override");
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }
    builder.add_source(env)
}

fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
fn settings_from_toml(toml: &str) -> Result<Settings, ConfigError> {
    build_settings(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
}

//! Agent configuration loaded from environment variables.
//!
//! Parsed and validated once at startup; the resulting [`AgentConfig`] is
//! immutable and handed to each component explicitly.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use snowcheck_core::detection::DetectionThresholds;
use snowcheck_core::geometry::{Polygon, MAX_COORDINATE, MIN_POLYGON_POINTS};

use crate::error::ConfigError;

/// Default HTTP timeout applied to both the camera fetch and the hub report.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Camera snapshot endpoint and its digest-auth credentials.
#[derive(Clone)]
pub struct CameraConfig {
    pub url: Url,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for CameraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Home-automation hub the detection result is pushed to.
#[derive(Clone)]
pub struct HubConfig {
    /// Base URL without a trailing slash, e.g. `http://homeassistant:8123`.
    pub base_url: String,
    pub token: String,
    pub entity_id: String,
}

impl HubConfig {
    /// Full URL of the entity state endpoint.
    pub fn state_url(&self) -> String {
        format!("{}/api/states/{}", self.base_url, self.entity_id)
    }
}

impl fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

/// Full agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Persist debug artifacts for every cycle.
    pub snapshot_logging: bool,
    /// Skip the hub report step.
    pub dry_run: bool,
    /// Artifact directory. Always `Some` when `snapshot_logging` is set.
    pub snapshot_dir: Option<PathBuf>,
    pub camera: CameraConfig,
    pub polygon: Polygon,
    pub thresholds: DetectionThresholds,
    pub hub: HubConfig,
    pub check_interval: Duration,
    pub http_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Required             | Default |
    /// |----------------------------|----------------------|---------|
    /// | `SNAPSHOT_LOGGING_ENABLED` | no                   | `false` |
    /// | `DRY_RUN_SKIP_HA_UPDATE`   | no                   | `false` |
    /// | `SNAPSHOT_DIR`             | if logging enabled   | --      |
    /// | `SNAPSHOT_URL`             | yes                  | --      |
    /// | `SNAPSHOT_URL_USERNAME`    | yes                  | --      |
    /// | `SNAPSHOT_URL_PASSWORD`    | yes                  | --      |
    /// | `POLYGON_POINTS`           | yes                  | --      |
    /// | `BRIGHTNESS_THRESHOLD`     | yes                  | --      |
    /// | `SNOW_RATIO_THRESHOLD`     | yes                  | --      |
    /// | `HA_URL`                   | yes                  | --      |
    /// | `HA_TOKEN`                 | yes                  | --      |
    /// | `HA_ENTITY_ID`             | yes                  | --      |
    /// | `CHECK_INTERVAL_MINUTES`   | yes                  | --      |
    /// | `HTTP_TIMEOUT_SECS`        | no                   | `30`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let snapshot_logging = env.flag("SNAPSHOT_LOGGING_ENABLED")?;
        let dry_run = env.flag("DRY_RUN_SKIP_HA_UPDATE")?;

        let snapshot_dir = match env.optional("SNAPSHOT_DIR") {
            Some(dir) => Some(PathBuf::from(dir)),
            None if snapshot_logging => return Err(ConfigError::Missing("SNAPSHOT_DIR")),
            None => None,
        };

        let camera = CameraConfig {
            url: env.url("SNAPSHOT_URL")?,
            username: env.required("SNAPSHOT_URL_USERNAME")?,
            password: env.required("SNAPSHOT_URL_PASSWORD")?,
        };

        let polygon = parse_polygon(&env.required("POLYGON_POINTS")?)?;

        let brightness: u8 = env.required("BRIGHTNESS_THRESHOLD")?.parse().map_err(|_| {
            ConfigError::Invalid {
                var: "BRIGHTNESS_THRESHOLD",
                reason: "must be an integer between 0 and 255".into(),
            }
        })?;

        let snow_ratio = env.number("SNOW_RATIO_THRESHOLD")?;
        if !(0.0..=1.0).contains(&snow_ratio) {
            return Err(ConfigError::Invalid {
                var: "SNOW_RATIO_THRESHOLD",
                reason: format!("must be between 0 and 1 (got {snow_ratio})"),
            });
        }

        let hub = HubConfig {
            base_url: env
                .url("HA_URL")?
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            token: env.required("HA_TOKEN")?,
            entity_id: env.required("HA_ENTITY_ID")?,
        };

        let minutes = env.number("CHECK_INTERVAL_MINUTES")?;
        let check_interval = Duration::try_from_secs_f64(minutes * 60.0)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| ConfigError::Invalid {
                var: "CHECK_INTERVAL_MINUTES",
                reason: format!("must be a positive number of minutes (got {minutes})"),
            })?;

        let http_timeout_secs = match env.optional("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "HTTP_TIMEOUT_SECS",
                    reason: "must be a positive integer".into(),
                })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            snapshot_logging,
            dry_run,
            snapshot_dir,
            camera,
            polygon,
            thresholds: DetectionThresholds {
                brightness,
                snow_ratio,
            },
            hub,
            check_interval,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// Parse `POLYGON_POINTS` (`[[x, y], ...]`).
fn parse_polygon(raw: &str) -> Result<Polygon, ConfigError> {
    let polygon: Polygon = serde_json::from_str(raw).map_err(|e| ConfigError::Invalid {
        var: "POLYGON_POINTS",
        reason: format!("expected a JSON array of [x, y] pairs: {e}"),
    })?;

    if !polygon.in_range() {
        return Err(ConfigError::Invalid {
            var: "POLYGON_POINTS",
            reason: format!("coordinates must lie within ±{MAX_COORDINATE}"),
        });
    }

    let distinct = polygon.open_ring().len();
    if distinct < MIN_POLYGON_POINTS {
        return Err(ConfigError::Invalid {
            var: "POLYGON_POINTS",
            reason: format!(
                "at least {MIN_POLYGON_POINTS} distinct points are required (got {distinct})"
            ),
        });
    }

    Ok(polygon)
}

/// Thin wrapper giving typed accessors over a key lookup.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, with blank treated as unset.
    fn optional(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing(var))
    }

    fn flag(&self, var: &'static str) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(var) else {
            return Ok(false);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                reason: format!("expected true or false (got '{raw}')"),
            }),
        }
    }

    fn number(&self, var: &'static str) -> Result<f64, ConfigError> {
        self.required(var)?
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ConfigError::Invalid {
                var,
                reason: "must be a number".into(),
            })
    }

    fn url(&self, var: &'static str) -> Result<Url, ConfigError> {
        let raw = self.required(var)?;
        let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid {
                var,
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SNAPSHOT_URL", "http://camera.local/cgi-bin/snapshot.cgi".to_string()),
            ("SNAPSHOT_URL_USERNAME", "viewer".to_string()),
            ("SNAPSHOT_URL_PASSWORD", "hunter2".to_string()),
            ("POLYGON_POINTS", "[[10,10],[200,10],[200,120],[10,120]]".to_string()),
            ("BRIGHTNESS_THRESHOLD", "180".to_string()),
            ("SNOW_RATIO_THRESHOLD", "0.12".to_string()),
            ("HA_URL", "http://homeassistant.local:8123/".to_string()),
            ("HA_TOKEN", "secret-token".to_string()),
            ("HA_ENTITY_ID", "input_boolean.driveway_snow".to_string()),
            ("CHECK_INTERVAL_MINUTES", "15".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<AgentConfig, ConfigError> {
        AgentConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn minimal_environment_parses() {
        let config = load(&base_env()).unwrap();

        assert!(!config.snapshot_logging);
        assert!(!config.dry_run);
        assert_eq!(config.snapshot_dir, None);
        assert_eq!(config.polygon.len(), 4);
        assert_eq!(config.thresholds.brightness, 180);
        assert_eq!(config.thresholds.snow_ratio, 0.12);
        assert_eq!(config.check_interval, Duration::from_secs(15 * 60));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn hub_state_url_has_no_double_slash() {
        let config = load(&base_env()).unwrap();
        assert_eq!(
            config.hub.state_url(),
            "http://homeassistant.local:8123/api/states/input_boolean.driveway_snow"
        );
    }

    #[test]
    fn fractional_interval_supported() {
        let mut env = base_env();
        env.insert("CHECK_INTERVAL_MINUTES", "0.5".into());
        assert_eq!(load(&env).unwrap().check_interval, Duration::from_secs(30));
    }

    #[test]
    fn missing_required_variable_reported_by_name() {
        let mut env = base_env();
        env.remove("HA_TOKEN");
        assert_matches!(load(&env), Err(ConfigError::Missing("HA_TOKEN")));
    }

    #[test]
    fn blank_value_treated_as_missing() {
        let mut env = base_env();
        env.insert("SNAPSHOT_URL", "   ".into());
        assert_matches!(load(&env), Err(ConfigError::Missing("SNAPSHOT_URL")));
    }

    #[test]
    fn snapshot_dir_required_only_when_logging() {
        let mut env = base_env();
        env.insert("SNAPSHOT_LOGGING_ENABLED", "true".into());
        assert_matches!(load(&env), Err(ConfigError::Missing("SNAPSHOT_DIR")));

        env.insert("SNAPSHOT_DIR", "/var/lib/snowcheck".into());
        let config = load(&env).unwrap();
        assert!(config.snapshot_logging);
        assert_eq!(config.snapshot_dir, Some(PathBuf::from("/var/lib/snowcheck")));
    }

    #[test]
    fn flags_accept_common_spellings() {
        let mut env = base_env();
        env.insert("DRY_RUN_SKIP_HA_UPDATE", "TRUE".into());
        assert!(load(&env).unwrap().dry_run);

        env.insert("DRY_RUN_SKIP_HA_UPDATE", "0".into());
        assert!(!load(&env).unwrap().dry_run);

        env.insert("DRY_RUN_SKIP_HA_UPDATE", "maybe".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "DRY_RUN_SKIP_HA_UPDATE",
                ..
            })
        );
    }

    #[test]
    fn brightness_out_of_range_rejected() {
        let mut env = base_env();
        env.insert("BRIGHTNESS_THRESHOLD", "256".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "BRIGHTNESS_THRESHOLD",
                ..
            })
        );

        env.insert("BRIGHTNESS_THRESHOLD", "-1".into());
        assert!(load(&env).is_err());
    }

    #[test]
    fn non_numeric_ratio_rejected_instead_of_nan() {
        for bad in ["abc", "NaN", "1.5", "-0.1"] {
            let mut env = base_env();
            env.insert("SNOW_RATIO_THRESHOLD", bad.into());
            assert_matches!(
                load(&env),
                Err(ConfigError::Invalid {
                    var: "SNOW_RATIO_THRESHOLD",
                    ..
                }),
                "value {bad}"
            );
        }
    }

    #[test]
    fn non_positive_interval_rejected() {
        for bad in ["0", "-5", "inf"] {
            let mut env = base_env();
            env.insert("CHECK_INTERVAL_MINUTES", bad.into());
            assert_matches!(
                load(&env),
                Err(ConfigError::Invalid {
                    var: "CHECK_INTERVAL_MINUTES",
                    ..
                }),
                "value {bad}"
            );
        }
    }

    #[test]
    fn polygon_needs_three_points() {
        let mut env = base_env();
        env.insert("POLYGON_POINTS", "[[0,0],[5,5]]".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "POLYGON_POINTS",
                ..
            })
        );
    }

    #[test]
    fn polygon_with_repeated_closing_vertices_accepted() {
        let mut env = base_env();
        env.insert("POLYGON_POINTS", "[[2,2],[7,2],[7,7],[2,2],[2,2]]".into());
        let config = load(&env).unwrap();
        assert_eq!(config.polygon.open_ring().len(), 3);
    }

    #[test]
    fn polygon_of_repeated_points_rejected() {
        let mut env = base_env();
        env.insert("POLYGON_POINTS", "[[1,1],[1,1],[5,5],[5,5],[1,1]]".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "POLYGON_POINTS",
                ..
            })
        );
    }

    #[test]
    fn polygon_coordinates_out_of_range_rejected() {
        for raw in [
            "[[0,0],[2147483647,0],[0,2147483647]]",
            "[[-2147483648,0],[5,0],[0,5]]",
            "[[0,0],[1048577,0],[0,5]]",
        ] {
            let mut env = base_env();
            env.insert("POLYGON_POINTS", raw.into());
            assert_matches!(
                load(&env),
                Err(ConfigError::Invalid {
                    var: "POLYGON_POINTS",
                    ..
                }),
                "{raw}"
            );
        }
    }

    #[test]
    fn malformed_polygon_json_rejected() {
        let mut env = base_env();
        env.insert("POLYGON_POINTS", "10,10 20,20 30,30".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "POLYGON_POINTS",
                ..
            })
        );
    }

    #[test]
    fn non_http_url_rejected() {
        let mut env = base_env();
        env.insert("SNAPSHOT_URL", "rtsp://camera.local/stream".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "SNAPSHOT_URL",
                ..
            })
        );
    }

    #[test]
    fn zero_http_timeout_rejected() {
        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECS", "0".into());
        assert_matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "HTTP_TIMEOUT_SECS",
                ..
            })
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}

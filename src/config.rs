//! Simulation configuration: built-in defaults, overridden by `ORALCOM_*`
//! environment variables (optionally from a `.env` file).

use std::path::Path;

use tracing::debug;

use crate::{
    common::*,
    error::{Result, SimError},
    layers::feedback::FeedbackParams,
};

/// Prefix shared by every configuration key.
pub const ENV_PREFIX: &str = "ORALCOM_";

/// Everything needed to run one session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    /// Initial source level
    pub source: f64,
    /// Initial noise level
    pub noise: f64,
    /// SDE coefficients and word counts
    pub params: FeedbackParams,
    /// Generator seed; drawn at random when absent
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE,
            noise: DEFAULT_NOISE,
            params: FeedbackParams::default(),
            seed: None,
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| SimError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl SimConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded environment file");
        }

        Self::from_vars(std::env::vars())
    }

    /// Reads configuration from a dotenv-formatted file without touching the
    /// process environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let iter =
            dotenvy::from_path_iter(path.as_ref()).map_err(|e| SimError::EnvFile(e.to_string()))?;

        let vars = iter
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SimError::EnvFile(e.to_string()))?;

        Self::from_vars(vars)
    }

    /// Applies `ORALCOM_*` entries from `vars` on top of the defaults.
    /// Unrelated keys are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let key = key.as_ref();
            let value = value.as_ref();

            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            let params = &mut config.params;
            match name {
                "SOURCE" => config.source = parse(key, value)?,
                "NOISE" => config.noise = parse(key, value)?,
                "ALPHA" => params.alpha = parse(key, value)?,
                "BETA" => params.beta = parse(key, value)?,
                "GAMMA" => params.gamma = parse(key, value)?,
                "DELTA" => params.delta = parse(key, value)?,
                "SIGMA_X" => params.sigma_x = parse(key, value)?,
                "SIGMA_Y" => params.sigma_y = parse(key, value)?,
                "WORD_COUNT" => params.word_count = parse(key, value)?,
                "RECEIVER_WORD_COUNT" => params.receiver_word_count = parse(key, value)?,
                "DT" => params.dt = parse(key, value)?,
                "SEED" => config.seed = Some(parse(key, value)?),
                _ => continue,
            }
        }

        Ok(config)
    }

    /// Rejects non-finite values and a non-positive time step.
    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        let values = [
            ("source", self.source),
            ("noise", self.noise),
            ("alpha", p.alpha),
            ("beta", p.beta),
            ("gamma", p.gamma),
            ("delta", p.delta),
            ("sigma_x", p.sigma_x),
            ("sigma_y", p.sigma_y),
            ("dt", p.dt),
        ];

        if let Some(&(name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::InvalidParameter { name, value });
        }

        if p.dt <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "dt",
                value: p.dt,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test_log::test]
    fn test_defaults_match_reference_dialogue() {
        let config = SimConfig::default();

        assert_eq!(config.source, 1.028842);
        assert_eq!(config.noise, 0.0669942);
        assert_eq!(config.params.word_count, 7);
        assert_eq!(config.params.receiver_word_count, 7);
        assert_eq!(config.params.dt, 0.01);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test_log::test]
    fn test_vars_override_defaults() {
        let config = SimConfig::from_vars([
            ("ORALCOM_ALPHA", "0.25"),
            ("ORALCOM_WORD_COUNT", " 12 "),
            ("ORALCOM_SEED", "99"),
            ("PATH", "/usr/bin"),
            ("ORALCOM_UNKNOWN", "whatever"),
        ])
        .unwrap();

        assert_eq!(config.params.alpha, 0.25);
        assert_eq!(config.params.word_count, 12);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.params.beta, DEFAULT_BETA);
    }

    #[test_log::test]
    fn test_unparsable_value() {
        let err = SimConfig::from_vars([("ORALCOM_DT", "fast")]).unwrap_err();

        assert_eq!(
            err,
            SimError::InvalidConfig {
                key: "ORALCOM_DT".into(),
                value: "fast".into(),
            }
        );
    }

    #[test_log::test]
    fn test_validate_rejects_bad_values() {
        let mut config = SimConfig::default();
        config.params.dt = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidParameter { name: "dt", .. })
        ));

        let mut config = SimConfig::default();
        config.noise = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidParameter { name: "noise", .. })
        ));
    }

    #[test_log::test]
    fn test_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# reference dialogue, noisier").unwrap();
        writeln!(file, "ORALCOM_NOISE=0.5").unwrap();
        writeln!(file, "ORALCOM_RECEIVER_WORD_COUNT=9").unwrap();

        let config = SimConfig::from_env_file(file.path()).unwrap();

        assert_eq!(config.noise, 0.5);
        assert_eq!(config.params.receiver_word_count, 9);
        assert_eq!(config.source, DEFAULT_SOURCE);
    }

    #[test_log::test]
    fn test_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            SimConfig::from_env_file(dir.path().join("absent.env")),
            Err(SimError::EnvFile(_))
        ));
    }

    #[test_log::test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        // Serialized because a `.env` found by `from_env` is loaded into the
        // process environment.
        let config = SimConfig::from_env().unwrap();

        assert_eq!(config, SimConfig::from_vars(std::env::vars()).unwrap());
    }
}

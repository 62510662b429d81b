use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    decision::LysogenyProfile,
    resources::{SimulationConfig, StrainParams},
    site::Strain,
};

pub const BUILTIN_COLONY_CONFIG: &str = include_str!("data/colony_config.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse colony config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read colony config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid colony config parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}

fn invalid(name: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name: name.into(),
        reason: reason.into(),
    }
}

impl SimulationConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_COLONY_CONFIG)
    }

    /// Parses and validates. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        SimulationConfig::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lattice_size == 0 {
            return Err(invalid("lattice_size", "must be at least 1"));
        }
        if self.decision_time == 0 {
            return Err(invalid("decision_time", "must be at least 1"));
        }
        check_growth_rate(
            "healthy_growth_rate",
            self.healthy_growth_rate,
            self.birth_time_range,
        )?;
        check_nonzero("healthy_death_time", self.healthy_death_time)?;
        for strain in [Strain::A, Strain::B] {
            validate_strain(strain, self.strain(strain), self.birth_time_range)?;
        }
        Ok(())
    }
}

fn strain_key(strain: Strain) -> &'static str {
    match strain {
        Strain::A => "strain_a",
        Strain::B => "strain_b",
    }
}

fn validate_strain(strain: Strain, params: &StrainParams, jitter: u32) -> Result<(), ConfigError> {
    let key = strain_key(strain);
    check_growth_rate(
        &format!("{key}.lysogenic_growth_rate"),
        params.lysogenic_growth_rate,
        jitter,
    )?;
    check_nonzero(
        &format!("{key}.lysogenic_death_time"),
        params.lysogenic_death_time,
    )?;
    check_nonzero(&format!("{key}.lysis_burst_time"), params.lysis_burst_time)?;
    check_nonzero(&format!("{key}.exposure_tries"), params.exposure_tries)?;
    check_probability(
        &format!("{key}.infection_probability"),
        params.infection_probability,
    )?;
    match &params.lysogeny {
        Some(profile) => validate_profile(key, profile),
        None => Ok(()),
    }
}

fn validate_profile(key: &str, profile: &LysogenyProfile) -> Result<(), ConfigError> {
    for (slot, p) in profile.overrides.iter().enumerate() {
        check_probability(&format!("{key}.lysogeny.overrides[{slot}]"), *p)?;
    }
    if let Some(p) = profile.saturation {
        check_probability(&format!("{key}.lysogeny.saturation"), p)?;
    }
    Ok(())
}

fn check_growth_rate(name: &str, rate: u32, jitter: u32) -> Result<(), ConfigError> {
    if rate <= jitter {
        return Err(invalid(
            name,
            format!("{rate} must exceed birth_time_range ({jitter})"),
        ));
    }
    Ok(())
}

fn check_nonzero(name: &str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(name, "must be at least 1"));
    }
    Ok(())
}

fn check_probability(name: &str, p: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(name, format!("{p} is outside [0, 1]")));
    }
    Ok(())
}

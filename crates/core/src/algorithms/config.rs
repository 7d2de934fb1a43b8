//! Algorithm configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core_types::variables as v;
use crate::error::{Result, WakeError};
use crate::farm::TurbineType;
use crate::models::ModelBook;

/// Model selection and iteration controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Wake models, applied in this order
    #[serde(default = "default_wake_models")]
    pub wake_models: Vec<String>,
    /// Wake frame name
    #[serde(default = "default_wake_frame")]
    pub wake_frame: String,
    /// Partial wakes used by every wake model without an override
    #[serde(default = "default_partial_wakes")]
    pub partial_wakes: String,
    /// Partial wakes per wake model name
    #[serde(default)]
    pub partial_wakes_by_model: BTreeMap<String, String>,
    /// Turbine type of farms built from this configuration
    #[serde(default = "default_turbine_type")]
    pub turbine_type: String,
    /// Under-relaxation factor per farm variable, iterative runs only
    #[serde(default = "default_urelax")]
    pub urelax: BTreeMap<String, f64>,
    /// Iteration limit of iterative runs
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence threshold on the largest absolute change
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Farm variables checked for convergence
    #[serde(default = "default_convergence_vars")]
    pub convergence_vars: Vec<String>,
}

// Default values
fn default_wake_models() -> Vec<String> {
    vec!["jensen".to_string()]
}

fn default_wake_frame() -> String {
    "rotor_wakes".to_string()
}

fn default_partial_wakes() -> String {
    "centre".to_string()
}

fn default_turbine_type() -> String {
    "NREL5MW".to_string()
}

fn default_urelax() -> BTreeMap<String, f64> {
    BTreeMap::from([(v::CT.to_string(), 0.5)])
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_convergence_vars() -> Vec<String> {
    vec![v::REWS.to_string()]
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            wake_models: default_wake_models(),
            wake_frame: default_wake_frame(),
            partial_wakes: default_partial_wakes(),
            partial_wakes_by_model: BTreeMap::new(),
            turbine_type: default_turbine_type(),
            urelax: default_urelax(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            convergence_vars: default_convergence_vars(),
        }
    }
}

impl AlgorithmConfig {
    /// Parse from a JSON string and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WakeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style wake model list
    #[must_use]
    pub fn with_wake_models(mut self, names: &[&str]) -> Self {
        self.wake_models = names.iter().map(ToString::to_string).collect();
        self
    }

    /// Builder-style default partial wakes
    #[must_use]
    pub fn with_partial_wakes(mut self, name: &str) -> Self {
        self.partial_wakes = name.to_string();
        self
    }

    /// Partial wakes name of a wake model
    #[must_use]
    pub fn partial_wakes_for(&self, wake_model: &str) -> &str {
        self.partial_wakes_by_model
            .get(wake_model)
            .map_or(self.partial_wakes.as_str(), String::as_str)
    }

    /// Turbine type named by the configuration
    pub fn resolve_turbine_type(&self, book: &ModelBook) -> Result<TurbineType> {
        Ok(book.turbine_types.get(&self.turbine_type)?.as_ref().clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.wake_models.is_empty() {
            return Err(WakeError::InvalidConfig(
                "at least one wake model is required".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(WakeError::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(WakeError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        for (var, &r) in &self.urelax {
            if !(0.0..1.0).contains(&r) {
                return Err(WakeError::InvalidConfig(format!(
                    "urelax factor of '{var}' must be in [0, 1), got {r}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = AlgorithmConfig::from_json("{}").unwrap();
        assert_eq!(config, AlgorithmConfig::default());
        assert_eq!(config.wake_models, vec!["jensen"]);
        assert_eq!(config.urelax.get("CT"), Some(&0.5));
        assert_eq!(config.partial_wakes_for("jensen"), "centre");
    }

    #[test]
    fn test_partial_wakes_override() {
        let config = AlgorithmConfig::from_json(
            r#"{"wake_models": ["jensen", "crespo_hernandez"],
                "partial_wakes_by_model": {"crespo_hernandez": "grid16"}}"#,
        )
        .unwrap();
        assert_eq!(config.partial_wakes_for("jensen"), "centre");
        assert_eq!(config.partial_wakes_for("crespo_hernandez"), "grid16");
    }

    #[test]
    fn test_invalid_urelax_rejected() {
        let err = AlgorithmConfig::from_json(r#"{"urelax": {"CT": 1.0}}"#).unwrap_err();
        assert!(matches!(err, WakeError::InvalidConfig(_)));
        assert!(AlgorithmConfig::from_json(r#"{"wake_models": []}"#).is_err());
    }
}

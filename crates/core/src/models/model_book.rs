//! Name-based model registries
//!
//! Every model kind has its own registry of fixed names plus name templates
//! such as `jensen_k<k>` or `grid<n2>` whose parameter is parsed from the
//! requested name.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{
    CrespoHernandezTi, DeltaKind, JensenWake, LinearSuperposition, MaxSuperposition,
    PartialWakes, QuadraticSuperposition, RotorPoints, RotorWakes, WakeFrame, WakeModel,
    WakeSuperposition, JENSEN_K,
};
use crate::error::{Result, WakeError};
use crate::farm::TurbineType;

/// Factory for a templated name, fed with the parameter part of the name
type TemplateFactory<T> = fn(&str) -> Option<Arc<T>>;

struct Template<T: ?Sized> {
    pattern: &'static str,
    prefix: &'static str,
    build: TemplateFactory<T>,
}

/// Registry of one model kind
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: BTreeMap<String, Arc<T>>,
    templates: Vec<Template<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Empty registry for a model kind such as `"wake model"`
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            templates: Vec::new(),
        }
    }

    /// Register a model under a fixed name, replacing any previous entry
    pub fn insert(&mut self, name: impl Into<String>, model: Arc<T>) {
        self.entries.insert(name.into(), model);
    }

    /// Register a name template
    ///
    /// # Arguments
    ///
    /// * `pattern` - Display form, e.g. `jensen_k<k>`
    /// * `prefix` - Literal prefix before the parameter
    /// * `build` - Factory called with the remainder of the name
    pub fn add_template(&mut self, pattern: &'static str, prefix: &'static str, build: TemplateFactory<T>) {
        self.templates.push(Template {
            pattern,
            prefix,
            build,
        });
    }

    /// Look up a model by name
    ///
    /// Fixed names take precedence over templates.
    pub fn get(&self, name: &str) -> Result<Arc<T>> {
        if let Some(model) = self.entries.get(name) {
            return Ok(Arc::clone(model));
        }
        for template in &self.templates {
            if let Some(param) = name.strip_prefix(template.prefix) {
                if let Some(model) = (template.build)(param) {
                    debug!("Built {} '{}' from template '{}'", self.kind, name, template.pattern);
                    return Ok(model);
                }
            }
        }
        Err(WakeError::UnknownModel {
            kind: self.kind.to_string(),
            name: name.to_string(),
            available: self.names(),
        })
    }

    /// All fixed names and template patterns, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .keys()
            .cloned()
            .chain(self.templates.iter().map(|t| t.pattern.to_string()))
            .collect();
        names.sort();
        names
    }
}

/// All model registries with the shipped models pre-registered
pub struct ModelBook {
    /// Wake frames
    pub wake_frames: Registry<dyn WakeFrame>,
    /// Wake models
    pub wake_models: Registry<dyn WakeModel>,
    /// Partial wakes strategies
    pub partial_wakes: Registry<dyn PartialWakes>,
    /// Wake superpositions
    pub superpositions: Registry<dyn WakeSuperposition>,
    /// Turbine types
    pub turbine_types: Registry<TurbineType>,
}

fn ws_linear() -> Arc<dyn WakeSuperposition> {
    Arc::new(LinearSuperposition::new(DeltaKind::Deficit))
}

fn jensen_k(param: &str) -> Option<Arc<dyn WakeModel>> {
    let k: f64 = param.parse().ok()?;
    if !k.is_finite() || k < 0.0 {
        return None;
    }
    Some(Arc::new(JensenWake::new(format!("jensen_k{param}"), k, ws_linear())))
}

fn grid_n2(param: &str) -> Option<Arc<dyn PartialWakes>> {
    let n2: usize = param.parse().ok()?;
    let n = (1..=n2).find(|n| n * n >= n2)?;
    (n * n == n2).then(|| Arc::new(RotorPoints::grid(n)) as Arc<dyn PartialWakes>)
}

impl ModelBook {
    /// Registries holding every shipped model
    #[must_use]
    pub fn new() -> Self {
        let mut superpositions: Registry<dyn WakeSuperposition> = Registry::new("superposition");
        for sp in [
            Arc::new(LinearSuperposition::new(DeltaKind::Deficit)) as Arc<dyn WakeSuperposition>,
            Arc::new(LinearSuperposition::new(DeltaKind::Addition)),
            Arc::new(QuadraticSuperposition::new(DeltaKind::Deficit)),
            Arc::new(QuadraticSuperposition::new(DeltaKind::Addition)),
            Arc::new(MaxSuperposition::new(DeltaKind::Deficit)),
            Arc::new(MaxSuperposition::new(DeltaKind::Addition)),
        ] {
            superpositions.insert(sp.name().to_string(), sp);
        }

        let mut wake_models: Registry<dyn WakeModel> = Registry::new("wake model");
        let ws_quadratic: Arc<dyn WakeSuperposition> =
            Arc::new(QuadraticSuperposition::new(DeltaKind::Deficit));
        let ws_max: Arc<dyn WakeSuperposition> = Arc::new(MaxSuperposition::new(DeltaKind::Deficit));
        let ti_quadratic: Arc<dyn WakeSuperposition> =
            Arc::new(QuadraticSuperposition::new(DeltaKind::Addition));
        let ti_max: Arc<dyn WakeSuperposition> = Arc::new(MaxSuperposition::new(DeltaKind::Addition));
        wake_models.insert("jensen", Arc::new(JensenWake::new("jensen", JENSEN_K, ws_linear())));
        wake_models.insert(
            "jensen_quadratic",
            Arc::new(JensenWake::new("jensen_quadratic", JENSEN_K, ws_quadratic)),
        );
        wake_models.insert(
            "jensen_max",
            Arc::new(JensenWake::new("jensen_max", JENSEN_K, ws_max)),
        );
        wake_models.insert(
            "crespo_hernandez",
            Arc::new(CrespoHernandezTi::new("crespo_hernandez", JENSEN_K, ti_quadratic)),
        );
        wake_models.insert(
            "crespo_hernandez_max",
            Arc::new(CrespoHernandezTi::new("crespo_hernandez_max", JENSEN_K, ti_max)),
        );
        wake_models.add_template("jensen_k<k>", "jensen_k", jensen_k);

        let mut wake_frames: Registry<dyn WakeFrame> = Registry::new("wake frame");
        wake_frames.insert("rotor_wakes", Arc::new(RotorWakes));

        let mut partial_wakes: Registry<dyn PartialWakes> = Registry::new("partial wakes");
        partial_wakes.insert("centre", Arc::new(RotorPoints::centre()));
        partial_wakes.add_template("grid<n2>", "grid", grid_n2);

        let mut turbine_types: Registry<TurbineType> = Registry::new("turbine type");
        let nrel = TurbineType::nrel_5mw();
        turbine_types.insert(nrel.name.clone(), Arc::new(nrel));

        Self {
            wake_frames,
            wake_models,
            partial_wakes,
            superpositions,
            turbine_types,
        }
    }
}

impl Default for ModelBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_lists_sorted_available() {
        let book = ModelBook::new();
        let Err(err) = book.wake_models.get("gauss") else {
            panic!("expected unknown model error");
        };
        match err {
            WakeError::UnknownModel {
                kind,
                name,
                available,
            } => {
                assert_eq!(kind, "wake model");
                assert_eq!(name, "gauss");
                let mut sorted = available.clone();
                sorted.sort();
                assert_eq!(available, sorted);
                assert!(available.contains(&"jensen".to_string()));
                assert!(available.contains(&"jensen_k<k>".to_string()));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_templates_parse_parameter() {
        let book = ModelBook::new();
        let model = book.wake_models.get("jensen_k0.075").unwrap();
        assert_eq!(model.name(), "jensen_k0.075");
        assert!(book.wake_models.get("jensen_kx").is_err());

        assert_eq!(book.partial_wakes.get("grid16").unwrap().name(), "grid16");
        assert!(book.partial_wakes.get("grid15").is_err());
    }

    #[test]
    fn test_fixed_names() {
        let book = ModelBook::new();
        assert_eq!(book.superpositions.get("ti_max").unwrap().name(), "ti_max");
        assert_eq!(book.wake_frames.get("rotor_wakes").unwrap().name(), "rotor_wakes");
        assert_eq!(book.turbine_types.get("NREL5MW").unwrap().diameter, 126.0);
    }
}

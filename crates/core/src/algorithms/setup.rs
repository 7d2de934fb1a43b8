//! Farm, inflow and resolved models of a calculation

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use super::AlgorithmConfig;
use crate::core_types::{Axis, Dataset};
use crate::error::Result;
use crate::farm::{States, WindFarm};
use crate::models::{BasicFarmController, FarmController, ModelBook, PartialWakes, WakeFrame, WakeModel};

/// A wake model together with the partial wakes that evaluates it
#[derive(Clone)]
pub struct WakeModelEntry {
    /// Wake model name
    pub name: String,
    /// Wake model
    pub model: Arc<dyn WakeModel>,
    /// Rotor evaluation strategy of this wake model
    pub partial_wakes: Arc<dyn PartialWakes>,
}

impl std::fmt::Debug for WakeModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeModelEntry")
            .field("name", &self.name)
            .field("partial_wakes", &self.partial_wakes.name())
            .finish()
    }
}

/// Everything a chunk needs besides its data
///
/// Built once per run and shared read-only by every worker.
#[derive(Clone)]
pub struct FarmSetup {
    /// Wind farm layout
    pub farm: WindFarm,
    /// Inflow states
    pub states: States,
    /// Turbine ordering and wake coordinates
    pub wake_frame: Arc<dyn WakeFrame>,
    /// Wake models in application order
    pub wake_models: Vec<WakeModelEntry>,
    /// Turbine operation
    pub farm_controller: Arc<dyn FarmController>,
}

impl std::fmt::Debug for FarmSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FarmSetup")
            .field("farm", &self.farm.name)
            .field("n_turbines", &self.farm.n_turbines())
            .field("n_states", &self.states.n_states())
            .field("wake_frame", &self.wake_frame.name())
            .field("wake_models", &self.wake_models)
            .field("farm_controller", &self.farm_controller.name())
            .finish()
    }
}

impl FarmSetup {
    /// Resolve every model named in the configuration
    ///
    /// # Arguments
    ///
    /// * `farm` - Wind farm; its turbines name their turbine-type models
    /// * `states` - Inflow states
    /// * `config` - Model names
    /// * `book` - Registries to resolve the names in
    ///
    /// # Errors
    ///
    /// `UnknownModel` for any name missing from its registry
    pub fn from_config(
        farm: WindFarm,
        states: States,
        config: &AlgorithmConfig,
        book: &ModelBook,
    ) -> Result<Self> {
        config.validate()?;
        let wake_frame = book.wake_frames.get(&config.wake_frame)?;
        let wake_models = config
            .wake_models
            .iter()
            .map(|name| {
                Ok(WakeModelEntry {
                    name: name.clone(),
                    model: book.wake_models.get(name)?,
                    partial_wakes: book.partial_wakes.get(config.partial_wakes_for(name))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let type_names: BTreeSet<&str> = farm
            .turbines()
            .iter()
            .flat_map(|t| t.models.iter().map(String::as_str))
            .collect();
        let mut types = Vec::with_capacity(type_names.len());
        for name in type_names {
            types.push(book.turbine_types.get(name)?.as_ref().clone());
        }
        let farm_controller: Arc<dyn FarmController> =
            Arc::new(BasicFarmController::new(&farm, types)?);

        info!(
            "Farm '{}': {} turbines, {} states, wake models [{}]",
            farm.name,
            farm.n_turbines(),
            states.n_states(),
            config.wake_models.join(", ")
        );
        Ok(Self {
            farm,
            states,
            wake_frame,
            wake_models,
            farm_controller,
        })
    }

    /// Number of states
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.states.n_states()
    }

    /// Number of turbines
    #[must_use]
    pub fn n_turbines(&self) -> usize {
        self.farm.n_turbines()
    }

    /// Inflow variables over `State`
    #[must_use]
    pub fn model_dataset(&self) -> Dataset {
        self.states.model_dataset()
    }

    /// Turbine geometry over `(State, Turbine)`
    #[must_use]
    pub fn farm_dataset(&self) -> Dataset {
        self.farm.farm_dataset(self.n_states())
    }

    /// Turbine geometry merged with farm results
    ///
    /// Geometry rows follow the state coordinate of `results`, so results of
    /// a state selection line up with their geometry.
    pub fn farm_data_with(&self, results: &Dataset) -> Result<Dataset> {
        let mut farm = self.farm_dataset().isel(Axis::State, results.states())?;
        for (name, array) in results.vars() {
            farm.insert(name.clone(), array.clone());
        }
        Ok(farm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WakeError;
    use crate::farm::{add_row, TurbineType};

    fn row() -> WindFarm {
        let mut farm = WindFarm::new("row");
        add_row(&mut farm, [0.0, 0.0], [500.0, 0.0], 3, &TurbineType::nrel_5mw());
        farm
    }

    #[test]
    fn test_from_default_config() {
        let setup = FarmSetup::from_config(
            row(),
            States::uniform(9.0, 270.0, 0.05, 1.225),
            &AlgorithmConfig::default(),
            &ModelBook::new(),
        )
        .unwrap();
        assert_eq!(setup.n_turbines(), 3);
        assert_eq!(setup.wake_models.len(), 1);
        assert_eq!(setup.wake_models[0].partial_wakes.name(), "centre");
        assert_eq!(setup.farm_controller.name(), "basic_ctrl");
        assert_eq!(setup.farm_dataset().size(Axis::Turbine), Some(3));
    }

    #[test]
    fn test_unknown_wake_model() {
        let config = AlgorithmConfig::default().with_wake_models(&["bastankhah"]);
        let err = FarmSetup::from_config(
            row(),
            States::uniform(9.0, 270.0, 0.05, 1.225),
            &config,
            &ModelBook::new(),
        )
        .unwrap_err();
        assert!(matches!(err, WakeError::UnknownModel { ref name, .. } if name == "bastankhah"));
    }
}

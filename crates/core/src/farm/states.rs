//! Atmospheric inflow states

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::{variables as v, Axis, Dataset, VarArray};
use crate::error::{Result, WakeError};

/// Default air density (kg/m³)
pub const RHO_STANDARD: f64 = 1.225;

/// One uniform inflow state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Wind speed at hub height (m/s)
    pub ws: f64,
    /// Wind direction (degrees, direction the wind comes from)
    pub wd: f64,
    /// Turbulence intensity
    pub ti: f64,
    /// Air density (kg/m³)
    pub rho: f64,
    /// Statistical weight
    pub weight: f64,
}

impl State {
    /// State with standard density and unit weight
    #[must_use]
    pub fn new(ws: f64, wd: f64, ti: f64) -> Self {
        Self {
            ws,
            wd,
            ti,
            rho: RHO_STANDARD,
            weight: 1.0,
        }
    }
}

/// Ordered list of inflow states
///
/// Inflow is horizontally homogeneous: every point of the domain sees the
/// same wind speed, direction, turbulence and density within a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct States {
    states: Vec<State>,
}

impl States {
    /// Single uniform state
    #[must_use]
    pub fn uniform(ws: f64, wd: f64, ti: f64, rho: f64) -> Self {
        Self {
            states: vec![State {
                ws,
                wd,
                ti,
                rho,
                weight: 1.0,
            }],
        }
    }

    /// States from a table of rows
    ///
    /// Weights are normalized to sum to one.
    pub fn from_table(mut states: Vec<State>) -> Result<Self> {
        if states.is_empty() {
            return Err(WakeError::EmptyAxis { axis: Axis::State });
        }
        if let Some((i, s)) = states
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.ws.is_finite() && s.wd.is_finite() && s.ti.is_finite()))
        {
            return Err(WakeError::InvalidConfig(format!(
                "state {i} has non-finite inflow values {s:?}"
            )));
        }
        let total: f64 = states.iter().map(|s| s.weight).sum();
        if total <= 0.0 {
            return Err(WakeError::InvalidConfig(
                "state weights must sum to a positive value".to_string(),
            ));
        }
        for s in &mut states {
            s.weight /= total;
        }
        Ok(Self { states })
    }

    /// Random states from a seeded generator
    ///
    /// Wind speeds are drawn from 4-20 m/s, directions from the full circle
    /// and turbulence intensities from 4-12 %. The same seed always produces
    /// the same states.
    #[must_use]
    pub fn random(n_states: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let weight = 1.0 / n_states.max(1) as f64;
        let states: Vec<State> = (0..n_states)
            .map(|_| State {
                ws: rng.random_range(4.0..20.0),
                wd: rng.random_range(0.0..360.0),
                ti: rng.random_range(0.04..0.12),
                rho: RHO_STANDARD,
                weight,
            })
            .collect();
        debug!("Generated {} random states (seed {})", n_states, seed);
        Self { states }
    }

    /// Number of states
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// All states
    #[must_use]
    pub fn as_slice(&self) -> &[State] {
        &self.states
    }

    /// Inflow variables `WS`, `WD`, `TI`, `RHO`, `weight` over `State`
    #[must_use]
    pub fn model_dataset(&self) -> Dataset {
        let column =
            |f: fn(&State) -> f64| VarArray::from_1d(Axis::State, self.states.iter().map(f).collect());
        Dataset::new((0..self.n_states()).collect())
            .with_var(v::WS, column(|s| s.ws))
            .with_var(v::WD, column(|s| s.wd))
            .with_var(v::TI, column(|s| s.ti))
            .with_var(v::RHO, column(|s| s.rho))
            .with_var(v::WEIGHT, column(|s| s.weight))
    }
}

//! Tabulated power and thrust curves

use serde::{Deserialize, Serialize};

use crate::error::{Result, WakeError};

/// Turbine type defined by a power/thrust curve table
///
/// Values between table points are linearly interpolated. Outside the
/// tabulated wind speed range (below cut-in, above cut-out) both power and
/// thrust are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineType {
    /// Type name, used as model name in the registry
    pub name: String,
    /// Rotor diameter (m)
    pub diameter: f64,
    /// Hub height (m)
    pub hub_height: f64,
    ws: Vec<f64>,
    power: Vec<f64>,
    ct: Vec<f64>,
}

impl TurbineType {
    /// Create a turbine type from curve tables
    ///
    /// # Arguments
    ///
    /// * `name` - Type name
    /// * `diameter` - Rotor diameter in metres
    /// * `hub_height` - Hub height in metres
    /// * `ws` - Strictly increasing wind speeds (m/s)
    /// * `power` - Power at each wind speed (kW)
    /// * `ct` - Thrust coefficient at each wind speed
    pub fn new(
        name: impl Into<String>,
        diameter: f64,
        hub_height: f64,
        ws: Vec<f64>,
        power: Vec<f64>,
        ct: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if ws.len() < 2 || power.len() != ws.len() || ct.len() != ws.len() {
            return Err(WakeError::InvalidConfig(format!(
                "turbine type '{name}': curve tables need at least 2 points of equal length \
                 (ws {}, P {}, ct {})",
                ws.len(),
                power.len(),
                ct.len()
            )));
        }
        if ws.windows(2).any(|w| w[1] <= w[0]) {
            return Err(WakeError::InvalidConfig(format!(
                "turbine type '{name}': wind speeds must be strictly increasing"
            )));
        }
        if diameter <= 0.0 || hub_height <= 0.0 {
            return Err(WakeError::InvalidConfig(format!(
                "turbine type '{name}': diameter and hub height must be positive"
            )));
        }
        Ok(Self {
            name,
            diameter,
            hub_height,
            ws,
            power,
            ct,
        })
    }

    /// Generic 5 MW reference turbine (126 m rotor, 90 m hub)
    #[must_use]
    pub fn nrel_5mw() -> Self {
        Self {
            name: "NREL5MW".to_string(),
            diameter: 126.0,
            hub_height: 90.0,
            ws: vec![
                3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 11.4, 12.0, 15.0, 20.0, 25.0,
            ],
            power: vec![
                40.5, 177.7, 403.9, 737.6, 1187.2, 1771.1, 2518.6, 3448.4, 4562.5, 5000.0,
                5000.0, 5000.0, 5000.0, 5000.0,
            ],
            ct: vec![
                0.82, 0.80, 0.79, 0.79, 0.79, 0.79, 0.79, 0.79, 0.76, 0.72, 0.60, 0.34, 0.15,
                0.08,
            ],
        }
    }

    /// Cut-in wind speed
    #[must_use]
    pub fn ws_cutin(&self) -> f64 {
        self.ws[0]
    }

    /// Cut-out wind speed
    #[must_use]
    pub fn ws_cutout(&self) -> f64 {
        self.ws[self.ws.len() - 1]
    }

    fn interpolate(&self, table: &[f64], ws: f64) -> f64 {
        if ws.is_nan() || ws < self.ws_cutin() || ws > self.ws_cutout() {
            return 0.0;
        }
        let hi = self.ws.partition_point(|&w| w < ws).max(1);
        let lo = hi - 1;
        let t = (ws - self.ws[lo]) / (self.ws[hi] - self.ws[lo]);
        table[lo] + t * (table[hi] - table[lo])
    }

    /// Power output (kW) at a rotor-equivalent wind speed
    #[must_use]
    pub fn power(&self, ws: f64) -> f64 {
        self.interpolate(&self.power, ws)
    }

    /// Thrust coefficient at a rotor-equivalent wind speed
    #[must_use]
    pub fn ct(&self, ws: f64) -> f64 {
        self.interpolate(&self.ct, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolation_between_points() {
        let tt = TurbineType::nrel_5mw();
        assert_relative_eq!(tt.power(9.0), 2518.6, epsilon = 1e-9);
        assert_relative_eq!(tt.power(9.5), 0.5 * (2518.6 + 3448.4), epsilon = 1e-9);
        assert_relative_eq!(tt.ct(3.0), 0.82, epsilon = 1e-12);
        assert_relative_eq!(tt.power(25.0), 5000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_outside_operating_range() {
        let tt = TurbineType::nrel_5mw();
        assert_eq!(tt.power(2.9), 0.0);
        assert_eq!(tt.ct(25.1), 0.0);
        assert_eq!(tt.ct(f64::NAN), 0.0);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(TurbineType::new("x", 100.0, 80.0, vec![3.0], vec![0.0], vec![0.0]).is_err());
        assert!(TurbineType::new(
            "x",
            100.0,
            80.0,
            vec![5.0, 4.0],
            vec![0.0, 1.0],
            vec![0.5, 0.5]
        )
        .is_err());
    }

    #[test]
    fn test_power_monotone_below_rated() {
        let tt = TurbineType::nrel_5mw();
        let mut last = 0.0;
        for i in 0..100 {
            let p = tt.power(3.0 + 0.1 * f64::from(i));
            assert!(p >= last);
            last = p;
        }
    }
}

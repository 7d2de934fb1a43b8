//! Wake superposition rules
//!
//! Wind speed wakes are deficits (negative deltas), turbulence wakes are
//! additions (positive). Each rule exists in a `ws_*` and a `ti_*` flavour.

use super::WakeSuperposition;

/// Sign convention of the superposed quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// Velocity deficits, negative deltas
    Deficit,
    /// Turbulence additions, positive deltas
    Addition,
}

/// Sum of wake deltas
#[derive(Debug, Clone, Copy)]
pub struct LinearSuperposition {
    kind: DeltaKind,
}

impl LinearSuperposition {
    /// Create a linear superposition
    #[must_use]
    pub fn new(kind: DeltaKind) -> Self {
        Self { kind }
    }
}

impl WakeSuperposition for LinearSuperposition {
    fn name(&self) -> &str {
        match self.kind {
            DeltaKind::Deficit => "ws_linear",
            DeltaKind::Addition => "ti_linear",
        }
    }

    fn add_wake(&self, accumulated: f64, wake: f64) -> f64 {
        accumulated + wake
    }

    fn calc_final_wake_delta(&self, _ambient: f64, accumulated: f64) -> f64 {
        accumulated
    }
}

/// Root of the sum of squared wake deltas
#[derive(Debug, Clone, Copy)]
pub struct QuadraticSuperposition {
    kind: DeltaKind,
}

impl QuadraticSuperposition {
    /// Create a quadratic superposition
    #[must_use]
    pub fn new(kind: DeltaKind) -> Self {
        Self { kind }
    }
}

impl WakeSuperposition for QuadraticSuperposition {
    fn name(&self) -> &str {
        match self.kind {
            DeltaKind::Deficit => "ws_quadratic",
            DeltaKind::Addition => "ti_quadratic",
        }
    }

    fn add_wake(&self, accumulated: f64, wake: f64) -> f64 {
        accumulated + wake * wake
    }

    fn calc_final_wake_delta(&self, ambient: f64, accumulated: f64) -> f64 {
        match self.kind {
            DeltaKind::Deficit => -accumulated.sqrt(),
            // added turbulence combines with ambient in quadrature
            DeltaKind::Addition => (ambient * ambient + accumulated).sqrt() - ambient,
        }
    }
}

/// Strongest single wake wins
#[derive(Debug, Clone, Copy)]
pub struct MaxSuperposition {
    kind: DeltaKind,
}

impl MaxSuperposition {
    /// Create a max superposition
    #[must_use]
    pub fn new(kind: DeltaKind) -> Self {
        Self { kind }
    }
}

impl WakeSuperposition for MaxSuperposition {
    fn name(&self) -> &str {
        match self.kind {
            DeltaKind::Deficit => "ws_max",
            DeltaKind::Addition => "ti_max",
        }
    }

    fn add_wake(&self, accumulated: f64, wake: f64) -> f64 {
        match self.kind {
            DeltaKind::Deficit => accumulated.min(wake),
            DeltaKind::Addition => accumulated.max(wake),
        }
    }

    fn calc_final_wake_delta(&self, ambient: f64, accumulated: f64) -> f64 {
        match self.kind {
            DeltaKind::Deficit => accumulated,
            DeltaKind::Addition => (ambient * ambient + accumulated * accumulated).sqrt() - ambient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn superpose(sp: &dyn WakeSuperposition, ambient: f64, wakes: &[f64]) -> f64 {
        let acc = wakes.iter().fold(0.0, |acc, &w| sp.add_wake(acc, w));
        sp.calc_final_wake_delta(ambient, acc)
    }

    #[test]
    fn test_linear() {
        let sp = LinearSuperposition::new(DeltaKind::Deficit);
        assert_relative_eq!(superpose(&sp, 9.0, &[-1.0, -0.5]), -1.5);
        assert_eq!(sp.name(), "ws_linear");
    }

    #[test]
    fn test_quadratic_deficit() {
        let sp = QuadraticSuperposition::new(DeltaKind::Deficit);
        assert_relative_eq!(superpose(&sp, 9.0, &[-3.0, -4.0]), -5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quadratic_ti() {
        let sp = QuadraticSuperposition::new(DeltaKind::Addition);
        // sqrt(0.03^2 + 0.04^2) = 0.05
        assert_relative_eq!(superpose(&sp, 0.03, &[0.04]), 0.02, epsilon = 1e-12);
        assert_eq!(sp.name(), "ti_quadratic");
    }

    #[test]
    fn test_max() {
        let ws = MaxSuperposition::new(DeltaKind::Deficit);
        assert_relative_eq!(superpose(&ws, 9.0, &[-1.0, -2.0, -0.5]), -2.0);
        let ti = MaxSuperposition::new(DeltaKind::Addition);
        assert_relative_eq!(superpose(&ti, 0.03, &[0.01, 0.04]), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_no_wakes_no_delta() {
        for sp in [
            &LinearSuperposition::new(DeltaKind::Addition) as &dyn WakeSuperposition,
            &QuadraticSuperposition::new(DeltaKind::Addition),
            &MaxSuperposition::new(DeltaKind::Addition),
        ] {
            assert_relative_eq!(superpose(sp, 0.05, &[]), 0.0, epsilon = 1e-15);
        }
    }
}

//! Variable names shared by data containers, models and results
//!
//! Ambient variables (`AMB_*`) hold the undisturbed inflow; their plain
//! counterparts hold the waked values.

/// Wind speed at a point (m/s)
pub const WS: &str = "WS";
/// Wind direction (degrees, meteorological: direction the wind comes from)
pub const WD: &str = "WD";
/// Turbulence intensity
pub const TI: &str = "TI";
/// Air density (kg/m³)
pub const RHO: &str = "RHO";
/// Statistical weight of a state
pub const WEIGHT: &str = "weight";

/// Easting (m)
pub const X: &str = "X";
/// Northing (m)
pub const Y: &str = "Y";
/// Height above ground (m)
pub const Z: &str = "Z";
/// Hub height (m)
pub const H: &str = "H";
/// Rotor diameter (m)
pub const D: &str = "D";

/// Downwind order: turbine index visited at each slot
pub const ORDER: &str = "order";

/// Rotor-equivalent wind speed (m/s)
pub const REWS: &str = "REWS";
/// Power (kW)
pub const P: &str = "P";
/// Thrust coefficient
pub const CT: &str = "CT";

/// Ambient wind speed at a target point
pub const AMB_WS: &str = "AMB_WS";
/// Ambient turbulence intensity
pub const AMB_TI: &str = "AMB_TI";
/// Ambient air density
pub const AMB_RHO: &str = "AMB_RHO";
/// Ambient rotor-equivalent wind speed
pub const AMB_REWS: &str = "AMB_REWS";
/// Power at ambient inflow
pub const AMB_P: &str = "AMB_P";
/// Thrust coefficient at ambient inflow
pub const AMB_CT: &str = "AMB_CT";

/// Farm variables produced by the wake accumulation
pub const FARM_OUTPUTS: [&str; 11] = [
    REWS, TI, RHO, CT, P, AMB_REWS, AMB_TI, AMB_RHO, AMB_CT, AMB_P, ORDER,
];

/// Point variables produced by the point wake calculation
pub const POINT_OUTPUTS: [&str; 4] = [WS, TI, AMB_WS, AMB_TI];

/// Ambient counterpart of a waked variable
#[must_use]
pub fn amb(var: &str) -> Option<&'static str> {
    match var {
        REWS => Some(AMB_REWS),
        WS => Some(AMB_WS),
        TI => Some(AMB_TI),
        RHO => Some(AMB_RHO),
        P => Some(AMB_P),
        CT => Some(AMB_CT),
        _ => None,
    }
}

//! Molar masses and mass conversions between species.

use crate::FloatValue;
use num::Float;

/// Molar mass of methane (g / mol)
pub const MOLAR_MASS_CH4: FloatValue = 16.043;
/// Molar mass of carbon dioxide (g / mol)
pub const MOLAR_MASS_CO2: FloatValue = 44.009;
/// Molar mass of nitrous oxide (g / mol)
pub const MOLAR_MASS_N2O: FloatValue = 44.013;
/// Molar mass of sulfur dioxide (g / mol)
pub const MOLAR_MASS_SO2: FloatValue = 64.066;
/// Molar mass of carbon (g / mol)
pub const MOLAR_MASS_C: FloatValue = 12.011;
/// Molar mass of ammonia (g / mol)
pub const MOLAR_MASS_NH3: FloatValue = 17.031;
/// Molar mass of nitrogen dioxide (g / mol)
pub const MOLAR_MASS_NO2: FloatValue = 46.006;
/// Molar mass of carbon monoxide (g / mol)
pub const MOLAR_MASS_CO: FloatValue = 28.010;

pub const TONNES_PER_MT: FloatValue = 1e6;
pub const TONNES_PER_GT: FloatValue = 1e9;

/// Re-express a mass of one species as the equivalent mass of another.
///
/// $$ \Delta_{target} = \Delta_{source} \cdot s \cdot \frac{M_{target}}{M_{source}} $$
///
/// Where:
/// - $M$ are the molar masses of the two species
/// - $s$ converts between the native unit scales of the two species
///
/// This assumes one mole of the source species yields one mole of the target, e.g. the
/// complete combustion of methane to carbon dioxide. Inputs must be finite.
///
/// ```
/// use ch4pulse_core::units::{convert_mass, MOLAR_MASS_CH4, MOLAR_MASS_CO2};
///
/// // 0.25 MtCH4 burned releases ~0.000686 GtCO2
/// let co2 = convert_mass(0.25, MOLAR_MASS_CH4, MOLAR_MASS_CO2, 1e-3);
/// assert!((co2 - 0.25e-3 * 44.009 / 16.043).abs() < 1e-15);
/// ```
pub fn convert_mass<T: Float>(
    delta_source: T,
    molar_mass_source: T,
    molar_mass_target: T,
    unit_scale: T,
) -> T {
    delta_source * unit_scale * (molar_mass_target / molar_mass_source)
}

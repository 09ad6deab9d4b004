//! Standard emitted species.
//!
//! Species names follow the convention of the emissions archives consumed by
//! the simulator (`"CO2 FFI"`, `"CH4"`, ...). Each definition carries the native
//! emissions unit, the molar mass of the emitted compound and the number of
//! tonnes in one native mass unit, which together are enough to re-express a
//! mass of one species as an equivalent mass of another.
//!
//! ```
//! use ch4pulse_core::species::{lookup_species, SPECIES_CH4, SPECIES_CO2_FFI};
//!
//! assert_eq!(SPECIES_CH4.unit, "MtCH4 / yr");
//! assert_eq!(SPECIES_CH4.unit_scale_to(&SPECIES_CO2_FFI), 1e-3);
//! assert!(lookup_species("CO2 FFI").is_some());
//! ```

use crate::units::{
    MOLAR_MASS_C, MOLAR_MASS_CH4, MOLAR_MASS_CO, MOLAR_MASS_CO2, MOLAR_MASS_N2O, MOLAR_MASS_NH3,
    MOLAR_MASS_NO2, MOLAR_MASS_SO2, TONNES_PER_GT, TONNES_PER_MT,
};
use crate::FloatValue;

/// Static definition of an emitted species
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesDefinition {
    /// Name used on the species axis of an emissions series
    pub name: &'static str,
    /// Native emissions unit
    pub unit: &'static str,
    /// Molar mass of the emitted compound (g / mol), if it is a single compound
    pub molar_mass: Option<FloatValue>,
    /// Tonnes in one native mass unit (1e6 for Mt, 1e9 for Gt)
    pub tonnes_per_unit: FloatValue,
}

impl SpeciesDefinition {
    pub const fn new(
        name: &'static str,
        unit: &'static str,
        molar_mass: Option<FloatValue>,
        tonnes_per_unit: FloatValue,
    ) -> Self {
        Self {
            name,
            unit,
            molar_mass,
            tonnes_per_unit,
        }
    }

    /// Factor converting a mass in this species' native unit scale into `other`'s scale.
    ///
    /// This only rescales the unit prefix (Mt vs Gt); it does not account for molar mass.
    pub fn unit_scale_to(&self, other: &SpeciesDefinition) -> FloatValue {
        self.tonnes_per_unit / other.tonnes_per_unit
    }
}

macro_rules! define_species {
    (
        $var_name:ident,
        name = $name:expr,
        unit = $unit:expr,
        molar_mass = $molar_mass:expr,
        tonnes_per_unit = $scale:expr $(,)?
    ) => {
        #[doc = concat!("Standard species definition for ", $name)]
        pub static $var_name: SpeciesDefinition =
            SpeciesDefinition::new($name, $unit, $molar_mass, $scale);
    };
}

define_species!(
    SPECIES_CO2_FFI,
    name = "CO2 FFI",
    unit = "GtCO2 / yr",
    molar_mass = Some(MOLAR_MASS_CO2),
    tonnes_per_unit = TONNES_PER_GT,
);

define_species!(
    SPECIES_CO2_AFOLU,
    name = "CO2 AFOLU",
    unit = "GtCO2 / yr",
    molar_mass = Some(MOLAR_MASS_CO2),
    tonnes_per_unit = TONNES_PER_GT,
);

define_species!(
    SPECIES_CH4,
    name = "CH4",
    unit = "MtCH4 / yr",
    molar_mass = Some(MOLAR_MASS_CH4),
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_N2O,
    name = "N2O",
    unit = "MtN2O / yr",
    molar_mass = Some(MOLAR_MASS_N2O),
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_SULFUR,
    name = "Sulfur",
    unit = "MtSO2 / yr",
    molar_mass = Some(MOLAR_MASS_SO2),
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_BC,
    name = "BC",
    unit = "MtBC / yr",
    molar_mass = Some(MOLAR_MASS_C),
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_OC,
    name = "OC",
    unit = "MtOC / yr",
    molar_mass = Some(MOLAR_MASS_C),
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_NH3,
    name = "NH3",
    unit = "MtNH3 / yr",
    molar_mass = Some(MOLAR_MASS_NH3),
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_NOX,
    name = "NOx",
    unit = "MtNO2 / yr",
    molar_mass = Some(MOLAR_MASS_NO2),
    tonnes_per_unit = TONNES_PER_MT,
);

// A mixture, so no single molar mass
define_species!(
    SPECIES_VOC,
    name = "VOC",
    unit = "MtVOC / yr",
    molar_mass = None,
    tonnes_per_unit = TONNES_PER_MT,
);

define_species!(
    SPECIES_CO,
    name = "CO",
    unit = "MtCO / yr",
    molar_mass = Some(MOLAR_MASS_CO),
    tonnes_per_unit = TONNES_PER_MT,
);

/// All standard species, in the order they appear on a default species axis
pub static STANDARD_SPECIES: [&SpeciesDefinition; 11] = [
    &SPECIES_CO2_FFI,
    &SPECIES_CO2_AFOLU,
    &SPECIES_CH4,
    &SPECIES_N2O,
    &SPECIES_SULFUR,
    &SPECIES_BC,
    &SPECIES_OC,
    &SPECIES_NH3,
    &SPECIES_NOX,
    &SPECIES_VOC,
    &SPECIES_CO,
];

/// Look up a standard species by name
pub fn lookup_species(name: &str) -> Option<&'static SpeciesDefinition> {
    STANDARD_SPECIES
        .iter()
        .copied()
        .find(|species| species.name == name)
}

/// Names of all standard species
pub fn standard_species_names() -> Vec<String> {
    STANDARD_SPECIES
        .iter()
        .map(|species| species.name.to_string())
        .collect()
}

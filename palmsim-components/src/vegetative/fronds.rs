//! Fronds
//!
//! The fronds carry the canopy: their count and the leaf area per frond set
//! the leaf area index, which together with the day's radiation determines
//! the production of assimilates for the whole palm.
//!
//! # Algorithm
//!
//! Leaf area per frond follows a Gompertz curve of palm age $t$ (years),
//!
//! $$ A(t) = a e^{-b e^{-c t}} $$
//!
//! and frond initiation decays towards an asymptotic rate,
//!
//! $$ R(t) = \min\left(R_{max},\ a (1 + b e^{-c t})\right) $$
//!
//! Fronds are pruned back to a target count that declines from a young-palm
//! to a mature-palm value over `time_mature_canopy` years.
//!
//! Canopy gross assimilation is computed SUCROS-style (Goudriaan & Van Laar,
//! 1994): a five point Gaussian integration over the daylight hours and over
//! canopy depth, splitting leaves into sunlit and shaded fractions, each with
//! a negative exponential light response.

use super::Organ;
use crate::environment::DailyWeather;
use crate::parameters::FrondParameters;
use palmsim_core::define_static_variable;
use palmsim_core::errors::{ensure_non_negative, PalmSimResult};
use palmsim_core::interpolate::curves::{decay_to_asymptote, gompertz};
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};

/// Abscissae of the five point Gaussian integration on [0, 1].
const GAUSS_POINTS: [FloatValue; 5] = [0.047, 0.231, 0.5, 0.769, 0.953];
/// Weights of the five point Gaussian integration.
const GAUSS_WEIGHTS: [FloatValue; 5] = [0.118, 0.239, 0.284, 0.239, 0.118];

/// Scattering coefficient of leaves for PAR.
const SCATTERING: FloatValue = 0.2;

/// Molar mass ratio CH2O : CO2.
const CH2O_PER_CO2: FloatValue = 30.0 / 44.0;

/// Fronds of a hectare of palms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fronds {
    parameters: FrondParameters,
    /// unit: kg_DM/ha
    mass: FloatValue,
    /// unit: 1/ha
    count: FloatValue,
    /// unit: kg_CH2O/ha/day
    assim_growth: FloatValue,
    /// unit: kg_CH2O/ha/day
    gross_assimilation: FloatValue,
    /// unit: kg_CH2O/ha/day
    assim_produced: FloatValue,
    /// Daily PAR of the last assimilation
    /// unit: MJ/m2/day
    par: FloatValue,
}

impl Fronds {
    pub fn new() -> Self {
        Self::from_parameters(
            FrondParameters::default(),
            StepContext::standalone().planting_density,
        )
    }

    /// Fronds of a freshly planted stand of `planting_density` palms/ha.
    pub fn from_parameters(parameters: FrondParameters, planting_density: FloatValue) -> Self {
        Self {
            mass: planting_density * parameters.initial_mass_per_palm,
            count: planting_density * parameters.initial_count_per_palm,
            parameters,
            assim_growth: 0.0,
            gross_assimilation: 0.0,
            assim_produced: 0.0,
            par: 0.0,
        }
    }

    pub fn parameters(&self) -> &FrondParameters {
        &self.parameters
    }

    /// unit: 1/ha
    pub fn count(&self) -> FloatValue {
        self.count
    }

    pub fn count_per_palm(&self, context: &StepContext) -> FloatValue {
        self.count / context.planting_density
    }

    /// Frond initiation rate (1/palm/day).
    pub fn initiation_rate(&self, context: &StepContext) -> FloatValue {
        let p = &self.parameters;
        let yearly = decay_to_asymptote(
            context.years_after_planting(),
            p.initiation_rate_a,
            p.initiation_rate_b,
            p.initiation_rate_c,
        )
        .min(p.initiation_rate_max);
        yearly / context.days_in_year
    }

    /// Days between consecutive frond initiations.
    pub fn plastochron(&self, context: &StepContext) -> FloatValue {
        1.0 / self.initiation_rate(context)
    }

    /// unit: 1/ha/day
    pub fn count_growth_rate(&self, context: &StepContext) -> FloatValue {
        self.initiation_rate(context) * context.planting_density
    }

    /// Target frond count per palm.
    pub fn goal_count_per_palm(&self, context: &StepContext) -> FloatValue {
        let p = &self.parameters;
        let t_relative =
            context.days_after_planting / (context.days_in_year * p.time_mature_canopy);
        0.01_f64.powf(t_relative) * (p.fronds_goal_count_t0 - p.fronds_goal_count_t1)
            + p.fronds_goal_count_t1
    }

    /// unit: 1/ha
    pub fn goal_count(&self, context: &StepContext) -> FloatValue {
        context.planting_density * self.goal_count_per_palm(context)
    }

    /// Pruning that brings the count back to its target over one step (1/ha/day).
    pub fn prune_rate(&self, context: &StepContext) -> FloatValue {
        let available = self.count + self.count_growth_rate(context) * context.dt;
        (available - self.goal_count(context)).max(0.0) / context.dt
    }

    /// Pruning in terms of frond dry mass (kg_DM/ha/day).
    pub fn prune_rate_mass(&self, context: &StepContext) -> FloatValue {
        if self.count > 0.0 {
            self.prune_rate(context) / self.count * self.mass
        } else {
            0.0
        }
    }

    pub fn prune_rate_rachis_mass(&self, context: &StepContext) -> FloatValue {
        self.parameters.fraction_rachis * self.prune_rate_mass(context)
    }

    pub fn prune_rate_leaflets_mass(&self, context: &StepContext) -> FloatValue {
        self.parameters.fraction_leaflets * self.prune_rate_mass(context)
    }

    /// Leaf area of a single frond (m2).
    pub fn mean_leaf_area(&self, context: &StepContext) -> FloatValue {
        let p = &self.parameters;
        gompertz(
            context.years_after_planting(),
            p.leaf_area_a,
            p.leaf_area_b,
            p.leaf_area_c,
        )
    }

    /// unit: m2/ha
    pub fn total_leaf_area(&self, context: &StepContext) -> FloatValue {
        self.mean_leaf_area(context) * self.count
    }

    pub fn leaf_area_per_palm(&self, context: &StepContext) -> FloatValue {
        self.total_leaf_area(context) / context.planting_density
    }

    pub fn leaf_area_index(&self, context: &StepContext) -> FloatValue {
        1e-4 * self.total_leaf_area(context)
    }

    /// Fraction of PAR intercepted by the canopy (Lambert-Beer).
    pub fn fraction_intercepted(&self, context: &StepContext) -> FloatValue {
        1.0 - (-self.parameters.k * self.leaf_area_index(context)).exp()
    }

    /// Intercepted PAR of the last assimilation (GJ/ha/day).
    pub fn intercepted_par(&self, context: &StepContext) -> FloatValue {
        10.0 * self.fraction_intercepted(context) * self.par
    }

    /// Light use efficiency of the last assimilation (g_CH2O/MJ).
    pub fn light_use_efficiency(&self) -> FloatValue {
        if self.par > 0.0 {
            0.1 * self.gross_assimilation / self.par
        } else {
            0.0
        }
    }

    /// Leaf photosynthesis rate at irradiance `par` (ug_CH2O/m2/s).
    pub fn light_response(&self, par: FloatValue) -> FloatValue {
        let fm = self.parameters.asymptotic_photosynthesis_rate;
        let efficiency = self.parameters.initial_light_efficiency;
        CH2O_PER_CO2 * fm * (1.0 - (-efficiency * par / fm).exp())
    }

    /// Instantaneous canopy gross assimilation (ug_CH2O/m2/s).
    ///
    /// Core physics of the canopy, independent of any state but the leaf
    /// parameters.
    ///
    /// # Arguments
    ///
    /// * `lai` - Leaf area index
    /// * `sine_solar_height` - Sine of the solar elevation
    /// * `fraction_diffuse` - Diffuse share of the irradiance
    /// * `par` - Photosynthetically active irradiance (J/m2/s)
    pub fn canopy_assimilation(
        &self,
        lai: FloatValue,
        sine_solar_height: FloatValue,
        fraction_diffuse: FloatValue,
        par: FloatValue,
    ) -> FloatValue {
        if lai <= 0.0 || sine_solar_height <= 0.0 || par <= 0.0 {
            return 0.0;
        }
        let kdf = self.parameters.k;
        let sinb = sine_solar_height;

        let par_diffuse = par * fraction_diffuse;
        let par_direct = par * (1.0 - fraction_diffuse);

        let sqv = (1.0 - SCATTERING).sqrt();
        let reflection_horizontal = (1.0 - sqv) / (1.0 + sqv);
        let reflection_spherical = reflection_horizontal * 2.0 / (1.0 + 2.0 * sinb);
        let cluster_factor = kdf / (0.8 * sqv);
        let kbl = (0.5 / sinb) * cluster_factor;
        let kdrt = kbl * sqv;

        let mut total = 0.0;
        for (xg, wg) in GAUSS_POINTS.iter().zip(GAUSS_WEIGHTS.iter()) {
            let depth = xg * lai;

            let absorbed_diffuse =
                (1.0 - reflection_horizontal) * par_diffuse * kdf * (-kdf * depth).exp();
            let absorbed_total_direct =
                (1.0 - reflection_spherical) * par_direct * kdrt * (-kdrt * depth).exp();
            let absorbed_direct_direct =
                (1.0 - SCATTERING) * par_direct * kbl * (-kbl * depth).exp();

            // Shaded leaves receive diffuse plus scattered direct light
            let shaded = absorbed_diffuse + (absorbed_total_direct - absorbed_direct_direct);
            let assimilation_shaded = self.light_response(shaded);

            // Sunlit leaves additionally receive direct light at random angles
            let perpendicular = (1.0 - SCATTERING) * par_direct / sinb;
            let assimilation_sunlit: FloatValue = GAUSS_POINTS
                .iter()
                .zip(GAUSS_WEIGHTS.iter())
                .map(|(xs, ws)| ws * self.light_response(shaded + perpendicular * xs))
                .sum();

            let fraction_sunlit = cluster_factor * (-kbl * depth).exp();
            let leaf_assimilation = fraction_sunlit * assimilation_sunlit
                + (1.0 - fraction_sunlit) * assimilation_shaded;
            total += wg * leaf_assimilation;
        }
        total * lai
    }

    /// Daily canopy gross assimilation (kg_CH2O/ha/day).
    pub fn total_gross_assimilation(
        &self,
        context: &StepContext,
        day: &DailyWeather,
    ) -> FloatValue {
        let lai = self.leaf_area_index(context);
        let dawn = day.hour_of_dawn();
        let daylength = day.daylength();

        GAUSS_POINTS
            .iter()
            .zip(GAUSS_WEIGHTS.iter())
            .map(|(xg, wg)| {
                let hour = dawn + xg * daylength;
                let rate = self.canopy_assimilation(
                    lai,
                    day.sine_solar_height(hour),
                    day.fraction_diffuse_at(hour),
                    day.par_at(hour),
                );
                3600.0 * 1e-9 * 1e4 * rate * wg * daylength
            })
            .sum()
    }

    /// Produce the day's assimilates, reduced by the water stress factor.
    ///
    /// Returns the assimilates produced (kg_CH2O/ha/day).
    pub fn assimilate(
        &mut self,
        context: &StepContext,
        day: &DailyWeather,
        water_stress_factor: FloatValue,
    ) -> FloatValue {
        self.par = day.par();
        self.gross_assimilation = self.total_gross_assimilation(context, day);
        self.assim_produced = water_stress_factor.clamp(0.0, 1.0) * self.gross_assimilation;
        self.assim_produced
    }

    /// unit: kg_CH2O/ha/day
    pub fn assim_produced(&self) -> FloatValue {
        self.assim_produced
    }

    pub fn gross_assimilation(&self) -> FloatValue {
        self.gross_assimilation
    }

    /// Potential growth rate (kg_DM/ha/day).
    pub fn potential_growth_rate(&self, context: &StepContext) -> FloatValue {
        12.0 * self.parameters.potential_growth_rate / context.days_in_year
            * context.planting_density
    }

    /// unit: kg_DM/ha/day
    pub fn mass_growth_rate(&self) -> FloatValue {
        self.parameters.conversion_efficiency * self.assim_growth
    }

    pub fn mass_per_palm(&self, context: &StepContext) -> FloatValue {
        self.mass / context.planting_density
    }

    /// unit: kg_DM/frond
    pub fn mass_per_frond(&self) -> FloatValue {
        if self.count > 0.0 {
            self.mass / self.count
        } else {
            0.0
        }
    }
}

impl Default for Fronds {
    fn default() -> Self {
        Self::new()
    }
}

impl Organ for Fronds {
    fn name(&self) -> &'static str {
        "fronds"
    }

    fn mass(&self) -> FloatValue {
        self.mass
    }

    fn potential_sink_strength(&self, context: &StepContext) -> FloatValue {
        self.potential_growth_rate(context) / self.parameters.conversion_efficiency
    }

    fn maintenance_requirement(&self) -> FloatValue {
        let p = &self.parameters;
        (p.specific_maintenance_rachis * p.fraction_rachis
            + p.specific_maintenance_leaflets * p.fraction_leaflets)
            * self.mass
    }

    fn set_assim_growth(&mut self, assim_growth: FloatValue) {
        self.assim_growth = assim_growth;
    }

    fn assim_growth(&self) -> FloatValue {
        self.assim_growth
    }

    fn update(&mut self, context: &StepContext) -> PalmSimResult<()> {
        let mass_change = self.mass_growth_rate() - self.prune_rate_mass(context);
        let count_change = self.count_growth_rate(context) - self.prune_rate(context);

        self.mass += mass_change * context.dt;
        self.count += count_change * context.dt;
        ensure_non_negative("fronds", "mass", self.mass)?;
        ensure_non_negative("fronds", "count", self.count)
    }
}

define_static_variable!(

    VAR_FRONDS_MASS,

    name = "fronds_mass",

    unit = "kg_DM/ha",

    description = "Dry mass of the fronds",

);
define_static_variable!(
    VAR_FRONDS_MASS_PER_PALM,
    name = "fronds_mass_per_palm",
    unit = "kg_DM/palm",
    description = "Frond dry mass per palm",
);
define_static_variable!(
    VAR_FRONDS_COUNT,
    name = "fronds_count",
    unit = "1/ha",
    description = "Number of fronds",
);
define_static_variable!(
    VAR_FRONDS_COUNT_PER_PALM,
    name = "fronds_count_per_palm",
    unit = "1/palm",
    description = "Number of fronds per palm",
);
define_static_variable!(
    VAR_FRONDS_GOAL_COUNT_PER_PALM,
    name = "fronds_goal_count_per_palm",
    unit = "1/palm",
    description = "Target frond count after pruning",
);
define_static_variable!(
    VAR_FRONDS_INITIATION_RATE,
    name = "fronds_initiation_rate",
    unit = "1/palm/day",
    description = "Frond initiation rate",
);
define_static_variable!(
    VAR_FRONDS_PLASTOCHRON,
    name = "fronds_plastochron",
    unit = "day",
    description = "Days between frond initiations",
);
define_static_variable!(
    VAR_FRONDS_PRUNE_RATE,
    name = "fronds_prune_rate",
    unit = "1/ha/day",
    description = "Frond pruning rate",
);
define_static_variable!(
    VAR_FRONDS_PRUNE_RACHIS,
    name = "fronds_prune_rate_rachis_mass",
    unit = "kg_DM/ha/day",
    description = "Pruned rachis dry mass",
);
define_static_variable!(
    VAR_FRONDS_PRUNE_LEAFLETS,
    name = "fronds_prune_rate_leaflets_mass",
    unit = "kg_DM/ha/day",
    description = "Pruned leaflet dry mass",
);
define_static_variable!(
    VAR_FRONDS_MEAN_LEAF_AREA,
    name = "fronds_mean_leaf_area",
    unit = "m2/frond",
    description = "Leaf area per frond",
);
define_static_variable!(
    VAR_FRONDS_LEAF_AREA_PER_PALM,
    name = "fronds_leaf_area_per_palm",
    unit = "m2/palm",
    description = "Leaf area per palm",
);
define_static_variable!(
    VAR_FRONDS_LAI,
    name = "fronds_leaf_area_index",
    unit = "1",
    description = "Leaf area index",
);
define_static_variable!(
    VAR_FRONDS_FRACTION_INTERCEPTED,
    name = "fronds_fraction_intercepted",
    unit = "1",
    description = "Fraction of PAR intercepted",
);
define_static_variable!(
    VAR_FRONDS_INTERCEPTED_PAR,
    name = "fronds_intercepted_PAR",
    unit = "GJ/ha/day",
    description = "Intercepted PAR",
);
define_static_variable!(
    VAR_FRONDS_LUE,
    name = "fronds_LUE",
    unit = "g_CH2O/MJ",
    description = "Light use efficiency",
);
define_static_variable!(
    VAR_FRONDS_GROSS_ASSIMILATION,
    name = "fronds_total_gross_assimilation",
    unit = "kg_CH2O/ha/day",
    description = "Canopy gross assimilation",
);
define_static_variable!(
    VAR_FRONDS_ASSIM_PRODUCED,
    name = "fronds_assim_produced",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates produced after water stress",
);
define_static_variable!(
    VAR_FRONDS_ASSIM_GROWTH,
    name = "fronds_assim_growth",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates allocated to frond growth",
);
define_static_variable!(
    VAR_FRONDS_POTENTIAL_SINK,
    name = "fronds_potential_sink_strength",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of the fronds",
);
define_static_variable!(
    VAR_FRONDS_MAINTENANCE,
    name = "fronds_maintenance_requirement",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of the fronds",
);

impl Reportable for Fronds {
    fn report(&self, context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_FRONDS_MASS.report(self.mass),
            VAR_FRONDS_MASS_PER_PALM.report(self.mass_per_palm(context)),
            VAR_FRONDS_COUNT.report(self.count),
            VAR_FRONDS_COUNT_PER_PALM.report(self.count_per_palm(context)),
            VAR_FRONDS_GOAL_COUNT_PER_PALM.report(self.goal_count_per_palm(context)),
            VAR_FRONDS_INITIATION_RATE.report(self.initiation_rate(context)),
            VAR_FRONDS_PLASTOCHRON.report(self.plastochron(context)),
            VAR_FRONDS_PRUNE_RATE.report(self.prune_rate(context)),
            VAR_FRONDS_PRUNE_RACHIS.report(self.prune_rate_rachis_mass(context)),
            VAR_FRONDS_PRUNE_LEAFLETS.report(self.prune_rate_leaflets_mass(context)),
            VAR_FRONDS_MEAN_LEAF_AREA.report(self.mean_leaf_area(context)),
            VAR_FRONDS_LEAF_AREA_PER_PALM.report(self.leaf_area_per_palm(context)),
            VAR_FRONDS_LAI.report(self.leaf_area_index(context)),
            VAR_FRONDS_FRACTION_INTERCEPTED.report(self.fraction_intercepted(context)),
            VAR_FRONDS_INTERCEPTED_PAR.report(self.intercepted_par(context)),
            VAR_FRONDS_LUE.report(self.light_use_efficiency()),
            VAR_FRONDS_GROSS_ASSIMILATION.report(self.gross_assimilation),
            VAR_FRONDS_ASSIM_PRODUCED.report(self.assim_produced),
            VAR_FRONDS_ASSIM_GROWTH.report(self.assim_growth),
            VAR_FRONDS_POTENTIAL_SINK.report(self.potential_sink_strength(context)),
            VAR_FRONDS_MAINTENANCE.report(self.maintenance_requirement()),
        ]
    }
}

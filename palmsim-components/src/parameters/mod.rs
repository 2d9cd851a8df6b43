//! Component parameters
//!
//! Each component is built from an immutable parameter struct. Defaults are
//! literature values for oil palm grown on mineral soils in South-East Asia.
//! Every struct rejects unknown keys when deserialised.

mod assimilates;
mod bunch_components;
mod fronds;
mod generative;
mod roots;
mod soil;
mod trunk;
mod weather;

pub use assimilates::AssimilateParameters;
pub use bunch_components::{BunchComponentParameters, BunchComponentsParameters};
pub use fronds::FrondParameters;
pub use generative::{FemaleParameters, GenerativeParameters, IndeterminateParameters};
pub use roots::RootParameters;
pub use soil::SoilParameters;
pub use trunk::TrunkParameters;
pub use weather::WeatherParameters;

#[cfg(test)]
mod tests {
    use super::*;
    use palmsim_core::config::{from_toml_str, Validate};

    #[test]
    fn defaults_are_valid() {
        assert!(FrondParameters::default().validate().is_ok());
        assert!(TrunkParameters::default().validate().is_ok());
        assert!(RootParameters::default().validate().is_ok());
        assert!(GenerativeParameters::default().validate().is_ok());
        assert!(IndeterminateParameters::default().validate().is_ok());
        assert!(FemaleParameters::default().validate().is_ok());
        assert!(BunchComponentsParameters::default().validate().is_ok());
        assert!(AssimilateParameters::default().validate().is_ok());
        assert!(SoilParameters::default().validate().is_ok());
        assert!(WeatherParameters::default().validate().is_ok());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let params: TrunkParameters = from_toml_str("mass_loss_rate = 0.5").unwrap();
        assert_eq!(params.mass_loss_rate, 0.5);
        assert_eq!(params.conversion_efficiency, 0.69);
        assert_eq!(params.potential_growth_curve.len(), 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<GenerativeParameters>("onset_tme = 30.0").is_err());
        assert!(serde_json::from_str::<AssimilateParameters>(r#"{"priority": 0.5}"#).is_err());
    }

    #[test]
    fn nested_component_tables() {
        let params: BunchComponentsParameters = from_toml_str(
            r#"
            [kernel]
            conversion_efficiency = 0.5
            potential_mass_fraction = 0.05
            specific_maintenance = 0.0022
            t_growth_start = 0.85
            t_growth_end = 0.975
            "#,
        )
        .unwrap();
        assert_eq!(params.kernel.conversion_efficiency, 0.5);
        assert_eq!(params.kernel.t_growth_start, 0.85);
        assert_eq!(params.stalk.t_growth_end, 0.75);
        // A partial component table is incomplete
        let partial = "[kernel]\nconversion_efficiency = 0.5\n";
        assert!(from_toml_str::<BunchComponentsParameters>(partial).is_err());
    }

    #[test]
    fn parameters_survive_json() {
        let params = FemaleParameters {
            enable_bunch_failure: false,
            ..FemaleParameters::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let restored: FemaleParameters = serde_json::from_str(&json).unwrap();
        assert!(!restored.enable_bunch_failure);
        assert_eq!(restored.t_anthesis, params.t_anthesis);
    }
}

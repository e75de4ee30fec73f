use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub const DEFAULT_GRID_CELL_SIZE: f64 = 64.0;
pub const DEFAULT_UNIT_LOOKUP_CELL_SIZE: f64 = 4.0;

/// Distance criteria for bonds inferred from geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondConfig {
    /// Multiplier on the summed covalent radii.
    pub covalent_tolerance: f64,
    pub max_bond_length: f64,
    /// Pairs closer than this are treated as overlapping atoms, not bonds.
    pub min_bond_length: f64,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            covalent_tolerance: 1.15,
            max_bond_length: 4.0,
            min_bond_length: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureConfig {
    /// Cell size for water partitioning and the whole-structure unit lookup.
    pub grid_cell_size: Vector3<f64>,
    /// Cell size of each unit's element lookup.
    pub unit_lookup_cell_size: f64,
    pub bond: BondConfig,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: Vector3::repeat(DEFAULT_GRID_CELL_SIZE),
            unit_lookup_cell_size: DEFAULT_UNIT_LOOKUP_CELL_SIZE,
            bond: BondConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct StructureConfigBuilder {
    grid_cell_size: Option<Vector3<f64>>,
    unit_lookup_cell_size: Option<f64>,
    covalent_tolerance: Option<f64>,
    max_bond_length: Option<f64>,
    min_bond_length: Option<f64>,
}

impl StructureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid_cell_size(mut self, size: f64) -> Self {
        self.grid_cell_size = Some(Vector3::repeat(size));
        self
    }
    pub fn grid_cell_size_xyz(mut self, size: Vector3<f64>) -> Self {
        self.grid_cell_size = Some(size);
        self
    }
    pub fn unit_lookup_cell_size(mut self, size: f64) -> Self {
        self.unit_lookup_cell_size = Some(size);
        self
    }
    pub fn covalent_tolerance(mut self, tolerance: f64) -> Self {
        self.covalent_tolerance = Some(tolerance);
        self
    }
    pub fn max_bond_length(mut self, length: f64) -> Self {
        self.max_bond_length = Some(length);
        self
    }
    pub fn min_bond_length(mut self, length: f64) -> Self {
        self.min_bond_length = Some(length);
        self
    }

    pub fn build(self) -> Result<StructureConfig, ConfigError> {
        let defaults = StructureConfig::default();
        let config = StructureConfig {
            grid_cell_size: self.grid_cell_size.unwrap_or(defaults.grid_cell_size),
            unit_lookup_cell_size: self
                .unit_lookup_cell_size
                .unwrap_or(defaults.unit_lookup_cell_size),
            bond: BondConfig {
                covalent_tolerance: self
                    .covalent_tolerance
                    .unwrap_or(defaults.bond.covalent_tolerance),
                max_bond_length: self
                    .max_bond_length
                    .unwrap_or(defaults.bond.max_bond_length),
                min_bond_length: self
                    .min_bond_length
                    .unwrap_or(defaults.bond.min_bond_length),
            },
        };

        if config.grid_cell_size.iter().any(|c| !(*c > 0.0)) {
            return Err(positive("grid_cell_size", config.grid_cell_size.min()));
        }
        require_positive("unit_lookup_cell_size", config.unit_lookup_cell_size)?;
        require_positive("covalent_tolerance", config.bond.covalent_tolerance)?;
        require_positive("max_bond_length", config.bond.max_bond_length)?;
        if !(config.bond.min_bond_length >= 0.0)
            || config.bond.min_bond_length >= config.bond.max_bond_length
        {
            return Err(ConfigError::InvalidParameter {
                name: "min_bond_length",
                reason: format!(
                    "must be in [0, max_bond_length), got {}",
                    config.bond.min_bond_length
                ),
            });
        }
        Ok(config)
    }
}

fn positive(name: &'static str, value: f64) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: format!("must be positive, got {value}"),
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(positive(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default_config() {
        let config = StructureConfigBuilder::new().build().unwrap();
        assert_eq!(config, StructureConfig::default());
        assert_eq!(config.grid_cell_size, Vector3::repeat(64.0));
        assert_eq!(config.unit_lookup_cell_size, 4.0);
        assert_eq!(config.bond.covalent_tolerance, 1.15);
    }

    #[test]
    fn builder_applies_overrides() {
        let config = StructureConfigBuilder::new()
            .grid_cell_size(32.0)
            .unit_lookup_cell_size(5.0)
            .covalent_tolerance(1.3)
            .max_bond_length(3.0)
            .min_bond_length(0.5)
            .build()
            .unwrap();
        assert_eq!(config.grid_cell_size, Vector3::repeat(32.0));
        assert_eq!(config.unit_lookup_cell_size, 5.0);
        assert_eq!(config.bond.covalent_tolerance, 1.3);
        assert_eq!(config.bond.max_bond_length, 3.0);
        assert_eq!(config.bond.min_bond_length, 0.5);
    }

    #[test]
    fn non_positive_cell_sizes_are_rejected() {
        let err = StructureConfigBuilder::new()
            .grid_cell_size(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "grid_cell_size",
                ..
            }
        ));
        assert!(
            StructureConfigBuilder::new()
                .unit_lookup_cell_size(-1.0)
                .build()
                .is_err()
        );
        assert!(
            StructureConfigBuilder::new()
                .grid_cell_size_xyz(Vector3::new(1.0, f64::NAN, 1.0))
                .build()
                .is_err()
        );
    }

    #[test]
    fn min_bond_length_must_stay_below_max() {
        let err = StructureConfigBuilder::new()
            .max_bond_length(2.0)
            .min_bond_length(2.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "min_bond_length",
                ..
            }
        ));
    }
}

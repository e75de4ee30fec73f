use crate::cli::StructureArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use structura::engine::config::{StructureConfig, StructureConfigBuilder};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialBondConfig {
    covalent_tolerance: Option<f64>,
    max_bond_length: Option<f64>,
    min_bond_length: Option<f64>,
}

/// File form of [`StructureConfig`]; every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialStructureConfig {
    grid_cell_size: Option<f64>,
    unit_lookup_cell_size: Option<f64>,
    bond: Option<PartialBondConfig>,
}

impl PartialStructureConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the optional config file and applies `-S` overrides on top.
    pub fn resolve(args: &StructureArgs) -> Result<StructureConfig> {
        let partial = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        partial.merge_with_cli(&args.set_values)
    }

    pub fn merge_with_cli(mut self, set_values: &[String]) -> Result<StructureConfig> {
        self.apply_set_values(set_values)?;

        let mut builder = StructureConfigBuilder::new();
        if let Some(size) = self.grid_cell_size {
            builder = builder.grid_cell_size(size);
        }
        if let Some(size) = self.unit_lookup_cell_size {
            builder = builder.unit_lookup_cell_size(size);
        }
        let bond = self.bond.unwrap_or_default();
        if let Some(v) = bond.covalent_tolerance {
            builder = builder.covalent_tolerance(v);
        }
        if let Some(v) = bond.max_bond_length {
            builder = builder.max_bond_length(v);
        }
        if let Some(v) = bond.min_bond_length {
            builder = builder.min_bond_length(v);
        }
        builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let value: f64 = value_str.trim().parse().map_err(|_| {
                CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
            })?;

            match key.trim() {
                "grid-cell-size" => self.grid_cell_size = Some(value),
                "unit-lookup-cell-size" => self.unit_lookup_cell_size = Some(value),
                "bond.covalent-tolerance" => {
                    self.bond
                        .get_or_insert_with(Default::default)
                        .covalent_tolerance = Some(value);
                }
                "bond.max-bond-length" => {
                    self.bond
                        .get_or_insert_with(Default::default)
                        .max_bond_length = Some(value);
                }
                "bond.min-bond-length" => {
                    self.bond
                        .get_or_insert_with(Default::default)
                        .min_bond_length = Some(value);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

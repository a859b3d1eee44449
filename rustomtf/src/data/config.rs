//! Run-time configuration of the track-finder processors.
//!
//! Loaded once per run and read-only afterwards; every quantity the input
//! makers and the ghost buster consult lives here.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use itertools::izip;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use omtfcore::geometry::detid::DetId;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The Phase-2 drift-tube primitives replace the legacy ones; feeding
    /// both would double every drift-tube stub.
    #[error("usePhase2DtPrimitives requires dropLegacyDtPrimitives")]
    Phase2WithoutDrop,
    #[error("{processors} processors configured, but {entries} phi-zero entries")]
    PhiZeroTable { processors: usize, entries: usize },
    #[error("configuration file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration of one track-finder job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Number of phi bins of the hardware scale, full circle.
    pub n_phi_bins: i32,
    /// Logical layers seen by the pattern matcher.
    pub n_layers: u32,
    /// Input slots per logical layer.
    pub n_inputs: u32,
    /// Processors per detector side.
    pub n_processors: u32,
    /// Accepted bunch-crossing window, inclusive, relative to the
    /// triggering collision.
    pub bx_from: i32,
    pub bx_to: i32,
    /// Minimal quality for a drift-tube phi primitive to produce a stub.
    pub min_dt_phi_quality: u32,
    /// Minimal quality for the drift-tube bending angle to be trusted.
    pub min_dt_phi_b_quality: u32,
    /// Hardware layer number to logical layer. Hardware layers without an
    /// entry are invisible to the trigger.
    pub hw_to_logic_layer: BTreeMap<u32, u32>,
    /// Phi code of each processor's scale origin.
    pub processor_phi_zeros: Vec<i32>,
    /// Fold the theta measurement into the drift-tube phi stub.
    pub merge_phi_and_theta: bool,
    pub use_phase2_dt_primitives: bool,
    pub drop_legacy_dt_primitives: bool,
    pub drop_csc_primitives: bool,
    pub drop_rpc_primitives: bool,
    /// Candidates closer than this in hardware phi bins duplicate each
    /// other during ghost busting.
    pub ghost_bust_phi_margin: i32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        // hardware layer numbers of the chambers the overlap region reads,
        // paired with the logical layers the pattern bank was trained on
        let hw = [0u32, 2, 4, 10, 11, 12, 13, 20, 21, 22, 25, 26, 27];
        let logic = [0u32, 2, 4, 9, 6, 7, 8, 10, 12, 14, 15, 16, 17];
        let hw_to_logic_layer: BTreeMap<u32, u32> = izip!(hw, logic).collect();

        TriggerConfig {
            n_phi_bins: 5400,
            n_layers: 18,
            n_inputs: 14,
            n_processors: 6,
            bx_from: 0,
            bx_to: 0,
            min_dt_phi_quality: 2,
            min_dt_phi_b_quality: 4,
            hw_to_logic_layer,
            processor_phi_zeros: vec![0, 900, 1800, 2700, 3600, 4500],
            merge_phi_and_theta: true,
            use_phase2_dt_primitives: true,
            drop_legacy_dt_primitives: true,
            drop_csc_primitives: false,
            drop_rpc_primitives: false,
            ghost_bust_phi_margin: 8,
        }
    }
}

impl TriggerConfig {
    /// Checks the configuration for internal consistency. Failures here are
    /// fatal at startup, never per event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_phase2_dt_primitives && !self.drop_legacy_dt_primitives {
            return Err(ConfigError::Phase2WithoutDrop);
        }
        if self.processor_phi_zeros.len() != self.n_processors as usize {
            return Err(ConfigError::PhiZeroTable {
                processors: self.n_processors as usize,
                entries: self.processor_phi_zeros.len(),
            });
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<TriggerConfig, ConfigError> {
        let file = File::open(path)?;
        let config: TriggerConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        info!(processors = config.n_processors, layers = config.n_layers, "trigger configuration loaded");
        Ok(config)
    }

    /// Hardware layer number of a chamber.
    pub fn layer_hw_number(&self, det_id: &DetId) -> u32 {
        match det_id {
            DetId::Dt(id) => 2 * (id.station - 1) as u32,
            DetId::Csc(id) => match (id.station, id.ring) {
                (1, 2) => 10,
                (1, 3) => 11,
                (2, 2) => 12,
                (3, 2) => 13,
                _ => 19,
            },
            DetId::Rpc(id) => {
                if id.region == 0 {
                    20 + (id.station - 1) as u32
                } else {
                    25 + (id.station - 1) as u32
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use omtfcore::geometry::detid::{CscDetId, DtChamberId, RpcDetId};

    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(TriggerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_phase2_without_drop_is_fatal() {
        let config = TriggerConfig { drop_legacy_dt_primitives: false, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Phase2WithoutDrop)));
    }

    #[test]
    fn test_phi_zero_table_must_match_processor_count() {
        let config = TriggerConfig { processor_phi_zeros: vec![0, 900], ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::PhiZeroTable { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let config = TriggerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: TriggerConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.n_phi_bins, config.n_phi_bins);
        assert_eq!(back.hw_to_logic_layer, config.hw_to_logic_layer);
        assert_eq!(back.processor_phi_zeros, config.processor_phi_zeros);
    }

    #[test]
    fn test_from_json_file_validates() {
        let bad = TriggerConfig { drop_legacy_dt_primitives: false, ..Default::default() };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&bad).unwrap()).unwrap();

        let result = TriggerConfig::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Phase2WithoutDrop)));
    }

    #[test]
    fn test_layer_hw_numbers() {
        let config = TriggerConfig::default();

        let mb1 = config.layer_hw_number(&DetId::Dt(DtChamberId::new(2, 1, 4)));
        assert_eq!(mb1, 0);
        assert_eq!(config.hw_to_logic_layer.get(&mb1), Some(&0));

        // the fourth drift-tube station has no logical layer
        let mb4 = config.layer_hw_number(&DetId::Dt(DtChamberId::new(2, 4, 4)));
        assert_eq!(config.hw_to_logic_layer.get(&mb4), None);

        let me12 = config.layer_hw_number(&DetId::Csc(CscDetId::new(1, 1, 2, 8)));
        assert_eq!(config.hw_to_logic_layer.get(&me12), Some(&9));

        let rb1 = config.layer_hw_number(&DetId::Rpc(RpcDetId::new(0, 2, 1, 4, 1, 0, 1)));
        assert_eq!(config.hw_to_logic_layer.get(&rb1), Some(&10));

        let re1 = config.layer_hw_number(&DetId::Rpc(RpcDetId::new(1, 2, 1, 4, 1, 1, 1)));
        assert_eq!(config.hw_to_logic_layer.get(&re1), Some(&15));
    }
}

//! Building per-processor stub containers from one event's primitives.
//!
//! The input maker owns one digi-to-stub converter per detector technology
//! and the angle converter they share; the chamber geometry stays borrowed
//! from the framework for the whole epoch.

use std::f64::consts::PI;

use tracing::info;

use omtfcore::algorithm::angles::AngleConverter;
use omtfcore::data::digi::EventDigis;
use omtfcore::data::stub::StubContainer;
use omtfcore::error::OmtfError;
use omtfcore::geometry::chamber::{CscGeometry, DtGeometry, RpcGeometry};
use omtfcore::geometry::detid::{CscDetId, DetId, DtChamberId, RpcDetId};

use crate::data::config::{ConfigError, TriggerConfig};
use crate::input::csc::CscDigiToStubsConverter;
use crate::input::dt::DtDigiToStubsConverter;
use crate::input::rpc::RpcDigiToStubsConverter;

/// Detector side a processor serves; the overlap region exists on both
/// ends of the barrel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorSide {
    Positive,
    Negative,
}

/// One digi-to-stub converter per detector technology.
pub trait DigiToStubsConverter: Sync {
    /// Converts this technology's primitives into stubs for one processor,
    /// honoring the configured bunch-crossing window.
    fn make_stubs(
        &self,
        container: &mut StubContainer,
        event: &EventDigis,
        angle_converter: &AngleConverter<'_>,
        i_processor: u32,
        side: ProcessorSide,
    ) -> Result<(), OmtfError>;
}

/// Position of a 1-based azimuthal unit inside the processor window that
/// starts at the 0-based unit `first`, on a circle of `n_units`.
fn window_position(unit: i32, n_units: i32, first: i32) -> u32 {
    (unit - 1 - first).rem_euclid(n_units) as u32
}

fn dt_window_start(config: &TriggerConfig, i_processor: u32) -> i32 {
    (12 / config.n_processors * i_processor) as i32
}

fn csc_window_start(config: &TriggerConfig, i_processor: u32) -> i32 {
    (36 / config.n_processors * i_processor) as i32
}

/// Endcap resistive-plate chambers count 1 to 36 through (sector,
/// subsector).
fn rpc_endcap_chamber(det_id: &RpcDetId) -> i32 {
    (det_id.sector - 1) * 6 + det_id.subsector
}

/// Does a drift-tube chamber feed this processor's input window? Only the
/// outermost wheels reach into the overlap region; azimuthally a processor
/// reads its own sectors plus the following one.
pub fn accept_dt_digi(config: &TriggerConfig, chamber: &DtChamberId, i_processor: u32, side: ProcessorSide) -> bool {
    let wheel_ok = match side {
        ProcessorSide::Positive => chamber.wheel == 2,
        ProcessorSide::Negative => chamber.wheel == -2,
    };
    let span = (12 / config.n_processors) as u32;
    wheel_ok && window_position(chamber.sector, 12, dt_window_start(config, i_processor)) <= span
}

pub fn accept_csc_digi(config: &TriggerConfig, det_id: &CscDetId, i_processor: u32, side: ProcessorSide) -> bool {
    let endcap_ok = match side {
        ProcessorSide::Positive => det_id.endcap == 1,
        ProcessorSide::Negative => det_id.endcap == 2,
    };
    let span = (36 / config.n_processors) as u32;
    endcap_ok && window_position(det_id.chamber, 36, csc_window_start(config, i_processor)) <= span
}

pub fn accept_rpc_digi(config: &TriggerConfig, det_id: &RpcDetId, i_processor: u32, side: ProcessorSide) -> bool {
    let region_ok = match side {
        ProcessorSide::Positive => (det_id.region == 0 && det_id.ring == 2) || det_id.region == 1,
        ProcessorSide::Negative => (det_id.region == 0 && det_id.ring == -2) || det_id.region == -1,
    };
    let window_ok = if det_id.region == 0 {
        let span = (12 / config.n_processors) as u32;
        window_position(det_id.sector, 12, dt_window_start(config, i_processor)) <= span
    } else {
        let span = (36 / config.n_processors) as u32;
        window_position(rpc_endcap_chamber(det_id), 36, csc_window_start(config, i_processor)) <= span
    };
    region_ok && window_ok
}

/// Input slot of a chamber inside its processor window. Drift tubes and
/// barrel plates take every other slot, so a second stub of the same
/// chamber can fall over to the next one.
pub fn input_number(config: &TriggerConfig, det_id: &DetId, i_processor: u32) -> u32 {
    match det_id {
        DetId::Dt(id) => 2 * window_position(id.sector, 12, dt_window_start(config, i_processor)),
        DetId::Rpc(id) if id.region == 0 => {
            2 * window_position(id.sector, 12, dt_window_start(config, i_processor))
        }
        DetId::Rpc(id) => window_position(rpc_endcap_chamber(id), 36, csc_window_start(config, i_processor)),
        DetId::Csc(id) => window_position(id.chamber, 36, csc_window_start(config, i_processor)),
    }
}

pub fn processor_phi_zero(config: &TriggerConfig, i_processor: u32) -> i32 {
    config.processor_phi_zeros[i_processor as usize]
}

/// Folds a phi code into [-nBins/2, nBins/2).
fn fold_phi(phi: i32, n_phi_bins: i32) -> i32 {
    let phi = phi.rem_euclid(n_phi_bins);
    if phi >= n_phi_bins / 2 {
        phi - n_phi_bins
    } else {
        phi
    }
}

/// Processor-relative phi code of an in-sector drift-tube measurement.
///
/// The contract towards the pattern bank: one discretized integer on the
/// hardware phi scale, built from the 30-degree centre of the 0-based
/// readout sector, the raw in-sector phi in units of 1/4096 rad, and the
/// processor's phi zero.
pub fn processor_phi(config: &TriggerConfig, i_processor: u32, sector: i32, raw_phi: i32) -> i32 {
    let bins_per_rad = config.n_phi_bins as f64 / (2.0 * PI);
    let phi = sector as f64 * PI / 6.0 + raw_phi as f64 / 4096.0;
    fold_phi(
        (phi * bins_per_rad).round() as i32 - processor_phi_zero(config, i_processor),
        config.n_phi_bins,
    )
}

/// Processor-relative phi code of a global azimuth, for technologies whose
/// phi comes straight from geometry.
pub fn processor_phi_from_global(config: &TriggerConfig, i_processor: u32, phi: f64) -> i32 {
    let bins_per_rad = config.n_phi_bins as f64 / (2.0 * PI);
    fold_phi(
        (phi * bins_per_rad).round() as i32 - processor_phi_zero(config, i_processor),
        config.n_phi_bins,
    )
}

/// Collects the stubs of one event for the processors of one side.
pub struct InputMaker<'a> {
    config: &'a TriggerConfig,
    angle_converter: AngleConverter<'a>,
    converters: Vec<Box<dyn DigiToStubsConverter + 'a>>,
}

impl<'a> InputMaker<'a> {
    /// Fails on an inconsistent configuration; that is a startup error,
    /// never a per-event condition.
    pub fn new(
        config: &'a TriggerConfig,
        dt_geometry: &'a dyn DtGeometry,
        csc_geometry: &'a dyn CscGeometry,
        rpc_geometry: &'a dyn RpcGeometry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut converters: Vec<Box<dyn DigiToStubsConverter + 'a>> = Vec::new();
        if config.use_phase2_dt_primitives {
            converters.push(Box::new(DtDigiToStubsConverter::new(config)));
        }
        if !config.drop_csc_primitives {
            converters.push(Box::new(CscDigiToStubsConverter::new(config)));
        }
        if !config.drop_rpc_primitives {
            converters.push(Box::new(RpcDigiToStubsConverter::new(config)));
        }
        info!(converters = converters.len(), "constructing input maker");

        Ok(InputMaker {
            config,
            angle_converter: AngleConverter::new(dt_geometry, csc_geometry, rpc_geometry),
            converters,
        })
    }

    pub fn config(&self) -> &TriggerConfig {
        self.config
    }

    /// Builds the stub container of one processor for one event.
    pub fn build_stubs(
        &self,
        event: &EventDigis,
        i_processor: u32,
        side: ProcessorSide,
    ) -> Result<StubContainer, OmtfError> {
        let mut container = StubContainer::new(self.config.n_layers as usize, self.config.n_inputs as usize);
        for converter in &self.converters {
            converter.make_stubs(&mut container, event, &self.angle_converter, i_processor, side)?;
        }
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dt_acceptance_requires_outermost_wheel() {
        let config = TriggerConfig::default();

        assert!(accept_dt_digi(&config, &DtChamberId::new(2, 1, 1), 0, ProcessorSide::Positive));
        assert!(!accept_dt_digi(&config, &DtChamberId::new(1, 1, 1), 0, ProcessorSide::Positive));
        assert!(!accept_dt_digi(&config, &DtChamberId::new(2, 1, 1), 0, ProcessorSide::Negative));
        assert!(accept_dt_digi(&config, &DtChamberId::new(-2, 1, 1), 0, ProcessorSide::Negative));
    }

    #[test]
    fn test_dt_sector_window_wraps() {
        let config = TriggerConfig::default();

        // processor 0 reads sectors 1 to 3
        assert!(accept_dt_digi(&config, &DtChamberId::new(2, 1, 3), 0, ProcessorSide::Positive));
        assert!(!accept_dt_digi(&config, &DtChamberId::new(2, 1, 4), 0, ProcessorSide::Positive));
        // processor 5 reads sectors 11, 12 and wraps to 1
        assert!(accept_dt_digi(&config, &DtChamberId::new(2, 1, 1), 5, ProcessorSide::Positive));
        assert!(!accept_dt_digi(&config, &DtChamberId::new(2, 1, 2), 5, ProcessorSide::Positive));
    }

    #[test]
    fn test_csc_acceptance_follows_endcap() {
        let config = TriggerConfig::default();
        let id = CscDetId::new(1, 1, 2, 3);

        assert!(accept_csc_digi(&config, &id, 0, ProcessorSide::Positive));
        assert!(!accept_csc_digi(&config, &id, 0, ProcessorSide::Negative));
        // chamber 8 belongs to the next processor
        assert!(!accept_csc_digi(&config, &CscDetId::new(1, 1, 2, 8), 0, ProcessorSide::Positive));
        assert!(accept_csc_digi(&config, &CscDetId::new(1, 1, 2, 8), 1, ProcessorSide::Positive));
    }

    #[test]
    fn test_rpc_acceptance_barrel_and_endcap() {
        let config = TriggerConfig::default();

        let barrel = RpcDetId::new(0, 2, 1, 2, 1, 0, 1);
        assert!(accept_rpc_digi(&config, &barrel, 0, ProcessorSide::Positive));
        // the wrong wheel never reaches the overlap region
        let inner = RpcDetId::new(0, 1, 1, 2, 1, 0, 1);
        assert!(!accept_rpc_digi(&config, &inner, 0, ProcessorSide::Positive));

        let endcap = RpcDetId::new(1, 2, 1, 1, 1, 3, 1);
        assert!(accept_rpc_digi(&config, &endcap, 0, ProcessorSide::Positive));
        assert!(!accept_rpc_digi(&config, &endcap, 0, ProcessorSide::Negative));
    }

    #[test]
    fn test_input_number_spacing() {
        let config = TriggerConfig::default();

        // drift tubes leave a fall-over slot between chambers
        assert_eq!(input_number(&config, &DetId::Dt(DtChamberId::new(2, 1, 1)), 0), 0);
        assert_eq!(input_number(&config, &DetId::Dt(DtChamberId::new(2, 1, 2)), 0), 2);
        assert_eq!(input_number(&config, &DetId::Dt(DtChamberId::new(2, 1, 3)), 0), 4);

        assert_eq!(input_number(&config, &DetId::Csc(CscDetId::new(1, 1, 2, 3)), 0), 2);
    }

    #[test]
    fn test_fold_phi_is_symmetric_around_zero() {
        assert_eq!(fold_phi(0, 5400), 0);
        assert_eq!(fold_phi(2699, 5400), 2699);
        assert_eq!(fold_phi(2700, 5400), -2700);
        assert_eq!(fold_phi(-1, 5400), -1);
        assert_eq!(fold_phi(5399, 5400), -1);
    }

    #[test]
    fn test_processor_phi_is_relative_to_phi_zero() {
        let config = TriggerConfig::default();

        // sector 0 at raw phi 0 sits exactly at processor 0's phi zero
        assert_eq!(processor_phi(&config, 0, 0, 0), 0);
        // processor 1's origin is 900 bins further
        assert_eq!(processor_phi(&config, 1, 0, 0), -900);
        // one radian inside the sector is 4096 raw units
        let one_rad_bins = (5400.0 / (2.0 * PI)).round() as i32;
        assert_eq!(processor_phi(&config, 0, 0, 4096), one_rad_bins);
    }

    #[test]
    fn test_processor_phi_from_global_wraps() {
        let config = TriggerConfig::default();

        assert_eq!(processor_phi_from_global(&config, 0, 0.0), 0);
        // -pi and +pi land on the same code
        let at_pi = processor_phi_from_global(&config, 0, PI);
        let at_minus_pi = processor_phi_from_global(&config, 0, -PI);
        assert_eq!(at_pi, at_minus_pi);
    }
}

//! Drift-tube trigger primitives to stubs.

use omtfcore::algorithm::angles::AngleConverter;
use omtfcore::data::digi::{DtPhDigi, DtThetaDigi, DtThetaDigiCollection, EventDigis, DT_PHASE2_BX_CENTRE};
use omtfcore::data::stub::{Stub, StubContainer, StubType};
use omtfcore::error::OmtfError;
use omtfcore::geometry::detid::DetId;

use crate::data::config::TriggerConfig;
use crate::input::maker::{accept_dt_digi, input_number, processor_phi, DigiToStubsConverter, ProcessorSide};

/// Converts Phase-2 drift-tube phi primitives into stubs, with the theta
/// measurement folded in (merged mode).
pub struct DtDigiToStubsConverter<'a> {
    config: &'a TriggerConfig,
}

impl<'a> DtDigiToStubsConverter<'a> {
    pub fn new(config: &'a TriggerConfig) -> Self {
        DtDigiToStubsConverter { config }
    }

    fn add_dt_phi_digi(
        &self,
        container: &mut StubContainer,
        digi: &DtPhDigi,
        theta_digis: &DtThetaDigiCollection,
        angle_converter: &AngleConverter<'_>,
        i_processor: u32,
    ) -> Result<(), OmtfError> {
        if digi.quality < self.config.min_dt_phi_quality {
            return Ok(());
        }

        let chamber = digi.chamber_id();
        let det_id = DetId::Dt(chamber);

        // chambers without a logical layer are invisible to the trigger
        let hw_number = self.config.layer_hw_number(&det_id);
        let Some(&i_layer) = self.config.hw_to_logic_layer.get(&hw_number) else {
            return Ok(());
        };
        let i_input = input_number(self.config, &det_id, i_processor);

        let bx = digi.bx - DT_PHASE2_BX_CENTRE;
        let eta_hw = angle_converter.global_eta_dt(&chamber, theta_digis, bx)?;

        // the Phase-2 bending angle comes as 2048 == 1.4 rad, the pattern
        // bank expects 512 == 1 rad
        let phi_b_hw = if digi.quality >= self.config.min_dt_phi_b_quality {
            (digi.phi_bend as f64 * 1.4 * 512.0 / 2048.0).round() as i32
        } else {
            self.config.n_phi_bins
        };

        let stub = Stub {
            stub_type: StubType::DtPhiEta,
            phi_hw: processor_phi(self.config, i_processor, digi.sector, digi.phi),
            phi_b_hw,
            eta_hw,
            quality_hw: digi.quality,
            bx,
            logic_layer: i_layer,
            det_id,
        };
        container.add_stub(i_layer as usize, i_input as usize, stub);
        Ok(())
    }

    /// Stand-alone theta stubs for the unmerged mode.
    ///
    /// In merged mode the theta measurement travels inside the phi stub;
    /// the stand-alone emission is an open extension point and deliberately
    /// produces nothing yet.
    fn add_dt_eta_stubs(&self, _container: &mut StubContainer, _digi: &DtThetaDigi, _i_processor: u32) {}
}

impl DigiToStubsConverter for DtDigiToStubsConverter<'_> {
    fn make_stubs(
        &self,
        container: &mut StubContainer,
        event: &EventDigis,
        angle_converter: &AngleConverter<'_>,
        i_processor: u32,
        side: ProcessorSide,
    ) -> Result<(), OmtfError> {
        for digi in &event.dt_ph {
            if !accept_dt_digi(self.config, &digi.chamber_id(), i_processor, side) {
                continue;
            }
            // Phase-2 primitives are centred at bx 20, recentre before the
            // window cut
            let bx = digi.bx - DT_PHASE2_BX_CENTRE;
            if bx >= self.config.bx_from && bx <= self.config.bx_to {
                self.add_dt_phi_digi(container, digi, &event.dt_th, angle_converter, i_processor)?;
            }
        }

        if !self.config.merge_phi_and_theta {
            for theta_digi in &event.dt_th.digis {
                if theta_digi.bx >= self.config.bx_from && theta_digi.bx <= self.config.bx_to {
                    self.add_dt_eta_stubs(container, theta_digi, i_processor);
                }
            }
        }

        Ok(())
    }
}

//! Cathode-strip trigger primitives to stubs.

use omtfcore::algorithm::angles::AngleConverter;
use omtfcore::data::digi::{EventDigis, CSC_CENTRAL_BX};
use omtfcore::data::stub::{Stub, StubContainer, StubType};
use omtfcore::error::OmtfError;
use omtfcore::geometry::detid::DetId;

use crate::data::config::TriggerConfig;
use crate::input::maker::{
    accept_csc_digi, input_number, processor_phi_from_global, DigiToStubsConverter, ProcessorSide,
};

/// Converts cathode-strip correlated primitives into stubs.
pub struct CscDigiToStubsConverter<'a> {
    config: &'a TriggerConfig,
}

impl<'a> CscDigiToStubsConverter<'a> {
    pub fn new(config: &'a TriggerConfig) -> Self {
        CscDigiToStubsConverter { config }
    }
}

impl DigiToStubsConverter for CscDigiToStubsConverter<'_> {
    fn make_stubs(
        &self,
        container: &mut StubContainer,
        event: &EventDigis,
        angle_converter: &AngleConverter<'_>,
        i_processor: u32,
        side: ProcessorSide,
    ) -> Result<(), OmtfError> {
        for (csc_id, digi) in &event.csc {
            if !accept_csc_digi(self.config, csc_id, i_processor, side) {
                continue;
            }

            let bx = digi.bx - CSC_CENTRAL_BX;
            if bx < self.config.bx_from || bx > self.config.bx_to {
                continue;
            }

            let det_id = DetId::Csc(*csc_id);
            let hw_number = self.config.layer_hw_number(&det_id);
            let Some(&i_layer) = self.config.hw_to_logic_layer.get(&hw_number) else {
                continue;
            };

            let conversion = angle_converter.global_eta_csc(csc_id, digi)?;

            let stub = Stub {
                stub_type: StubType::Csc,
                phi_hw: processor_phi_from_global(self.config, i_processor, conversion.phi),
                phi_b_hw: 0,
                eta_hw: conversion.eta_code,
                quality_hw: digi.quality,
                bx,
                logic_layer: i_layer,
                det_id,
            };
            let i_input = input_number(self.config, &det_id, i_processor);
            container.add_stub(i_layer as usize, i_input as usize, stub);
        }

        Ok(())
    }
}

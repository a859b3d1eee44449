//! Resistive-plate trigger primitives to stubs.

use omtfcore::algorithm::angles::AngleConverter;
use omtfcore::data::digi::EventDigis;
use omtfcore::data::stub::{Stub, StubContainer, StubType};
use omtfcore::error::OmtfError;
use omtfcore::geometry::detid::DetId;

use crate::data::config::TriggerConfig;
use crate::input::maker::{
    accept_rpc_digi, input_number, processor_phi_from_global, DigiToStubsConverter, ProcessorSide,
};

/// Converts resistive-plate strip hits into stubs.
///
/// Hits are taken strip by strip; neighbouring strips are not clustered
/// here, so a stub carries no quality beyond its presence.
pub struct RpcDigiToStubsConverter<'a> {
    config: &'a TriggerConfig,
}

impl<'a> RpcDigiToStubsConverter<'a> {
    pub fn new(config: &'a TriggerConfig) -> Self {
        RpcDigiToStubsConverter { config }
    }
}

impl DigiToStubsConverter for RpcDigiToStubsConverter<'_> {
    fn make_stubs(
        &self,
        container: &mut StubContainer,
        event: &EventDigis,
        angle_converter: &AngleConverter<'_>,
        i_processor: u32,
        side: ProcessorSide,
    ) -> Result<(), OmtfError> {
        for (rpc_id, digi) in &event.rpc {
            if !accept_rpc_digi(self.config, rpc_id, i_processor, side) {
                continue;
            }

            // the strip hits are already relative to the trigger crossing
            if digi.bx < self.config.bx_from || digi.bx > self.config.bx_to {
                continue;
            }

            let det_id = DetId::Rpc(*rpc_id);
            let hw_number = self.config.layer_hw_number(&det_id);
            let Some(&i_layer) = self.config.hw_to_logic_layer.get(&hw_number) else {
                continue;
            };

            let conversion = angle_converter.global_eta_rpc(rpc_id, digi.strip)?;

            let stub = Stub {
                stub_type: StubType::Rpc,
                phi_hw: processor_phi_from_global(self.config, i_processor, conversion.phi),
                phi_b_hw: 0,
                eta_hw: conversion.eta_code,
                quality_hw: 0,
                bx: digi.bx,
                logic_layer: i_layer,
                det_id,
            };
            let i_input = input_number(self.config, &det_id, i_processor);
            container.add_stub(i_layer as usize, i_input as usize, stub);
        }

        Ok(())
    }
}

//! Per-event driver.

use rayon::prelude::*;

use omtfcore::data::digi::EventDigis;
use omtfcore::data::stub::StubContainer;
use omtfcore::error::OmtfError;

use crate::input::maker::{InputMaker, ProcessorSide};

/// Builds the stub containers of every processor of one side for one event.
///
/// Processors are independent: each owns its container exclusively and the
/// geometry is shared read-only, so the fan-out is one worker per
/// processor. A geometry failure on any processor fails the whole event; a
/// partial set of containers would corrupt the pattern-match statistics
/// downstream.
pub fn process_event(
    input_maker: &InputMaker<'_>,
    event: &EventDigis,
    side: ProcessorSide,
) -> Result<Vec<StubContainer>, OmtfError> {
    (0..input_maker.config().n_processors)
        .into_par_iter()
        .map(|i_processor| input_maker.build_stubs(event, i_processor, side))
        .collect()
}

#[cfg(test)]
mod tests {
    use omtfcore::data::digi::DtPhDigi;
    use omtfcore::geometry::chamber::{
        CscGeometry, CscLayerGeometry, DtChamberGeometry, DtGeometry, RpcGeometry, RpcRollGeometry,
    };
    use omtfcore::geometry::detid::{CscDetId, DtChamberId, RpcDetId};
    use omtfcore::geometry::point::GlobalPoint;

    use crate::data::config::TriggerConfig;

    use super::*;

    struct TestDtChamber;

    impl DtChamberGeometry for TestDtChamber {
        fn n_cells(&self, superlayer: u32) -> u32 {
            if superlayer == 2 {
                57
            } else {
                72
            }
        }

        fn theta_cell_position(&self, cell: u32) -> GlobalPoint {
            let eta = 0.8 + 0.01 * cell as f64;
            let theta = 2.0 * (-eta).exp().atan();
            GlobalPoint::from_polar(theta, 0.0, 700.0)
        }
    }

    struct TestDtGeometry {
        chamber: TestDtChamber,
        present: bool,
    }

    impl DtGeometry for TestDtGeometry {
        fn chamber(&self, _id: &DtChamberId) -> Option<&dyn DtChamberGeometry> {
            self.present.then_some(&self.chamber as &dyn DtChamberGeometry)
        }
    }

    struct NoCscGeometry;

    impl CscGeometry for NoCscGeometry {
        fn key_layer(&self, _id: &CscDetId) -> Option<&dyn CscLayerGeometry> {
            None
        }
    }

    struct NoRpcGeometry;

    impl RpcGeometry for NoRpcGeometry {
        fn roll(&self, _id: &RpcDetId) -> Option<&dyn RpcRollGeometry> {
            None
        }
    }

    fn one_digi_event() -> EventDigis {
        // sector 2: inside processor 0's window and nobody else's overlap
        EventDigis {
            dt_ph: vec![DtPhDigi { wheel: 2, station: 1, sector: 1, phi: 0, phi_bend: 0, quality: 6, bx: 20 }],
            ..Default::default()
        }
    }

    #[test]
    fn test_one_container_per_processor() {
        let config = TriggerConfig::default();
        let dt_geometry = TestDtGeometry { chamber: TestDtChamber, present: true };
        let csc_geometry = NoCscGeometry;
        let rpc_geometry = NoRpcGeometry;
        let input_maker = InputMaker::new(&config, &dt_geometry, &csc_geometry, &rpc_geometry).unwrap();

        let containers = process_event(&input_maker, &one_digi_event(), ProcessorSide::Positive).unwrap();

        assert_eq!(containers.len(), 6);
        assert_eq!(containers[0].stub_count(), 1);
        assert!(containers[1..].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_missing_geometry_fails_the_whole_event() {
        let config = TriggerConfig::default();
        let dt_geometry = TestDtGeometry { chamber: TestDtChamber, present: false };
        let csc_geometry = NoCscGeometry;
        let rpc_geometry = NoRpcGeometry;
        let input_maker = InputMaker::new(&config, &dt_geometry, &csc_geometry, &rpc_geometry).unwrap();

        let result = process_event(&input_maker, &one_digi_event(), ProcessorSide::Positive);
        assert!(matches!(result, Err(OmtfError::Geometry(_))));
    }

    #[test]
    fn test_inconsistent_configuration_fails_at_startup() {
        let config = TriggerConfig { drop_legacy_dt_primitives: false, ..Default::default() };
        let dt_geometry = TestDtGeometry { chamber: TestDtChamber, present: true };
        let csc_geometry = NoCscGeometry;
        let rpc_geometry = NoRpcGeometry;

        assert!(InputMaker::new(&config, &dt_geometry, &csc_geometry, &rpc_geometry).is_err());
    }
}

use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::detid::DetId;

/// Detector technology that produced a stub; decides which quantization
/// rule filled the angle fields.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum StubType {
    /// Drift-tube phi measurement only.
    DtPhi,
    /// Drift-tube theta measurement only.
    DtTheta,
    /// Drift-tube phi with the theta measurement folded in (merged mode).
    DtPhiEta,
    Csc,
    Rpc,
}

impl Display for StubType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StubType::DtPhi => write!(f, "DtPhi"),
            StubType::DtTheta => write!(f, "DtTheta"),
            StubType::DtPhiEta => write!(f, "DtPhiEta"),
            StubType::Csc => write!(f, "Csc"),
            StubType::Rpc => write!(f, "Rpc"),
        }
    }
}

/// A single discretized hit observation, fed to pattern matching.
///
/// Immutable after construction; it occupies at most one
/// (logic layer, input slot) cell of the per-event [`StubContainer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stub {
    pub stub_type: StubType,
    /// Processor-relative azimuth code.
    pub phi_hw: i32,
    /// Bending-angle code; the number of phi bins marks a stub without bend
    /// data.
    pub phi_b_hw: i32,
    /// Global pseudorapidity code.
    pub eta_hw: i32,
    /// Quality code of the source primitive.
    pub quality_hw: u32,
    /// Bunch crossing relative to the triggering collision.
    pub bx: i32,
    /// Detector-agnostic layer index used by the pattern matcher.
    pub logic_layer: u32,
    /// Originating chamber, kept for diagnostics.
    pub det_id: DetId,
}

impl Display for Stub {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stub({} layer {} phiHw {} phiBHw {} etaHw {} q {} bx {} {})",
            self.stub_type, self.logic_layer, self.phi_hw, self.phi_b_hw, self.eta_hw, self.quality_hw, self.bx, self.det_id
        )
    }
}

/// Per-event, per-processor grid of stubs: zero or one stub per
/// (logic layer, input slot). Created at event start, discarded with the
/// event.
#[derive(Clone, Debug, Default)]
pub struct StubContainer {
    layers: Vec<Vec<Option<Arc<Stub>>>>,
}

impl StubContainer {
    pub fn new(n_layers: usize, n_inputs: usize) -> Self {
        StubContainer { layers: vec![vec![None; n_inputs]; n_layers] }
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn n_inputs(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.len())
    }

    /// Places a stub at (layer, input). An occupied input falls over to the
    /// next slot once; if that one is taken as well the stub is dropped.
    /// Returns whether the stub was placed.
    pub fn add_stub(&mut self, i_layer: usize, mut i_input: usize, stub: Stub) -> bool {
        let Some(layer) = self.layers.get_mut(i_layer) else {
            return false;
        };
        if i_input < layer.len() && layer[i_input].is_some() {
            i_input += 1;
        }
        match layer.get_mut(i_input) {
            Some(slot) if slot.is_none() => {
                *slot = Some(Arc::new(stub));
                true
            }
            _ => false,
        }
    }

    pub fn stub(&self, i_layer: usize, i_input: usize) -> Option<&Arc<Stub>> {
        self.layers.get(i_layer).and_then(|layer| layer.get(i_input)).and_then(|slot| slot.as_ref())
    }

    /// All filled cells, layer-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Arc<Stub>)> + '_ {
        self.layers.iter().enumerate().flat_map(|(i_layer, layer)| {
            layer
                .iter()
                .enumerate()
                .filter_map(move |(i_input, slot)| slot.as_ref().map(|stub| (i_layer, i_input, stub)))
        })
    }

    pub fn stub_count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::detid::DtChamberId;

    fn dummy_stub(phi_hw: i32) -> Stub {
        Stub {
            stub_type: StubType::DtPhiEta,
            phi_hw,
            phi_b_hw: 0,
            eta_hw: 90,
            quality_hw: 6,
            bx: 0,
            logic_layer: 0,
            det_id: DetId::Dt(DtChamberId::new(2, 1, 4)),
        }
    }

    #[test]
    fn test_add_stub_places_at_requested_cell() {
        let mut container = StubContainer::new(18, 14);

        assert!(container.add_stub(0, 2, dummy_stub(11)));
        assert_eq!(container.stub(0, 2).unwrap().phi_hw, 11);
        assert_eq!(container.stub_count(), 1);
    }

    #[test]
    fn test_add_stub_falls_over_to_next_input_once() {
        let mut container = StubContainer::new(18, 14);

        assert!(container.add_stub(0, 2, dummy_stub(11)));
        assert!(container.add_stub(0, 2, dummy_stub(22)));
        // a third stub for the same cell has nowhere to go
        assert!(!container.add_stub(0, 2, dummy_stub(33)));

        assert_eq!(container.stub(0, 2).unwrap().phi_hw, 11);
        assert_eq!(container.stub(0, 3).unwrap().phi_hw, 22);
        assert_eq!(container.stub_count(), 2);
    }

    #[test]
    fn test_add_stub_out_of_range_is_dropped() {
        let mut container = StubContainer::new(2, 2);

        assert!(!container.add_stub(5, 0, dummy_stub(11)));
        // fall-over past the last input drops too
        assert!(container.add_stub(1, 1, dummy_stub(22)));
        assert!(!container.add_stub(1, 1, dummy_stub(33)));
        assert!(container.stub(1, 1).is_some());
    }

    #[test]
    fn test_iter_yields_layer_major_order() {
        let mut container = StubContainer::new(3, 4);
        container.add_stub(2, 0, dummy_stub(1));
        container.add_stub(0, 3, dummy_stub(2));

        let cells: Vec<(usize, usize)> = container.iter().map(|(l, i, _)| (l, i)).collect();
        assert_eq!(cells, vec![(0, 3), (2, 0)]);
    }
}

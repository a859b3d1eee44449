//! Read-only chamber geometry interfaces.
//!
//! The geometry is owned by the surrounding framework and stays constant for
//! one geometry epoch (typically one run); during event processing it is
//! shared between the processor workers, hence the `Sync` bound on the
//! top-level lookups. An id the geometry cannot resolve is a fatal error on
//! the caller side, never recovered locally.

use crate::geometry::detid::{CscDetId, DtChamberId, RpcDetId};
use crate::geometry::point::{GlobalPoint, LocalPoint};

/// Trigger geometry of one drift-tube chamber.
pub trait DtChamberGeometry {
    /// Number of trigger cells in the given superlayer (1 to 3).
    fn n_cells(&self, superlayer: u32) -> u32;

    /// Global position of the centre of a theta-superlayer cell (1-based).
    fn theta_cell_position(&self, cell: u32) -> GlobalPoint;
}

pub trait DtGeometry: Sync {
    fn chamber(&self, id: &DtChamberId) -> Option<&dyn DtChamberGeometry>;
}

/// Geometry of the key layer of one cathode-strip chamber.
pub trait CscLayerGeometry {
    fn number_of_strips(&self) -> u32;

    /// Angular width of one strip as seen from the beam line, in radians.
    fn strip_phi_pitch(&self) -> f64;

    /// Local crossing point of a strip (1-based) and a wire group.
    fn strip_wire_group_intersection(&self, strip: u32, wire_group: u16) -> LocalPoint;

    /// Global position of the centre of a strip (1-based).
    fn centre_of_strip(&self, strip: u32) -> GlobalPoint;

    fn to_global(&self, point: LocalPoint) -> GlobalPoint;
}

pub trait CscGeometry: Sync {
    fn key_layer(&self, id: &CscDetId) -> Option<&dyn CscLayerGeometry>;
}

/// Geometry of one resistive-plate roll.
pub trait RpcRollGeometry {
    fn centre_of_strip(&self, strip: i32) -> LocalPoint;

    fn to_global(&self, point: LocalPoint) -> GlobalPoint;
}

pub trait RpcGeometry: Sync {
    fn roll(&self, id: &RpcDetId) -> Option<&dyn RpcRollGeometry>;
}

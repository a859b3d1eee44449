//! Digitized trigger primitives as delivered by the event source.
//!
//! One immutable set per event; the fields mirror the detector readout, so
//! sector numbers are 0-based here and only become 1-based on chamber ids.

use serde::{Deserialize, Serialize};

use crate::geometry::detid::{CscDetId, DtChamberId, RpcDetId};

/// Drift-tube phi primitives come centred at this bunch crossing; every
/// consumer recentres to an offset from the triggering collision first.
pub const DT_PHASE2_BX_CENTRE: i32 = 20;

/// Cathode-strip correlated primitives are centred at this bunch crossing.
pub const CSC_CENTRAL_BX: i32 = 8;

/// A drift-tube phi trigger primitive.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DtPhDigi {
    pub wheel: i32,
    pub station: i32,
    /// Readout sector, 0-based.
    pub sector: i32,
    /// In-sector azimuth, units of 1/4096 rad.
    pub phi: i32,
    /// Bending angle, units of 1.4/2048 rad.
    pub phi_bend: i32,
    pub quality: u32,
    /// Raw bunch crossing, centred at [`DT_PHASE2_BX_CENTRE`].
    pub bx: i32,
}

impl DtPhDigi {
    /// Chamber the primitive originates from; the chamber id sector is
    /// 1-based.
    pub fn chamber_id(&self) -> DtChamberId {
        DtChamberId::new(self.wheel, self.station, self.sector + 1)
    }
}

/// A drift-tube theta trigger segment.
///
/// The seven position bits are an OR over groups of theta cells; more than
/// one set bit means the measurement is ambiguous.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DtThetaDigi {
    pub wheel: i32,
    pub station: i32,
    /// Readout sector, 0-based.
    pub sector: i32,
    /// Bunch crossing relative to the triggering collision.
    pub bx: i32,
    pub position: [bool; 7],
}

/// The event's theta segments, searchable by chamber and bunch crossing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DtThetaDigiCollection {
    pub digis: Vec<DtThetaDigi>,
}

impl DtThetaDigiCollection {
    pub fn new(digis: Vec<DtThetaDigi>) -> Self {
        DtThetaDigiCollection { digis }
    }

    /// The theta segment of a chamber at a bunch crossing, if any. The
    /// sector argument is 0-based, as stored on the digis.
    pub fn theta_segment(&self, wheel: i32, station: i32, sector: i32, bx: i32) -> Option<&DtThetaDigi> {
        self.digis
            .iter()
            .find(|d| d.wheel == wheel && d.station == station && d.sector == sector && d.bx == bx)
    }
}

/// A cathode-strip correlated trigger primitive.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CscCorrelatedDigi {
    /// Half-strip position of the key layer hit.
    pub half_strip: u16,
    pub key_wire_group: u16,
    pub quality: u32,
    /// Raw bunch crossing, centred at [`CSC_CENTRAL_BX`].
    pub bx: i32,
}

/// A resistive-plate strip hit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RpcDigi {
    pub strip: u32,
    /// Bunch crossing relative to the triggering collision.
    pub bx: i32,
}

/// All digitized primitives of one event, read-only for its duration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventDigis {
    pub dt_ph: Vec<DtPhDigi>,
    pub dt_th: DtThetaDigiCollection,
    pub csc: Vec<(CscDetId, CscCorrelatedDigi)>,
    pub rpc: Vec<(RpcDetId, RpcDigi)>,
}

impl EventDigis {
    pub fn new(
        dt_ph: Vec<DtPhDigi>,
        dt_th: DtThetaDigiCollection,
        csc: Vec<(CscDetId, CscCorrelatedDigi)>,
        rpc: Vec<(RpcDetId, RpcDigi)>,
    ) -> Self {
        EventDigis { dt_ph, dt_th, csc, rpc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theta_segment_lookup_matches_all_keys() {
        let collection = DtThetaDigiCollection::new(vec![
            DtThetaDigi { wheel: 2, station: 1, sector: 3, bx: 0, position: [false; 7] },
            DtThetaDigi { wheel: 2, station: 2, sector: 3, bx: 0, position: [true; 7] },
        ]);

        assert!(collection.theta_segment(2, 1, 3, 0).is_some());
        // wrong bunch crossing
        assert!(collection.theta_segment(2, 1, 3, 1).is_none());
        // wrong wheel
        assert!(collection.theta_segment(-2, 1, 3, 0).is_none());
    }

    #[test]
    fn test_chamber_id_sector_is_one_based() {
        let digi = DtPhDigi { wheel: -2, station: 3, sector: 0, phi: 0, phi_bend: 0, quality: 6, bx: 20 };
        assert_eq!(digi.chamber_id(), DtChamberId::new(-2, 3, 1));
    }
}

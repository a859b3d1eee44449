use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifier of a drift-tube chamber.
///
/// Wheels run from -2 to +2 along the beam line, stations 1 to 4 outwards,
/// sectors 1 to 12 around the azimuth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DtChamberId {
    pub wheel: i32,
    pub station: i32,
    pub sector: i32,
}

impl DtChamberId {
    pub fn new(wheel: i32, station: i32, sector: i32) -> Self {
        DtChamberId { wheel, station, sector }
    }
}

impl Display for DtChamberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "DT wh{} st{} se{}", self.wheel, self.station, self.sector)
    }
}

/// Identifier of a cathode-strip chamber.
///
/// Endcap 1 sits at +z, endcap 2 at -z; rings count inside out, chambers 1
/// to 36 around the azimuth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CscDetId {
    pub endcap: i32,
    pub station: i32,
    pub ring: i32,
    pub chamber: i32,
}

impl CscDetId {
    pub fn new(endcap: i32, station: i32, ring: i32, chamber: i32) -> Self {
        CscDetId { endcap, station, ring, chamber }
    }
}

impl Display for CscDetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CSC e{} st{} ri{} ch{}", self.endcap, self.station, self.ring, self.chamber)
    }
}

/// Identifier of a resistive-plate chamber roll.
///
/// Region 0 is the barrel (ring = wheel), regions -1/+1 the endcap disks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RpcDetId {
    pub region: i32,
    pub ring: i32,
    pub station: i32,
    pub sector: i32,
    pub layer: i32,
    pub subsector: i32,
    pub roll: i32,
}

impl RpcDetId {
    pub fn new(region: i32, ring: i32, station: i32, sector: i32, layer: i32, subsector: i32, roll: i32) -> Self {
        RpcDetId { region, ring, station, sector, layer, subsector, roll }
    }
}

impl Display for RpcDetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RPC re{} ri{} st{} se{} la{} su{} ro{}",
            self.region, self.ring, self.station, self.sector, self.layer, self.subsector, self.roll
        )
    }
}

/// Detector identifier of any of the three muon technologies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetId {
    Dt(DtChamberId),
    Csc(CscDetId),
    Rpc(RpcDetId),
}

impl DetId {
    /// Packed numeric form, kept on stubs for provenance. The top nibble
    /// tags the technology, the remaining fields are shifted to be
    /// non-negative.
    pub fn raw_id(&self) -> u32 {
        match self {
            DetId::Dt(id) => {
                (1 << 28)
                    | (((id.wheel + 2) as u32) << 16)
                    | ((id.station as u32) << 8)
                    | (id.sector as u32)
            }
            DetId::Csc(id) => {
                (2 << 28)
                    | ((id.endcap as u32) << 16)
                    | ((id.station as u32) << 12)
                    | ((id.ring as u32) << 8)
                    | (id.chamber as u32)
            }
            DetId::Rpc(id) => {
                (3 << 28)
                    | (((id.region + 1) as u32) << 25)
                    | (((id.ring + 2) as u32) << 20)
                    | ((id.station as u32) << 16)
                    | ((id.sector as u32) << 8)
                    | ((id.layer as u32) << 6)
                    | ((id.subsector as u32) << 3)
                    | (id.roll as u32)
            }
        }
    }
}

impl Display for DetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DetId::Dt(id) => write!(f, "{}", id),
            DetId::Csc(id) => write!(f, "{}", id),
            DetId::Rpc(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_ids_are_distinct_across_technologies() {
        let dt = DetId::Dt(DtChamberId::new(2, 1, 4));
        let csc = DetId::Csc(CscDetId::new(1, 1, 2, 4));
        let rpc = DetId::Rpc(RpcDetId::new(0, 2, 1, 4, 1, 0, 1));

        assert_ne!(dt.raw_id(), csc.raw_id());
        assert_ne!(csc.raw_id(), rpc.raw_id());
        assert_ne!(dt.raw_id(), rpc.raw_id());
    }

    #[test]
    fn test_raw_id_distinguishes_wheel_sign() {
        let plus = DetId::Dt(DtChamberId::new(2, 1, 4));
        let minus = DetId::Dt(DtChamberId::new(-2, 1, 4));
        assert_ne!(plus.raw_id(), minus.raw_id());
    }
}

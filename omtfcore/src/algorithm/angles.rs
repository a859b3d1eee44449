//! Conversion of chamber-local hit positions into the discretized global
//! angles consumed by pattern matching.
//!
//! The integer codes must reproduce the hardware emulation bit for bit, so
//! every mapping lives in an explicit table here instead of being derived
//! from geometry at run time.

use std::f64::consts::PI;

use tracing::debug;

use crate::data::digi::{CscCorrelatedDigi, DtThetaDigiCollection};
use crate::error::{OmtfError, Result};
use crate::geometry::chamber::{CscGeometry, CscLayerGeometry, DtGeometry, RpcGeometry};
use crate::geometry::detid::{CscDetId, DetId, DtChamberId, RpcDetId};
use crate::geometry::point::GlobalPoint;

/// Pseudorapidity bin boundaries of the drift-tube wheels, ascending.
const ETA_BOUNDS: [f64; 8] = [0.8, 0.90037, 0.952728, 1.00313, 1.05168, 1.09844, 1.14353, 1.24];

/// Eta code per bin; bit 0 covers magnitudes beyond the outermost boundary.
const ETA_BIT_TO_CODE: [i32; 9] = [115, 110, 103, 99, 94, 90, 85, 78, 73];

/// Code for magnitudes outside every bin, also the ambiguous-theta value.
const ETA_CODE_OUT_OF_RANGE: i32 = 95;

/// Fallback codes when a chamber has no theta segment, stations 1 to 3.
const DT_ETA_DEFAULTS: [i32; 3] = [92, 79, 75];

/// Eta code of a cathode-strip wire group outside every tabulated range.
const CSC_ETA_NO_MATCH: i32 = 121;

/// Bin index of a pseudorapidity magnitude: 0 beyond the outermost
/// boundary, 8 the innermost bin, 9 below every boundary.
pub fn eta_val_to_bit(eta: f64) -> usize {
    let eta = eta.abs();
    if eta < ETA_BOUNDS[0] {
        return 9;
    }
    8 - ETA_BOUNDS.partition_point(|&bound| bound < eta)
}

pub fn eta_bit_to_code(bit: usize) -> i32 {
    ETA_BIT_TO_CODE.get(bit).copied().unwrap_or(ETA_CODE_OUT_OF_RANGE)
}

/// Discretizes a signed pseudorapidity: the magnitude goes through the bin
/// tables, the sign of the input is applied last.
pub fn eta_val_to_code(eta: f64) -> i32 {
    let code = eta_bit_to_code(eta_val_to_bit(eta));
    if eta < 0.0 {
        -code
    } else {
        code
    }
}

/// One wire-group range of the cathode-strip eta tables.
struct WireGroupRange {
    wg_min: u16,
    wg_max: u16,
    bit: usize,
}

// The wire-group granularity does not follow the continuous eta boundaries,
// so the ranges are tabulated verbatim per (station, ring).
const CSC_WG_ST1_RI2: [WireGroupRange; 2] = [
    WireGroupRange { wg_min: 49, wg_max: 57, bit: 0 },
    WireGroupRange { wg_min: 58, wg_max: 63, bit: 1 },
];

const CSC_WG_ST1_RI3: [WireGroupRange; 5] = [
    WireGroupRange { wg_min: 0, wg_max: 2, bit: 2 },
    WireGroupRange { wg_min: 3, wg_max: 8, bit: 3 },
    WireGroupRange { wg_min: 9, wg_max: 15, bit: 4 },
    WireGroupRange { wg_min: 16, wg_max: 23, bit: 5 },
    WireGroupRange { wg_min: 24, wg_max: 31, bit: 6 },
];

const CSC_WG_ST23_RI2: [WireGroupRange; 5] = [
    WireGroupRange { wg_min: 24, wg_max: 29, bit: 0 },
    WireGroupRange { wg_min: 30, wg_max: 43, bit: 1 },
    WireGroupRange { wg_min: 44, wg_max: 49, bit: 2 },
    WireGroupRange { wg_min: 50, wg_max: 56, bit: 3 },
    WireGroupRange { wg_min: 57, wg_max: 63, bit: 4 },
];

/// Eta code of a cathode-strip key wire group. Endcap 2 sits at negative z
/// and negates the code.
pub fn eta_key_wg_to_code(det_id: &CscDetId, key_wg: u16) -> i32 {
    let ranges: &[WireGroupRange] = match (det_id.station, det_id.ring) {
        (1, 2) => &CSC_WG_ST1_RI2,
        (1, 3) => &CSC_WG_ST1_RI3,
        (2, 2) | (3, 2) => &CSC_WG_ST23_RI2,
        _ => &[],
    };

    let mut code = CSC_ETA_NO_MATCH;
    for range in ranges {
        if key_wg >= range.wg_min && key_wg <= range.wg_max {
            code = eta_bit_to_code(range.bit);
            break;
        }
    }

    if det_id.endcap == 2 {
        -code
    } else {
        code
    }
}

/// What the ambiguity-bit scan of a theta segment found.
#[derive(Clone, Copy, PartialEq)]
enum ThetaGroup {
    NotFound,
    Single(u32),
    Ambiguous,
}

/// Outcome of converting one cathode-strip hit.
///
/// The eta code comes purely from the wire-group table; `phi` and `r` are
/// the azimuth and beam-line distance of the refined hit position, which
/// only serve the downstream phi discretization.
#[derive(Clone, Copy, Debug)]
pub struct CscConversion {
    pub eta_code: i32,
    pub phi: f64,
    pub r: f64,
}

/// Outcome of converting one resistive-plate hit. The radius is only
/// meaningful for endcap rolls and stays `None` in the barrel.
#[derive(Clone, Copy, Debug)]
pub struct RpcConversion {
    pub eta_code: i32,
    pub phi: f64,
    pub r: Option<f64>,
}

/// Maps technology-local hit positions to discretized global angles, given
/// the chamber geometry of the current epoch.
pub struct AngleConverter<'a> {
    dt_geometry: &'a dyn DtGeometry,
    csc_geometry: &'a dyn CscGeometry,
    rpc_geometry: &'a dyn RpcGeometry,
}

impl<'a> AngleConverter<'a> {
    pub fn new(
        dt_geometry: &'a dyn DtGeometry,
        csc_geometry: &'a dyn CscGeometry,
        rpc_geometry: &'a dyn RpcGeometry,
    ) -> Self {
        AngleConverter { dt_geometry, csc_geometry, rpc_geometry }
    }

    /// Global eta code of a drift-tube chamber, from the event's theta
    /// segments at the given bunch crossing.
    ///
    /// A segment with exactly one position bit names the cell group the
    /// measurement came from; the cell in the middle of that group carries
    /// the theta. More than one bit is an ambiguous measurement and maps to
    /// the out-of-range code; a chamber without a segment falls back to its
    /// station default. The wheel sign is applied last, on every branch.
    pub fn global_eta_dt(
        &self,
        chamber: &DtChamberId,
        theta_digis: &DtThetaDigiCollection,
        bx: i32,
    ) -> Result<i32> {
        let geometry = self
            .dt_geometry
            .chamber(chamber)
            .ok_or(OmtfError::Geometry(DetId::Dt(*chamber)))?;

        // station 4 has no theta superlayer, its cell count comes from
        // superlayer 3
        let n_theta_cells = if chamber.station != 4 { geometry.n_cells(2) } else { geometry.n_cells(3) };

        let segment = theta_digis.theta_segment(chamber.wheel, chamber.station, chamber.sector - 1, bx);

        let mut group = ThetaGroup::NotFound;
        if let Some(segment) = segment {
            for (i, set) in segment.position.iter().enumerate() {
                if *set {
                    group = match group {
                        ThetaGroup::NotFound => ThetaGroup::Single(i as u32),
                        _ => ThetaGroup::Ambiguous,
                    };
                }
            }
        }

        let eta = match group {
            ThetaGroup::Ambiguous => ETA_CODE_OUT_OF_RANGE,
            ThetaGroup::NotFound if (1..=3).contains(&chamber.station) => {
                debug!(chamber = %chamber, "no theta segment, station default eta");
                DT_ETA_DEFAULTS[(chamber.station - 1) as usize]
            }
            ThetaGroup::Single(group) if chamber.station != 4 => {
                let cell = group * n_theta_cells / 7 + n_theta_cells / 14 + 1;
                let position = geometry.theta_cell_position(cell);
                eta_val_to_code(position.eta().abs())
            }
            _ => 0,
        };

        Ok(eta * chamber.wheel.signum())
    }

    /// Global eta code and refined position of a cathode-strip hit.
    ///
    /// The refined position starts from the coarse strip/wire-group
    /// intersection and applies a half-strip-width azimuth correction whose
    /// sign follows the half-strip parity and the strip numbering sense of
    /// the chamber.
    pub fn global_eta_csc(&self, det_id: &CscDetId, digi: &CscCorrelatedDigi) -> Result<CscConversion> {
        let layer = self
            .csc_geometry
            .key_layer(det_id)
            .ok_or(OmtfError::Geometry(DetId::Csc(*det_id)))?;

        let half_strip = digi.half_strip as u32;
        // the geometry counts strips from 1
        let strip = half_strip / 2 + 1;

        let coarse_lp = layer.strip_wire_group_intersection(strip, digi.key_wire_group);
        let coarse_gp = layer.to_global(coarse_lp);

        // offset of the half-strip centre with respect to the strip centre
        let hs_offset = layer.strip_phi_pitch() / 4.0;

        // even half strips sit below the strip centre, odd ones above; which
        // way that points in phi depends on the numbering sense
        let ccw = is_counter_clockwise(layer);
        let parity = if half_strip % 2 == 1 { 1.0 } else { -1.0 };
        let phi_offset = parity * if ccw { -hs_offset } else { hs_offset };

        let refined = GlobalPoint::from_polar(coarse_gp.theta(), coarse_gp.phi() + phi_offset, coarse_gp.mag());

        Ok(CscConversion {
            eta_code: eta_key_wg_to_code(det_id, digi.key_wire_group),
            phi: refined.phi(),
            r: refined.perp(),
        })
    }

    /// Global eta code of a resistive-plate strip.
    pub fn global_eta_rpc(&self, det_id: &RpcDetId, strip: u32) -> Result<RpcConversion> {
        let roll = self
            .rpc_geometry
            .roll(det_id)
            .ok_or(OmtfError::Geometry(DetId::Rpc(*det_id)))?;

        let position = roll.to_global(roll.centre_of_strip(strip as i32));

        let r = if det_id.region == 0 { None } else { Some(position.perp()) };

        Ok(RpcConversion { eta_code: eta_val_to_code(position.eta()), phi: position.phi(), r })
    }
}

/// Strip numbering sense of a chamber: compares the azimuth of the first
/// and last strip, unwrapping across the -pi/pi seam.
fn is_counter_clockwise(layer: &dyn CscLayerGeometry) -> bool {
    let n_strips = layer.number_of_strips();
    let phi_first = layer.centre_of_strip(1).phi();
    let phi_last = layer.centre_of_strip(n_strips).phi();
    let diff = (phi_first - phi_last).abs();

    (diff < PI && phi_first >= phi_last) || (diff >= PI && phi_first < phi_last)
}

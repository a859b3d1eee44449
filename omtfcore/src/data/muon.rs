use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::data::pattern::{GoldenPattern, GoldenPatternResult, StubResult};

/// A candidate muon: the result of matching one golden pattern around one
/// reference hit, with the bookkeeping the later stages need.
///
/// Two hypotheses travel in parallel: the vertex-constrained one set at
/// construction and the unconstrained one filled in separately. The pattern
/// references point into the run-wide pattern bank; a candidate without a
/// pattern answers with sentinels instead of failing.
///
/// Lifecycle: created by the pattern-matching stage, possibly killed by the
/// ghost buster (no other transition, no revival), destroyed with the event.
#[derive(Clone, Debug, Default)]
pub struct AlgoMuon {
    gp_result: GoldenPatternResult,
    // result without the vertex constraint (unconstrained pt)
    gp_result_upt: GoldenPatternResult,
    golden_pattern: Option<Arc<GoldenPattern>>,
    golden_pattern_upt: Option<Arc<GoldenPattern>>,
    bx: i32,
    ref_hit_number: u32,
    killed: bool,
    killed_muons: Vec<Arc<AlgoMuon>>,
    pt_nn: i32,
    charge_nn: i32,
}

impl AlgoMuon {
    pub fn new(
        gp_result: GoldenPatternResult,
        golden_pattern: Option<Arc<GoldenPattern>>,
        ref_hit_number: u32,
        bx: i32,
    ) -> Self {
        AlgoMuon {
            gp_result,
            golden_pattern,
            ref_hit_number,
            bx,
            ..Default::default()
        }
    }

    pub fn gp_result(&self) -> &GoldenPatternResult {
        &self.gp_result
    }

    pub fn gp_result_upt(&self) -> &GoldenPatternResult {
        &self.gp_result_upt
    }

    pub fn set_gp_result_upt(&mut self, gp_result_upt: GoldenPatternResult) {
        self.gp_result_upt = gp_result_upt;
    }

    pub fn golden_pattern(&self) -> Option<&Arc<GoldenPattern>> {
        self.golden_pattern.as_ref()
    }

    pub fn golden_pattern_upt(&self) -> Option<&Arc<GoldenPattern>> {
        self.golden_pattern_upt.as_ref()
    }

    pub fn set_golden_pattern_upt(&mut self, golden_pattern_upt: Option<Arc<GoldenPattern>>) {
        self.golden_pattern_upt = golden_pattern_upt;
    }

    /// Constrained transverse-momentum hypothesis, -1 without a pattern.
    pub fn pt(&self) -> i32 {
        self.golden_pattern.as_ref().map_or(-1, |gp| gp.key.pt)
    }

    /// Unconstrained transverse-momentum hypothesis, -1 without a pattern.
    pub fn pt_unconstrained(&self) -> i32 {
        self.golden_pattern_upt.as_ref().map_or(-1, |gp| gp.key.pt)
    }

    /// Charge hypothesis, 0 without a pattern.
    pub fn charge(&self) -> i32 {
        self.golden_pattern.as_ref().map_or(0, |gp| gp.key.charge)
    }

    pub fn pattern_number(&self) -> u32 {
        self.golden_pattern.as_ref().map_or(0, |gp| gp.key.number)
    }

    pub fn hw_pattern_number(&self) -> u32 {
        self.golden_pattern.as_ref().map_or(0, |gp| gp.key.hw_pattern_number())
    }

    pub fn bx(&self) -> i32 {
        self.bx
    }

    pub fn ref_hit_number(&self) -> u32 {
        self.ref_hit_number
    }

    pub fn set_ref_hit_number(&mut self, ref_hit_number: u32) {
        self.ref_hit_number = ref_hit_number;
    }

    pub fn phi(&self) -> i32 {
        self.gp_result.phi
    }

    pub fn ref_hit_phi(&self) -> i32 {
        self.gp_result.ref_hit_phi
    }

    pub fn eta_hw(&self) -> i32 {
        self.gp_result.eta()
    }

    pub fn set_eta(&mut self, eta: i32) {
        self.gp_result.set_eta(eta);
    }

    pub fn ref_layer(&self) -> i32 {
        self.gp_result.ref_layer
    }

    pub fn fired_layer_bits(&self) -> u32 {
        self.gp_result.fired_layer_bits
    }

    pub fn fired_layer_count(&self) -> u32 {
        self.gp_result.fired_layer_count()
    }

    pub fn pdf_sum(&self) -> f64 {
        self.gp_result.pdf_sum
    }

    pub fn stub_result(&self, i_layer: usize) -> &StubResult {
        &self.gp_result.stub_results[i_layer]
    }

    pub fn stub_results(&self) -> &[StubResult] {
        &self.gp_result.stub_results
    }

    /// Initial quality of the candidate, the number of fired layers.
    pub fn quality(&self) -> u32 {
        self.gp_result.fired_layer_count()
    }

    pub fn is_valid(&self) -> bool {
        self.golden_pattern.is_some() && self.gp_result.fired_layer_count() > 0
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Marks the candidate as superseded; it stays around for audit but is
    /// excluded from every output.
    pub fn kill(&mut self) {
        self.killed = true;
    }

    /// Kills `other` and takes it over for audit.
    pub fn absorb(&mut self, mut other: AlgoMuon) {
        other.kill();
        self.killed_muons.push(Arc::new(other));
    }

    pub fn killed_muons(&self) -> &[Arc<AlgoMuon>] {
        &self.killed_muons
    }

    /// Refined transverse momentum from the regression stage, 0 until set.
    pub fn pt_nn(&self) -> i32 {
        self.pt_nn
    }

    pub fn set_pt_nn(&mut self, pt_nn: i32) {
        self.pt_nn = pt_nn;
    }

    /// Refined charge from the regression stage, 0 until set.
    pub fn charge_nn(&self) -> i32 {
        self.charge_nn
    }

    pub fn set_charge_nn(&mut self, charge_nn: i32) {
        self.charge_nn = charge_nn;
    }

    /// Ranking used to decide which of two candidates survives ghost
    /// busting; `Greater` means `self` is the better muon. The tie-breaks,
    /// in order: more fired layers, larger pdf sum, lower reference layer,
    /// lower reference-hit number. The last two only serve to make the
    /// order total, so selection stays stable under input reordering.
    pub fn compare(&self, other: &AlgoMuon) -> Ordering {
        self.gp_result
            .fired_layer_count()
            .cmp(&other.gp_result.fired_layer_count())
            .then_with(|| OrderedFloat(self.gp_result.pdf_sum).cmp(&OrderedFloat(other.gp_result.pdf_sum)))
            .then_with(|| other.gp_result.ref_layer.cmp(&self.gp_result.ref_layer))
            .then_with(|| other.ref_hit_number.cmp(&self.ref_hit_number))
    }
}

impl Display for AlgoMuon {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AlgoMuon(bx: {}, refHit: {}, pt: {}, charge: {}, q: {}, pdfSum: {}, killed: {})",
            self.bx,
            self.ref_hit_number,
            self.pt(),
            self.charge(),
            self.quality(),
            self.pdf_sum(),
            self.killed
        )
    }
}

pub type AlgoMuonPtr = Arc<AlgoMuon>;
pub type AlgoMuons = Vec<AlgoMuonPtr>;

//! Duplicate-candidate suppression.
//!
//! One muon crossing the overlap region fires several reference hits, so
//! the pattern matcher reports it several times with nearby azimuths. The
//! ghost buster keeps the best report and lets it absorb the rest.

use std::sync::Arc;

use tracing::debug;

use crate::data::muon::{AlgoMuon, AlgoMuons};

/// Duplicate-suppression pass over the candidates of one processor.
pub struct GhostBuster {
    /// Two candidates closer than this in hardware phi bins duplicate each
    /// other.
    phi_margin: i32,
    n_phi_bins: i32,
}

impl GhostBuster {
    pub fn new(phi_margin: i32, n_phi_bins: i32) -> Self {
        GhostBuster { phi_margin, n_phi_bins }
    }

    /// Selects the surviving candidates.
    ///
    /// Invalid candidates are dropped up front. The rest are ranked
    /// best-first (see [`AlgoMuon::compare`]); a candidate within the phi
    /// margin of an already accepted one is killed and absorbed by it.
    /// Survivors come back in rank order; killed candidates are only
    /// reachable through their absorber.
    pub fn select(&self, candidates: Vec<AlgoMuon>) -> AlgoMuons {
        let mut ranked: Vec<AlgoMuon> = candidates.into_iter().filter(|c| c.is_valid()).collect();
        ranked.sort_by(|a, b| b.compare(a));

        let mut winners: Vec<AlgoMuon> = Vec::new();
        for candidate in ranked {
            let duplicate_of = winners
                .iter()
                .position(|winner| self.phi_distance(winner.phi(), candidate.phi()) <= self.phi_margin);
            match duplicate_of {
                Some(i) => {
                    let winner = &mut winners[i];
                    debug!(winner = %winner, ghost = %candidate, "ghost busted");
                    winner.absorb(candidate);
                }
                None => winners.push(candidate),
            }
        }

        winners.into_iter().map(Arc::new).collect()
    }

    /// Circular distance in hardware phi bins.
    fn phi_distance(&self, a: i32, b: i32) -> i32 {
        let d = (a - b).rem_euclid(self.n_phi_bins);
        d.min(self.n_phi_bins - d)
    }
}

//! Selection rules: which member of a set serves a request.
//!
//! Candidates are always presented in release order: the member whose units
//! were released longest ago comes first, the most recently released last.
//! Rules are stateless; the ordering lives in the [`ResourceSet`].
//!
//! [`ResourceSet`]: crate::ResourceSet

use std::fmt;

use des_core::ResourceId;

use crate::Resource;

/// Pluggable member-selection policy for a resource set.
///
/// Both methods are total: `None` means "no member qualifies right now" and
/// the request waits on the set.
pub trait SelectionRule: Send + Sync + fmt::Debug {
    /// Pick a member that alone can satisfy `amount`.
    fn select_for_amount(&self, candidates: &[&Resource], amount: u32) -> Option<ResourceId>;

    /// Pick any member with available units.
    fn select_any(&self, candidates: &[&Resource]) -> Option<ResourceId>;
}

// ── CyclicRule ────────────────────────────────────────────────────────────────

/// The default rule: scan from the longest-ago-released member and take the
/// first that covers the amount.  Because a member moves to the back of the
/// order whenever it releases, service rotates across releases.
#[derive(Copy, Clone, Debug, Default)]
pub struct CyclicRule;

impl SelectionRule for CyclicRule {
    fn select_for_amount(&self, candidates: &[&Resource], amount: u32) -> Option<ResourceId> {
        candidates
            .iter()
            .find(|r| r.number_available() >= amount)
            .map(|r| r.id())
    }

    fn select_any(&self, candidates: &[&Resource]) -> Option<ResourceId> {
        candidates
            .iter()
            .find(|r| r.has_available_units())
            .map(|r| r.id())
    }
}

// ── MaxAvailableRule ──────────────────────────────────────────────────────────

/// Take the member with the most available units, without checking the
/// amount.  Ties go to the earliest candidate.  A set whose members are all
/// exhausted yields `None`.
#[derive(Copy, Clone, Debug, Default)]
pub struct MaxAvailableRule;

impl MaxAvailableRule {
    fn most_available(candidates: &[&Resource]) -> Option<ResourceId> {
        let mut best: Option<&Resource> = None;
        for r in candidates {
            if best.is_none_or(|b| r.number_available() > b.number_available()) {
                best = Some(r);
            }
        }
        best.filter(|r| r.has_available_units()).map(|r| r.id())
    }
}

impl SelectionRule for MaxAvailableRule {
    fn select_for_amount(&self, candidates: &[&Resource], _amount: u32) -> Option<ResourceId> {
        Self::most_available(candidates)
    }

    fn select_any(&self, candidates: &[&Resource]) -> Option<ResourceId> {
        Self::most_available(candidates)
    }
}

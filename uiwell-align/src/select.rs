//! Choosing the before/after pair from the transition pattern.

use uiwell_core::SourcedOutcome;

/// Which candidate serves as the "after" value and which as the "before".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// after = next, before = now
    NextOverNow,
    /// after = now, before = base_far
    NowOverBase,
    Undefined,
}

/// Lead indicators at the previous, current and next wave.
pub fn selection(previous: Option<bool>, current: Option<bool>, next: Option<bool>) -> Selection {
    match (previous, current, next) {
        (Some(false), Some(false), Some(false)) => Selection::NextOverNow,
        (Some(false), Some(false), Some(true)) => Selection::NowOverBase,
        (Some(false), Some(true), _) => Selection::NextOverNow,
        (Some(true), _, _) => Selection::NowOverBase,
        (None, Some(false), _) => Selection::NowOverBase,
        (None, Some(true), _) => Selection::NextOverNow,
        _ => Selection::Undefined,
    }
}

/// Candidate values found by the searches.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Candidates {
    pub now: Option<SourcedOutcome>,
    pub next: Option<SourcedOutcome>,
    pub base_far: Option<SourcedOutcome>,
}

/// Picked pair plus which sides were thrown out by the ordering rules.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeadBase {
    pub lead: Option<SourcedOutcome>,
    pub base: Option<SourcedOutcome>,
    pub lead_rejected: bool,
    pub base_rejected: bool,
}

/// Apply a selection, then drop a lead sourced before the current wave and a
/// base not strictly before the lead.
pub fn lead_and_base(selection: Selection, candidates: Candidates) -> LeadBase {
    let (lead, base) = match selection {
        Selection::NextOverNow => (candidates.next, candidates.now),
        Selection::NowOverBase => (candidates.now, candidates.base_far),
        Selection::Undefined => (None, None),
    };
    let mut picked = LeadBase {
        lead,
        base,
        ..LeadBase::default()
    };
    if picked.lead.is_some_and(|l| l.wave_offset < 0) {
        picked.lead = None;
        picked.lead_rejected = true;
    }
    if let (Some(l), Some(b)) = (picked.lead, picked.base) {
        if b.wave_offset >= l.wave_offset {
            picked.base = None;
            picked.base_rejected = true;
        }
    }
    picked
}

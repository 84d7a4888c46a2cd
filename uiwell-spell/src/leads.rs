//! Lead construction: monthly unemployment flags for the years after an
//! interview, read from the recall blocks of later waves.

use uiwell_core::{all_months, LeadBlock, LeadFlags, PersonYearRecord, StudyConfig};

/// The wave `waves_ahead` rows after `index`, if it sits exactly
/// `waves_ahead` cadence steps later. Anything else is a structural gap.
pub fn lead_wave<'a>(
    waves: &'a [PersonYearRecord],
    index: usize,
    waves_ahead: usize,
    config: &StudyConfig,
) -> Option<&'a PersonYearRecord> {
    let current = waves.get(index)?;
    let candidate = waves.get(index + waves_ahead)?;
    let expected = current.year + config.years_for_waves(waves_ahead as i32);
    (candidate.year == expected).then_some(candidate)
}

/// Lead flags for one wave of a chronologically sorted history.
pub fn lead_flags_for(waves: &[PersonYearRecord], index: usize, config: &StudyConfig) -> LeadFlags {
    let mut flags = LeadFlags::default();
    for block in LeadBlock::ALL {
        let source = block.source();
        let Some(later) = lead_wave(waves, index, source.waves_ahead as usize, config) else {
            continue;
        };
        for month in all_months() {
            flags.set(block, month, later.employment.unemployed(source.block, month));
        }
    }
    flags
}

/// Lead flags for every wave of a chronologically sorted history.
pub fn build_lead_flags(waves: &[PersonYearRecord], config: &StudyConfig) -> Vec<LeadFlags> {
    (0..waves.len())
        .map(|i| lead_flags_for(waves, i, config))
        .collect()
}

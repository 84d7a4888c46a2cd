//! Person-partitioned panel
//!
//! All reconstruction is per person, so the panel stores one chronologically
//! ordered [`PersonHistory`] per person and never shares state across them.

use std::collections::BTreeMap;

use crate::error::PanelError;
use crate::identity::{PersonId, WaveKey};
use crate::record::PersonYearRecord;

/// One person's waves, sorted by year with unique years.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonHistory {
    person_id: PersonId,
    waves: Vec<PersonYearRecord>,
}

impl PersonHistory {
    pub fn new(person_id: PersonId, mut waves: Vec<PersonYearRecord>) -> Result<Self, PanelError> {
        if let Some(stray) = waves.iter().find(|w| w.person_id != person_id) {
            return Err(PanelError::MixedPerson {
                expected: person_id,
                found: stray.person_id,
            });
        }
        waves.sort_by_key(|w| w.year);
        if let Some(pair) = waves.windows(2).find(|pair| pair[0].year == pair[1].year) {
            return Err(PanelError::DuplicateWave {
                person_id,
                year: pair[0].year,
            });
        }
        Ok(Self { person_id, waves })
    }

    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub fn waves(&self) -> &[PersonYearRecord] {
        &self.waves
    }

    pub fn waves_mut(&mut self) -> &mut [PersonYearRecord] {
        &mut self.waves
    }

    pub fn into_waves(self) -> Vec<PersonYearRecord> {
        self.waves
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.waves.iter().map(|w| w.year).collect()
    }

    pub fn position_of_year(&self, year: i32) -> Option<usize> {
        self.waves.binary_search_by_key(&year, |w| w.year).ok()
    }

    pub fn wave_at_year(&self, year: i32) -> Option<&PersonYearRecord> {
        self.position_of_year(year).map(|i| &self.waves[i])
    }

    /// Copy of this history restricted to included waves.
    pub fn included(&self) -> PersonHistory {
        PersonHistory {
            person_id: self.person_id,
            waves: self
                .waves
                .iter()
                .filter(|w| w.wave.included)
                .cloned()
                .collect(),
        }
    }
}

/// A person-year panel grouped by person.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Panel {
    histories: Vec<PersonHistory>,
}

impl Panel {
    /// Group records by person; rejects duplicate (person, year) keys.
    pub fn from_records(records: Vec<PersonYearRecord>) -> Result<Self, PanelError> {
        let mut grouped: BTreeMap<PersonId, Vec<PersonYearRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.person_id).or_default().push(record);
        }
        let histories = grouped
            .into_iter()
            .map(|(person_id, waves)| PersonHistory::new(person_id, waves))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { histories })
    }

    /// Histories must belong to distinct persons.
    pub fn from_histories(mut histories: Vec<PersonHistory>) -> Self {
        histories.sort_by_key(|h| h.person_id);
        Self { histories }
    }

    pub fn histories(&self) -> &[PersonHistory] {
        &self.histories
    }

    pub fn histories_mut(&mut self) -> &mut [PersonHistory] {
        &mut self.histories
    }

    pub fn into_histories(self) -> Vec<PersonHistory> {
        self.histories
    }

    pub fn person_count(&self) -> usize {
        self.histories.len()
    }

    pub fn record_count(&self) -> usize {
        self.histories.iter().map(PersonHistory::len).sum()
    }

    pub fn records(&self) -> impl Iterator<Item = &PersonYearRecord> {
        self.histories.iter().flat_map(|h| h.waves.iter())
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut PersonYearRecord> {
        self.histories.iter_mut().flat_map(|h| h.waves.iter_mut())
    }

    pub fn history(&self, person_id: PersonId) -> Option<&PersonHistory> {
        self.histories
            .binary_search_by_key(&person_id, |h| h.person_id)
            .ok()
            .map(|i| &self.histories[i])
    }

    pub fn find(&self, key: WaveKey) -> Option<&PersonYearRecord> {
        self.history(key.person_id)?.wave_at_year(key.year)
    }

    pub fn find_mut(&mut self, key: WaveKey) -> Option<&mut PersonYearRecord> {
        let h = self
            .histories
            .binary_search_by_key(&key.person_id, |h| h.person_id)
            .ok()?;
        let history = &mut self.histories[h];
        let w = history.position_of_year(key.year)?;
        Some(&mut history.waves[w])
    }

    /// Panel of included waves only; persons with none are dropped.
    pub fn included(&self) -> Panel {
        Panel {
            histories: self
                .histories
                .iter()
                .map(PersonHistory::included)
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }
}

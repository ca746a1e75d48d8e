//! Deduplication and revision detection.
//!
//! Events describing the same economic event (same ticker, payment date and
//! family) are grouped. Each group is flagged first, from every candidate it
//! holds, and only then reduced to its best-scoring representative, which
//! carries the group's flags.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::category_classifier::fold_label;
use super::{EventFamily, IncomeEvent, RevisionNote};

/// Identity of an economic event across providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub family: EventFamily,
}

impl DedupKey {
    pub fn for_event(event: &IncomeEvent) -> Self {
        Self {
            ticker: event.ticker.clone(),
            event_date: event.event_date,
            family: event.family(),
        }
    }
}

/// Recognized providers and their authority, matched against the source
/// name with case and punctuation ignored.
const SOURCE_PRIORITIES: [(&str, i64); 8] = [
    ("b3", 5),
    ("cvm", 5),
    ("statusinvest", 4),
    ("fundamentus", 4),
    ("brapi", 3),
    ("yfinance", 3),
    ("yahoo", 3),
    ("manual", 2),
];

const UNRECOGNIZED_SOURCE_PRIORITY: i64 = 1;

const INCOME_LABEL_KEYWORDS: [&str; 8] = [
    "pag", "payment", "divid", "rend", "provent", "jcp", "juros", "income",
];

const SCORE_POSITIVE_AMOUNT: i64 = 200;
const SCORE_NON_POSITIVE_AMOUNT: i64 = 90;
const SCORE_POSITIVE_GROSS: i64 = 10;
const SCORE_EX_DATE: i64 = 10;
const SCORE_RECORD_DATE: i64 = 6;
const SCORE_ANNOUNCEMENT_DATE: i64 = 4;
const SCORE_VALUE_SOURCE: i64 = 15;
const SCORE_PER_SOURCE_RANK: i64 = 20;
const SCORE_INCOME_LABEL: i64 = 8;

fn compact_source(source: &str) -> String {
    source
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 0 for no source, 1 for an unrecognized one, higher for known providers.
pub fn source_priority(source: Option<&str>) -> i64 {
    let Some(compact) = source.map(compact_source).filter(|s| !s.is_empty()) else {
        return 0;
    };
    SOURCE_PRIORITIES
        .iter()
        .find(|(name, _)| compact.contains(name))
        .map(|(_, rank)| *rank)
        .unwrap_or(UNRECOGNIZED_SOURCE_PRIORITY)
}

fn has_income_label(event_type: Option<&str>) -> bool {
    event_type
        .map(fold_label)
        .is_some_and(|label| INCOME_LABEL_KEYWORDS.iter().any(|k| label.contains(k)))
}

/// Deterministic completeness/authority score of a candidate.
pub fn candidate_score(event: &IncomeEvent) -> i64 {
    let mut score = 0;

    score += match event.amount_per_unit {
        Some(amount) if amount > Decimal::ZERO => SCORE_POSITIVE_AMOUNT,
        Some(_) => SCORE_NON_POSITIVE_AMOUNT,
        None => 0,
    };
    if event.expected_gross.is_some_and(|g| g > Decimal::ZERO) {
        score += SCORE_POSITIVE_GROSS;
    }
    if event.ex_date.is_some() {
        score += SCORE_EX_DATE;
    }
    if event.record_date.is_some() {
        score += SCORE_RECORD_DATE;
    }
    if event.announcement_date.is_some() {
        score += SCORE_ANNOUNCEMENT_DATE;
    }
    if event.value_source.is_some() {
        score += SCORE_VALUE_SOURCE;
    }
    score += SCORE_PER_SOURCE_RANK * source_priority(event.source.as_deref());
    if has_income_label(event.event_type.as_deref()) {
        score += SCORE_INCOME_LABEL;
    }

    score
}

fn is_source_override(event: &IncomeEvent) -> bool {
    match (event.value_source.as_deref(), event.source.as_deref()) {
        (Some(value_source), Some(source)) => {
            !value_source.trim().eq_ignore_ascii_case(source.trim())
        }
        _ => false,
    }
}

/// Revision note for a whole group, independent of which candidate wins.
pub fn detect_revision(candidates: &[&IncomeEvent]) -> Option<RevisionNote> {
    let mut distinct_amounts: Vec<Decimal> = Vec::new();
    for amount in candidates.iter().filter_map(|e| e.amount_per_unit) {
        if !distinct_amounts.contains(&amount) {
            distinct_amounts.push(amount);
        }
    }

    if distinct_amounts.len() > 1 {
        Some(RevisionNote::ValueConflict)
    } else if candidates.iter().copied().any(is_source_override) {
        Some(RevisionNote::SourceOverride)
    } else if candidates.iter().any(|e| e.provider_revised) {
        Some(RevisionNote::ProviderFlagged)
    } else {
        None
    }
}

/// Highest score wins; on a tie the first-seen candidate stays.
pub fn select_representative<'a>(candidates: &[&'a IncomeEvent]) -> Option<&'a IncomeEvent> {
    let mut best: Option<(&'a IncomeEvent, i64)> = None;
    for candidate in candidates {
        let score = candidate_score(candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((*candidate, score)),
        }
    }
    best.map(|(event, _)| event)
}

/// One representative per dedup group, in first-seen group order.
pub fn deduplicate_events(events: &[IncomeEvent]) -> Vec<IncomeEvent> {
    let mut group_index: HashMap<DedupKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<&IncomeEvent>> = Vec::new();

    for event in events {
        let key = DedupKey::for_event(event);
        match group_index.get(&key) {
            Some(idx) => groups[*idx].push(event),
            None => {
                group_index.insert(key, groups.len());
                groups.push(vec![event]);
            }
        }
    }

    let deduplicated: Vec<IncomeEvent> = groups
        .iter()
        .filter_map(|candidates| {
            let note = detect_revision(candidates);
            select_representative(candidates).map(|winner| {
                let mut representative = winner.clone();
                representative.has_revision = note.is_some();
                representative.revision_note_key = note;
                representative
            })
        })
        .collect();

    debug!(
        "Deduplicated {} income events into {} groups",
        events.len(),
        deduplicated.len()
    );
    deduplicated
}

//! Tiered name matching.
//!
//! Each tier is a pure function `(name, records) -> TierOutcome`. [`match_name`]
//! walks [`TIERS`] in order:
//!
//! 1. `exact`: byte equality
//! 2. `case-insensitive`: equality after lowercasing, nothing else
//! 3. `name-parts`: equal multisets of lowercased whitespace tokens
//!
//! No candidate moves on to the next tier. One candidate is a match. Several
//! candidates stop the walk and the profile is unmatched with an ambiguity note.

use roster_core::{EmployeeRecord, MatchTier};

/// What a single tier found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome<'a> {
    NoCandidate,
    Unique(&'a EmployeeRecord),
    Ambiguous(Vec<&'a EmployeeRecord>),
}

impl<'a> TierOutcome<'a> {
    fn from_candidates(candidates: Vec<&'a EmployeeRecord>) -> Self {
        match candidates.len() {
            0 => TierOutcome::NoCandidate,
            1 => TierOutcome::Unique(candidates[0]),
            _ => TierOutcome::Ambiguous(candidates),
        }
    }
}

pub type TierFn = for<'a> fn(&str, &'a [EmployeeRecord]) -> TierOutcome<'a>;

/// A named step in the fallback chain.
#[derive(Clone, Copy)]
pub struct Tier {
    pub kind: MatchTier,
    pub find: TierFn,
}

pub const TIERS: [Tier; 3] = [
    Tier {
        kind: MatchTier::Exact,
        find: exact,
    },
    Tier {
        kind: MatchTier::CaseInsensitive,
        find: case_insensitive,
    },
    Tier {
        kind: MatchTier::NameParts,
        find: name_parts,
    },
];

/// Several records tied within one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub tier: MatchTier,
    pub candidates: Vec<String>,
}

impl Ambiguity {
    pub fn note(&self) -> String {
        format!(
            "ambiguous {} match: {}",
            self.tier,
            self.candidates.join(", ")
        )
    }
}

/// Outcome of matching one profile name against the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub tier: MatchTier,
    pub record: Option<&'a EmployeeRecord>,
    pub ambiguity: Option<Ambiguity>,
}

impl<'a> MatchResult<'a> {
    fn unmatched(ambiguity: Option<Ambiguity>) -> Self {
        Self {
            tier: MatchTier::Unmatched,
            record: None,
            ambiguity,
        }
    }
}

pub fn exact<'a>(name: &str, records: &'a [EmployeeRecord]) -> TierOutcome<'a> {
    TierOutcome::from_candidates(records.iter().filter(|r| r.name == name).collect())
}

pub fn case_insensitive<'a>(name: &str, records: &'a [EmployeeRecord]) -> TierOutcome<'a> {
    let wanted = name.to_lowercase();
    TierOutcome::from_candidates(
        records
            .iter()
            .filter(|r| r.name.to_lowercase() == wanted)
            .collect(),
    )
}

pub fn name_parts<'a>(name: &str, records: &'a [EmployeeRecord]) -> TierOutcome<'a> {
    let wanted = tokens(name);
    if wanted.is_empty() {
        return TierOutcome::NoCandidate;
    }
    TierOutcome::from_candidates(
        records
            .iter()
            .filter(|r| tokens(&r.name) == wanted)
            .collect(),
    )
}

/// Sorted lowercase tokens; comparing two of these compares multisets.
fn tokens(name: &str) -> Vec<String> {
    let mut tokens: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
    tokens.sort();
    tokens
}

/// Resolve `name` to at most one roster record.
pub fn match_name<'a>(name: &str, records: &'a [EmployeeRecord]) -> MatchResult<'a> {
    for tier in TIERS {
        match (tier.find)(name, records) {
            TierOutcome::NoCandidate => continue,
            TierOutcome::Unique(record) => {
                return MatchResult {
                    tier: tier.kind,
                    record: Some(record),
                    ambiguity: None,
                }
            }
            TierOutcome::Ambiguous(candidates) => {
                return MatchResult::unmatched(Some(Ambiguity {
                    tier: tier.kind,
                    candidates: candidates.iter().map(|r| r.name.clone()).collect(),
                }))
            }
        }
    }
    MatchResult::unmatched(None)
}

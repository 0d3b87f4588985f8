//! Merge-dedupe-filter engine
//!
//! Records are processed as `[primary..., secondary...]`; the first record
//! seen for a dedupe key wins. Records with an empty key always pass.

use crate::types::{Investor, TicketSize};
use std::collections::HashSet;

/// Derive the dedupe key for a record.
///
/// Priority: website, then LinkedIn URL, then name. The first field that is
/// non-blank after trimming is lowercased and used. Returns an empty string
/// when all three are blank or absent.
pub fn dedupe_key(investor: &Investor) -> String {
    [
        investor.website.as_deref(),
        investor.linkedin_url.as_deref(),
        Some(investor.name.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|candidate| !candidate.is_empty())
    .map(str::to_lowercase)
    .unwrap_or_default()
}

/// Merge two record lists, dropping later records whose key was already seen.
///
/// Output order is stable: surviving `primary` records first, in input order,
/// followed by surviving `secondary` records.
pub fn merge_and_dedupe(primary: &[Investor], secondary: &[Investor]) -> Vec<Investor> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());

    for investor in primary.iter().chain(secondary) {
        let key = dedupe_key(investor);
        if key.is_empty() {
            merged.push(investor.clone());
            continue;
        }
        if seen.insert(key) {
            merged.push(investor.clone());
        }
    }

    merged
}

/// Drop records whose own ticket range cannot overlap `bounds`.
///
/// A record is excluded when its maximum is known and below `bounds.minimum`,
/// or its minimum is known and above `bounds.maximum`. Unknown record bounds
/// never exclude.
pub fn apply_ticket_filter(investors: Vec<Investor>, bounds: &TicketSize) -> Vec<Investor> {
    if !bounds.is_bounded() {
        return investors;
    }

    investors
        .into_iter()
        .filter(|investor| !excluded_by_ticket(investor, bounds))
        .collect()
}

fn excluded_by_ticket(investor: &Investor, bounds: &TicketSize) -> bool {
    let below_min = matches!(
        (investor.ticket_max, bounds.minimum),
        (Some(record_max), Some(min)) if record_max < min
    );
    let above_max = matches!(
        (investor.ticket_min, bounds.maximum),
        (Some(record_min), Some(max)) if record_min > max
    );
    below_min || above_max
}

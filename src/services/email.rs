//! Plain-text email drafting
//!
//! Drafts are never sent; they are returned to the caller for review.

use super::Drafter;
use crate::types::{AvailabilitySlot, EmailDraft, Investor, ParsedQuery, Result};
use std::fmt::Write as _;

pub const SUBJECT: &str = "Investor list and next steps";

/// Investors listed by name in the body.
const PREVIEW_COUNT: usize = 5;

const SLOT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, Default)]
pub struct EmailDrafter;

impl Drafter for EmailDrafter {
    fn draft(
        &self,
        investors: &[Investor],
        availability: Option<&[AvailabilitySlot]>,
        query: &ParsedQuery,
    ) -> Result<EmailDraft> {
        let mut body = String::from("Hi,\n\nI prepared an investor list");
        if let Some(ref industry) = query.industry {
            let _ = write!(body, " for {}", industry);
        }
        if let Some(ref location) = query.location {
            let _ = write!(body, " in {}", location);
        }
        let _ = writeln!(body, ".");
        let _ = writeln!(
            body,
            "There are {} investors in total. Here are a few:",
            investors.len()
        );

        let preview: Vec<String> = investors
            .iter()
            .take(PREVIEW_COUNT)
            .map(|i| format!("- {} ({})", i.name, i.website.as_deref().unwrap_or("n/a")))
            .collect();
        body.push_str(&preview.join("\n"));

        body.push_str("\n\nAvailability for a quick call:\n");
        match availability.filter(|slots| !slots.is_empty()) {
            Some(slots) => {
                let lines: Vec<String> = slots.iter().map(slot_line).collect();
                body.push_str(&lines.join("\n"));
            }
            None => body.push_str("Let me know your preferred times."),
        }

        body.push_str("\n\nBest,\nJockey AI");

        Ok(EmailDraft {
            subject: SUBJECT.to_string(),
            body_text: body,
            body_html: None,
        })
    }
}

fn slot_line(slot: &AvailabilitySlot) -> String {
    let mut line = format!(
        "- {} to {}",
        slot.start.format(SLOT_FORMAT),
        slot.end.format(SLOT_FORMAT)
    );
    if let Some(ref tz) = slot.timezone {
        let _ = write!(line, " ({})", tz);
    }
    line
}

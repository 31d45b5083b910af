//! Text transformers applied to OMDb metadata before it is written to Notion.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence-ending morpheme the summarizer rewrites terminators into.
const ENDING: &str = "임";
/// Returned verbatim when OMDb has no plot text.
const NO_PLOT_SUMMARY: &str = "줄거리 정보가 부족함.";
/// Always present in the features string, whatever else is known.
const FILLER_CLAUSE: &str = "한 번쯤 볼만함";

const SUMMARY_MAX_CHARS: usize = 360;
const SUMMARY_KEEP_CHARS: usize = 356;

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_ENDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Rewrites a full OMDb plot into a bounded summary: whitespace runs are
/// collapsed, each sentence terminator followed by whitespace becomes the
/// `임` ending, and anything past 360 chars is cut at 356 plus an ellipsis.
/// The result always closes on the ending (or an ellipsis from truncation).
pub fn summarize_plot(plot: &str) -> String {
    if plot.trim().is_empty() {
        return NO_PLOT_SUMMARY.to_string();
    }

    let collapsed = WHITESPACE_RUNS.replace_all(plot.trim(), " ");
    let mut summary = SENTENCE_ENDS
        .replace_all(&collapsed, format!("{} ", ENDING).as_str())
        .into_owned();

    if summary.chars().count() > SUMMARY_MAX_CHARS {
        summary = summary.chars().take(SUMMARY_KEEP_CHARS).collect();
        summary.push('…');
    }

    if !ends_terminated(&summary) {
        summary.push_str(ENDING);
        summary.push('.');
    }
    summary
}

/// True when the summary already closes properly: an ellipsis from
/// truncation, or the ending morpheme followed by at most one terminator.
fn ends_terminated(summary: &str) -> bool {
    if summary.ends_with('…') {
        return true;
    }
    let stripped = summary
        .strip_suffix(|c| matches!(c, '.' | '!' | '?'))
        .unwrap_or(summary);
    stripped.ends_with(ENDING)
}

/// Builds the features line from the director and up to the first three
/// genres. The filler clause is always the last one, so the result is never
/// empty.
pub fn synthesize_features(director: &str, genres: &[String]) -> String {
    let mut clauses = Vec::new();

    let director = director.trim();
    if !director.is_empty() {
        clauses.push(format!("{} 감독 작품", director));
    }

    if !genres.is_empty() {
        let listed = genres
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("{} 장르", listed));
    }

    clauses.push(FILLER_CLAUSE.to_string());
    clauses.join(" / ")
}

/// Formats OMDb usually sends, tried in order. `%d %b %Y` covers the common
/// `Released` shape ("20 Jun 1988").
const RELEASED_FORMATS: &[&str] = &["%d %b %Y", "%Y-%m-%d", "%b %d, %Y", "%d %B %Y"];

/// Parses OMDb's free-text `Released` field into an ISO-8601 calendar date.
/// Empty or unparsable input is an absent date, not an error.
pub fn parse_released_to_iso(released: &str) -> Option<String> {
    let released = released.trim();
    if released.is_empty() {
        return None;
    }

    RELEASED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(released, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(released)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
}

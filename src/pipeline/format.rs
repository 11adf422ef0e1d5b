//! Notification formatting.
//!
//! Turns a per-resource diff into a `sendMessage` payload: a prefixed,
//! size-bounded body plus a link entity over the resource title and a
//! collapsible block entity over the body. Offsets are composed from the
//! UTF-16 lengths of the individual segments, never recomputed from the
//! concatenated text, so surrogate-pair characters in titles cannot
//! desynchronize the entities from the transport's indexing.

use std::collections::HashMap;

use crate::models::{Dataset, MessageEntity, NotifyConfig, ResourceRef, SendMessagePayload};
use crate::pipeline::aggregate::FlightSummary;
use crate::utils::utf16_len;

/// How a resource changed relative to the stored baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// No stored file existed for the resource
    New,
    /// The stored file was refreshed
    Updated,
}

/// Per-resource body formatting strategy.
pub trait ResourceFormatter: Send + Sync {
    /// Message prefix for the given change kind.
    fn prefix(&self, kind: ChangeKind) -> &'static str;

    /// Message body for the given diff.
    fn body(&self, title: &str, diff: &[String]) -> String;
}

/// Default formatter: the diff lines themselves, clipped to the budget.
pub struct LineDiffFormatter {
    budget: usize,
}

impl LineDiffFormatter {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }
}

impl ResourceFormatter for LineDiffFormatter {
    fn prefix(&self, kind: ChangeKind) -> &'static str {
        match kind {
            ChangeKind::New => "📗 New Resource: ",
            ChangeKind::Updated => "📘 Update: ",
        }
    }

    fn body(&self, title: &str, diff: &[String]) -> String {
        let (kept, remaining) = clip_lines(diff, self.budget, utf16_len(title));
        let joined = kept.join("\n");
        if remaining == 0 {
            joined
        } else {
            format!("{joined}\n... and {remaining} more")
        }
    }
}

/// Aggregate formatter for the flight board.
pub struct FlightFormatter;

impl ResourceFormatter for FlightFormatter {
    fn prefix(&self, _kind: ChangeKind) -> &'static str {
        "✈ Flights Update: "
    }

    fn body(&self, _title: &str, diff: &[String]) -> String {
        FlightSummary::from_lines(diff).render()
    }
}

/// Registry selecting a formatter by resource id.
///
/// Exceptional resources get an override; everything else gets the line
/// diff formatter.
pub struct FormatterRegistry {
    overrides: HashMap<String, Box<dyn ResourceFormatter>>,
    fallback: LineDiffFormatter,
}

impl FormatterRegistry {
    /// Build the registry from notification settings.
    pub fn from_config(notify: &NotifyConfig) -> Self {
        let mut registry = Self {
            overrides: HashMap::new(),
            fallback: LineDiffFormatter::new(notify.message_budget),
        };
        registry.register(&notify.flight_resource, Box::new(FlightFormatter));
        registry
    }

    /// Register an override formatter for a resource id.
    pub fn register(&mut self, resource_id: &str, formatter: Box<dyn ResourceFormatter>) {
        self.overrides.insert(resource_id.to_string(), formatter);
    }

    /// The formatter for a resource.
    pub fn for_resource(&self, resource_id: &str) -> &dyn ResourceFormatter {
        self.overrides
            .get(resource_id)
            .map(Box::as_ref)
            .unwrap_or(&self.fallback)
    }
}

/// Greedily take leading lines whose cumulative UTF-16 length stays below
/// `ceiling`. The running length starts at `seed` (the title length, so a
/// long title shrinks the room left for diff lines). Returns the kept
/// lines and the count of excluded ones.
fn clip_lines<'a>(lines: &'a [String], ceiling: usize, seed: usize) -> (Vec<&'a str>, usize) {
    let mut kept = Vec::new();
    let mut current = seed;
    for line in lines {
        let length = utf16_len(line);
        if current + length < ceiling {
            kept.push(line.as_str());
            current += length;
        } else {
            break;
        }
    }
    let remaining = lines.len() - kept.len();
    (kept, remaining)
}

/// Assemble the full payload for one changed resource.
///
/// Text layout is `prefix \n title \n body`, with a trailing tags line
/// when the dataset carries tags. The link entity spans the title; the
/// collapsible block spans the body.
pub fn build_payload(
    registry: &FormatterRegistry,
    notify: &NotifyConfig,
    dataset_base_url: &str,
    kind: ChangeKind,
    diff: &[String],
    dataset: &Dataset,
    resource: &ResourceRef,
) -> SendMessagePayload {
    let formatter = registry.for_resource(&resource.id);
    let title = resource.name.as_str();
    let prefix = formatter.prefix(kind);
    let body = formatter.body(title, diff);

    let prefix_len = utf16_len(prefix);
    let title_len = utf16_len(title);
    let body_len = utf16_len(&body);

    let tag_line = dataset
        .tags
        .iter()
        .map(|tag| format!("#{}", tag.display_name.replace(' ', "_")))
        .collect::<Vec<_>>()
        .join(" ");

    let mut segments = vec![prefix, title, body.as_str()];
    if !tag_line.is_empty() {
        segments.push(tag_line.as_str());
    }

    let entities = vec![
        MessageEntity::expandable_blockquote(prefix_len + title_len + 2, body_len),
        MessageEntity::text_link(
            prefix_len + 1,
            title_len,
            format!("{dataset_base_url}/{}/resource/{}", dataset.id, resource.id),
        ),
    ];

    SendMessagePayload {
        chat_id: notify.chat_id.clone(),
        text: segments.join("\n"),
        entities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Organization, Tag};

    fn dataset() -> Dataset {
        Dataset {
            id: "ds-1".to_string(),
            title: "Road Counts".to_string(),
            organization: Organization {
                id: "org-1".to_string(),
                name: "transport".to_string(),
                title: "Ministry of Transport".to_string(),
            },
            ..Dataset::default()
        }
    }

    fn resource(id: &str, name: &str) -> ResourceRef {
        ResourceRef {
            id: id.to_string(),
            name: name.to_string(),
            format: "CSV".to_string(),
            ..ResourceRef::default()
        }
    }

    fn registry() -> FormatterRegistry {
        FormatterRegistry::from_config(&NotifyConfig::default())
    }

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_new_line_becomes_body() {
        let diff = lines(&["d"]);
        let payload = build_payload(
            &registry(),
            &NotifyConfig::default(),
            "https://data.gov.il/dataset",
            ChangeKind::Updated,
            &diff,
            &dataset(),
            &resource("res-1", "counts.csv"),
        );
        assert_eq!(payload.text, "📘 Update: \ncounts.csv\nd");
    }

    #[test]
    fn clip_respects_ceiling() {
        let diff = lines(&["aaaa", "bbbb", "cccc"]);
        let (kept, remaining) = clip_lines(&diff, 10, 0);
        // 4 + 4 = 8 fits; adding the third would reach 12
        assert_eq!(kept, vec!["aaaa", "bbbb"]);
        assert_eq!(remaining, 1);
    }

    #[test]
    fn clip_counts_title_against_budget() {
        let diff = lines(&["aaaa", "bbbb"]);
        let (kept, remaining) = clip_lines(&diff, 10, 5);
        assert_eq!(kept, vec!["aaaa"]);
        assert_eq!(remaining, 1);
    }

    #[test]
    fn clipped_body_reports_exact_excluded_count() {
        let formatter = LineDiffFormatter::new(10);
        let diff = lines(&["aaaa", "bbbb", "cccc", "dddd"]);
        let body = formatter.body("", &diff);
        assert!(body.ends_with("... and 2 more"));
    }

    #[test]
    fn body_within_budget_has_no_suffix() {
        let formatter = LineDiffFormatter::new(3800);
        let body = formatter.body("t", &lines(&["one", "two"]));
        assert_eq!(body, "one\ntwo");
    }

    #[test]
    fn clip_budget_is_utf16_not_bytes() {
        // Four Hebrew letters: 8 UTF-8 bytes but 4 UTF-16 units
        let diff = lines(&["שלום", "שלום"]);
        let (kept, _) = clip_lines(&diff, 9, 0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn link_entity_spans_title_in_utf16_units() {
        let diff = lines(&["d"]);
        let title = "🚦 traffic";
        let payload = build_payload(
            &registry(),
            &NotifyConfig::default(),
            "https://data.gov.il/dataset",
            ChangeKind::New,
            &diff,
            &dataset(),
            &resource("res-1", title),
        );
        let link = payload
            .entities
            .iter()
            .find(|e| e.kind == "text_link")
            .unwrap();
        // 10 chars but 11 UTF-16 units: the emoji is a surrogate pair
        assert_eq!(title.chars().count(), 10);
        assert_eq!(link.length, 11);
        assert_eq!(link.offset, utf16_len("📗 New Resource: ") + 1);
        assert_eq!(
            link.url.as_deref(),
            Some("https://data.gov.il/dataset/ds-1/resource/res-1")
        );
    }

    #[test]
    fn blockquote_starts_after_prefix_title_and_separators() {
        let diff = lines(&["x", "y"]);
        let payload = build_payload(
            &registry(),
            &NotifyConfig::default(),
            "https://data.gov.il/dataset",
            ChangeKind::Updated,
            &diff,
            &dataset(),
            &resource("res-1", "counts.csv"),
        );
        let quote = payload
            .entities
            .iter()
            .find(|e| e.kind == "expandable_blockquote")
            .unwrap();
        let expected = utf16_len("📘 Update: ") + utf16_len("counts.csv") + 2;
        assert_eq!(quote.offset, expected);
        assert_eq!(quote.length, utf16_len("x\ny"));
    }

    #[test]
    fn flight_resource_uses_aggregate_formatter() {
        let notify = NotifyConfig::default();
        let mut row = vec!["x"; 16];
        row[11] = "IL";
        row[15] = "LANDED";
        let diff = vec![row.join(",")];
        let payload = build_payload(
            &registry(),
            &notify,
            "https://data.gov.il/dataset",
            ChangeKind::Updated,
            &diff,
            &dataset(),
            &resource(&notify.flight_resource, "flight-board"),
        );
        assert!(payload.text.starts_with("✈ Flights Update: "));
        assert!(payload.text.contains("IL: 1"));
    }

    #[test]
    fn tags_become_trailing_hash_line() {
        let mut ds = dataset();
        ds.tags = vec![
            Tag {
                display_name: "air quality".to_string(),
                ..Tag::default()
            },
            Tag {
                display_name: "environment".to_string(),
                ..Tag::default()
            },
        ];
        let payload = build_payload(
            &registry(),
            &NotifyConfig::default(),
            "https://data.gov.il/dataset",
            ChangeKind::Updated,
            &lines(&["d"]),
            &ds,
            &resource("res-1", "counts.csv"),
        );
        assert!(payload.text.ends_with("\n#air_quality #environment"));
    }

    #[test]
    fn no_tags_means_no_trailing_line() {
        let payload = build_payload(
            &registry(),
            &NotifyConfig::default(),
            "https://data.gov.il/dataset",
            ChangeKind::Updated,
            &lines(&["d"]),
            &dataset(),
            &resource("res-1", "counts.csv"),
        );
        assert!(payload.text.ends_with('d'));
    }
}

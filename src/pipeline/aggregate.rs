//! Aggregate summary for the flight-board resource.
//!
//! The flight board churns hundreds of rows per update, so a raw line
//! diff is unreadable. Instead each new row is bucketed by country and
//! status, and the notification carries per-country counts.

use std::collections::BTreeMap;

/// Zero-based CSV field holding the country name.
const COUNTRY_FIELD: usize = 11;

/// Zero-based CSV field holding the flight status.
const STATUS_FIELD: usize = 15;

/// Per-country counts for one update of the flight board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightSummary {
    /// Departures by destination country
    pub departed: BTreeMap<String, u64>,

    /// Arrivals by origin country
    pub landed: BTreeMap<String, u64>,

    /// Cancellations by country
    pub cancelled: BTreeMap<String, u64>,
}

impl FlightSummary {
    /// Bucket each changed row by country and status.
    ///
    /// Rows with unrecognized status values, and rows too short to carry
    /// the status field, are ignored.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut summary = Self::default();

        for line in lines {
            let fields: Vec<&str> = line.as_ref().split(',').collect();
            if fields.len() <= STATUS_FIELD {
                continue;
            }
            let country = fields[COUNTRY_FIELD];
            let bucket = match fields[STATUS_FIELD] {
                "DEPARTED" => &mut summary.departed,
                "LANDED" => &mut summary.landed,
                "CANCELED" => &mut summary.cancelled,
                _ => continue,
            };
            *bucket.entry(country.to_string()).or_insert(0) += 1;
        }

        summary
    }

    /// Render the three labeled sections as a message body.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        lines.push("🛫 Departures To:".to_string());
        for (country, count) in &self.departed {
            lines.push(format!("{country}: {count}"));
        }

        lines.push("🛬 Arrived From:".to_string());
        for (country, count) in &self.landed {
            lines.push(format!("{country}: {count}"));
        }

        lines.push("❌ Cancelled Flights:".to_string());
        for (country, count) in &self.cancelled {
            lines.push(format!("{country}: {count}"));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(country: &str, status: &str) -> String {
        let mut fields = vec!["x"; 16];
        fields[COUNTRY_FIELD] = country;
        fields[STATUS_FIELD] = status;
        fields.join(",")
    }

    #[test]
    fn counts_per_country_and_status() {
        let lines = vec![
            row("IL", "LANDED"),
            row("IL", "LANDED"),
            row("GR", "DEPARTED"),
            row("IT", "CANCELED"),
            row("GR", "LANDED"),
        ];
        let summary = FlightSummary::from_lines(&lines);

        assert_eq!(summary.landed.get("IL"), Some(&2));
        assert_eq!(summary.landed.get("GR"), Some(&1));
        assert_eq!(summary.departed.get("GR"), Some(&1));
        assert_eq!(summary.cancelled.get("IT"), Some(&1));
    }

    #[test]
    fn unknown_status_is_ignored() {
        let lines = vec![row("IL", "DELAYED"), row("IL", "")];
        let summary = FlightSummary::from_lines(&lines);
        assert_eq!(summary, FlightSummary::default());
    }

    #[test]
    fn short_rows_are_ignored() {
        let lines = vec!["too,short".to_string(), String::new()];
        let summary = FlightSummary::from_lines(&lines);
        assert_eq!(summary, FlightSummary::default());
    }

    #[test]
    fn render_lists_sections_in_order() {
        let lines = vec![row("IL", "DEPARTED"), row("FR", "LANDED")];
        let body = FlightSummary::from_lines(&lines).render();

        let departures = body.find("🛫 Departures To:").unwrap();
        let arrivals = body.find("🛬 Arrived From:").unwrap();
        let cancellations = body.find("❌ Cancelled Flights:").unwrap();
        assert!(departures < arrivals && arrivals < cancellations);
        assert!(body.contains("IL: 1"));
        assert!(body.contains("FR: 1"));
    }

    #[test]
    fn empty_input_still_renders_headers() {
        let body = FlightSummary::from_lines::<String>(&[]).render();
        assert_eq!(
            body,
            "🛫 Departures To:\n🛬 Arrived From:\n❌ Cancelled Flights:"
        );
    }
}

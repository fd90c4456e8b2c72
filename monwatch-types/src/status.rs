//! Status page vocabulary and the ordered severity scale it maps onto.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{FieldConfig, ValueMapping};

/// Ordered severity of a status page component.
///
/// The ordinal values are part of the output contract: consumers render them
/// with fixed colors, so they must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(i8)]
pub enum Severity {
    /// Status text outside the known vocabulary.
    #[default]
    Unknown = 0,
    Maintenance = 1,
    Up = 2,
    Degraded = 3,
    Down = 4,
}

impl Severity {
    /// Every severity, lowest ordinal first.
    pub const ALL: [Severity; 5] = [
        Severity::Unknown,
        Severity::Maintenance,
        Severity::Up,
        Severity::Degraded,
        Severity::Down,
    ];

    pub const fn ordinal(self) -> i8 {
        self as i8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Maintenance => "maintenance",
            Severity::Up => "up",
            Severity::Degraded => "degraded",
            Severity::Down => "down",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Severity::Unknown => "grey",
            Severity::Maintenance => "blue",
            Severity::Up => "green",
            Severity::Degraded => "yellow",
            Severity::Down => "red",
        }
    }

    /// Display mapping for this severity, e.g. `(4) down` in red.
    pub fn value_mapping(self) -> ValueMapping {
        ValueMapping {
            value: self.ordinal().to_string(),
            text: format!("({}) {}", self.ordinal(), self.label()),
            color: self.color().to_string(),
        }
    }
}

/// Vocabulary shipped by default. Upstream status pages are inconsistent
/// about casing, so several spellings map to the same severity.
const DEFAULT_VOCABULARY: &[(&str, Severity)] = &[
    ("under_maintenance", Severity::Maintenance),
    ("up", Severity::Up),
    ("operational", Severity::Up),
    ("Good", Severity::Up),
    ("Information", Severity::Up),
    ("NotApplicable", Severity::Up),
    ("Advisory", Severity::Up),
    ("Healthy", Severity::Up),
    ("available", Severity::Up),
    ("information", Severity::Up),
    ("Degraded", Severity::Degraded),
    ("Warning", Severity::Degraded),
    ("degraded", Severity::Degraded),
    ("disruption", Severity::Degraded),
    ("down", Severity::Down),
    ("Disruption", Severity::Down),
    ("Critical", Severity::Down),
    ("outage", Severity::Down),
    ("degraded_performance", Severity::Down),
    ("major_outage", Severity::Down),
    ("partial_outage", Severity::Down),
];

/// Maps status text onto [`Severity`].
///
/// Lookups are exact (case-sensitive). Unknown text maps to
/// [`Severity::Unknown`] and is logged rather than treated as an error.
///
/// # Example
///
/// ```rust
/// use monwatch_types::{Severity, StatusMap};
///
/// let statuses = StatusMap::default().with_status("planned", Severity::Maintenance);
/// assert_eq!(statuses.map_status("major_outage"), Severity::Down);
/// assert_eq!(statuses.map_status("planned"), Severity::Maintenance);
/// assert_eq!(statuses.map_status("sideways"), Severity::Unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMap {
    vocabulary: BTreeMap<String, Severity>,
}

impl StatusMap {
    /// A map with no vocabulary at all; everything maps to `Unknown`.
    pub fn empty() -> Self {
        Self {
            vocabulary: BTreeMap::new(),
        }
    }

    /// Add or override one entry.
    pub fn with_status(mut self, text: impl Into<String>, severity: Severity) -> Self {
        self.vocabulary.insert(text.into(), severity);
        self
    }

    /// Add or override several entries.
    pub fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (S, Severity)>,
        S: Into<String>,
    {
        self.vocabulary
            .extend(entries.into_iter().map(|(text, sev)| (text.into(), sev)));
    }

    /// Look up text without falling back.
    pub fn get(&self, text: &str) -> Option<Severity> {
        self.vocabulary.get(text).copied()
    }

    /// Map text to a severity, falling back to `Unknown`.
    pub fn map_status(&self, text: &str) -> Severity {
        match self.get(text) {
            Some(severity) => severity,
            None => {
                warn!(status = text, "unrecognized status, mapping to unknown");
                Severity::Unknown
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Field configuration carrying one value mapping per severity.
    pub fn field_config(&self) -> FieldConfig {
        FieldConfig {
            mappings: Severity::ALL.iter().map(|s| s.value_mapping()).collect(),
        }
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.extend(DEFAULT_VOCABULARY.iter().copied());
        map
    }
}

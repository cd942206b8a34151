//! Non-fatal warnings returned by manifest validation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Warning code the backend uses for changes that may break an existing app.
pub const BREAKING_CHANGE: &str = "breaking_change";

/// A single warning, usually pointing into the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remediation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pointer: String,
}

/// Ordered list of warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warnings(pub Vec<Warning>);

struct WarningGroup<'a> {
    code: &'a str,
    message: &'a str,
    remediation: &'a str,
    pointers: Vec<&'a str>,
}

impl Warnings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    /// True when any warning has the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.0.iter().any(|w| w.code == code)
    }

    /// Formats the warnings under a header `message`.
    ///
    /// Warnings sharing code, message and remediation are grouped and their
    /// pointers listed as sources. Without `verbose`, groups with four or
    /// more sources show only the first two.
    pub fn format(&self, verbose: bool, message: &str) -> String {
        if self.0.is_empty() {
            return message.to_string();
        }

        let mut grouped: BTreeMap<(&str, &str, &str), Vec<&str>> = BTreeMap::new();
        for warning in &self.0 {
            grouped
                .entry((
                    warning.code.as_str(),
                    warning.message.as_str(),
                    warning.remediation.as_str(),
                ))
                .or_default()
                .push(warning.pointer.as_str());
        }

        let mut groups: Vec<WarningGroup<'_>> = grouped
            .into_iter()
            .map(|((code, message, remediation), mut pointers)| {
                pointers.sort_unstable();
                WarningGroup {
                    code,
                    message,
                    remediation,
                    pointers,
                }
            })
            .collect();
        groups.sort_by(|a, b| {
            a.code
                .cmp(b.code)
                .then_with(|| match (a.pointers.first(), b.pointers.first()) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
        });

        let sections: Vec<String> = groups.iter().map(|g| g.render(verbose)).collect();
        format!("{message}\n\n{}\n", sections.join("\n"))
    }
}

impl WarningGroup<'_> {
    fn render(&self, verbose: bool) -> String {
        let mut lines = Vec::new();
        if self.code.is_empty() {
            lines.push(self.message.to_string());
        } else {
            lines.push(format!("{} ({})", self.message, self.code));
        }

        let sources: Vec<&str> = self
            .pointers
            .iter()
            .copied()
            .filter(|p| !p.is_empty())
            .collect();
        if verbose || sources.len() < 4 {
            lines.extend(sources.iter().map(|p| format!("   Source: {p}")));
        } else {
            lines.extend(sources.iter().take(2).map(|p| format!("   Source: {p}")));
            lines.push(format!(
                "   Similar warnings from '{}' other sources can be revealed with --verbose",
                sources.len() - 2
            ));
        }

        if !self.remediation.is_empty() {
            lines.push(format!("   Suggestion: {}", self.remediation));
        }
        lines.join("\n")
    }
}

impl From<Vec<Warning>> for Warnings {
    fn from(warnings: Vec<Warning>) -> Self {
        Warnings(warnings)
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

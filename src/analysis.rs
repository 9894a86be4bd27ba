//! Issuer-country summary over harvested rows.

use std::collections::{HashMap, HashSet};

use crate::sink::SinkRow;

/// Issuer countries of the first certificate seen for each domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountrySummary {
    /// `(country, domains)` sorted by count descending, then country
    pub counts: Vec<(String, usize)>,
    /// Distinct domains considered
    pub domains: usize,
    /// Domains whose issuer carries no `C=` component
    pub without_country: usize,
}

/// Returns the value of the first `C=` component of an RFC 4514 DN.
///
/// Escaped commas inside other values do not split components.
pub fn issuer_country(issuer: &str) -> Option<String> {
    split_components(issuer).into_iter().find_map(|component| {
        let (attr, value) = component.split_once('=')?;
        (attr.trim().eq_ignore_ascii_case("C") && !value.trim().is_empty())
            .then(|| value.trim().to_string())
    })
}

/// Counts issuer countries, one per domain.
///
/// Rows are expected in output order, so the first row of a domain is its
/// leaf certificate; later rows for the same domain are ignored.
///
/// Rows carry no chain position. When a domain's leaf could not be decoded
/// and was skipped at harvest time, its first surviving row (usually an
/// intermediate) is the one counted.
pub fn country_counts(rows: &[SinkRow]) -> CountrySummary {
    let mut seen = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut without_country = 0;

    for row in rows {
        if !seen.insert(row.domain.as_str()) {
            continue;
        }
        match issuer_country(&row.issuer) {
            Some(country) => *counts.entry(country).or_default() += 1,
            None => without_country += 1,
        }
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    CountrySummary {
        counts,
        domains: seen.len(),
        without_country,
    }
}

fn split_components(dn: &str) -> Vec<&str> {
    let mut components = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                components.push(&dn[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    components.push(&dn[start..]);
    components
}

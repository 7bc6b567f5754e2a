//! OWASP category resolution

use std::collections::BTreeMap;

use crate::domain::{DomainError, OwaspCategory, OwaspEdition};

/// Resolve an issue's OWASP category.
///
/// A mapping object wins over the legacy field and resolves to the newest
/// edition with a non-zero value. The legacy field is a 2019 category number.
/// Absent or all-zero input resolves to [`OwaspCategory::None`].
pub fn resolve_owasp(
    legacy: Option<u64>,
    mapping: Option<&BTreeMap<String, u64>>,
) -> Result<OwaspCategory, DomainError> {
    if let Some(mapping) = mapping
        && !mapping.is_empty()
    {
        let mut best: Option<(OwaspEdition, u64)> = None;
        for (year, value) in mapping {
            let edition = year
                .parse::<u16>()
                .ok()
                .and_then(OwaspEdition::from_year)
                .ok_or_else(|| DomainError::UnknownOwaspCategory(format!("{}:{}", value, year)))?;
            // Validate every entry, not just the selected one
            OwaspCategory::lookup(edition, *value)?;
            if *value != 0 && best.is_none_or(|(e, _)| edition > e) {
                best = Some((edition, *value));
            }
        }
        return match best {
            Some((edition, value)) => OwaspCategory::lookup(edition, value),
            None => Ok(OwaspCategory::None),
        };
    }

    match legacy {
        Some(value) => OwaspCategory::lookup(OwaspEdition::Y2019, value),
        None => Ok(OwaspCategory::None),
    }
}

//! Column-name to region resolution.
//!
//! The provider spells subsystems many ways (`sudeste`, `SE`, `se_co`,
//! `val_carga_se`, ...). Every place that maps a provider string onto a
//! [`Region`] goes through this module so bulk files and catalog samples agree.
//!
//! Matching rule, applied to trimmed, lowercased names:
//! - a name matches an alias if it equals it or ends with `"_" + alias`
//! - aliases are tried in table order; the first alias that matches any name wins
//! - among names matching that alias, the first one in provider order wins

use crate::domain::Region;

const SOUTHEAST: &[&str] = &["sudeste", "se_co", "seco", "se"];
const SOUTH: &[&str] = &["sul", "s"];
const NORTHEAST: &[&str] = &["nordeste", "ne"];
const NORTH: &[&str] = &["norte", "n"];

/// Accepted spellings for `region`, most specific first.
pub fn aliases(region: Region) -> &'static [&'static str] {
    match region {
        Region::Southeast => SOUTHEAST,
        Region::South => SOUTH,
        Region::Northeast => NORTHEAST,
        Region::North => NORTH,
    }
}

fn alias_matches(name: &str, alias: &str) -> bool {
    name == alias
        || name
            .strip_suffix(alias)
            .is_some_and(|prefix| prefix.ends_with('_'))
}

/// Every name that matches `region`, in resolution priority order.
///
/// A name can appear more than once if it matches several aliases. Callers
/// that need a parseable value walk this list and stop at the first hit.
pub fn candidates<'a>(names: &[&'a str], region: Region) -> Vec<&'a str> {
    let normalized: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();

    let mut out = Vec::new();
    for alias in aliases(region) {
        for (idx, name) in normalized.iter().enumerate() {
            if alias_matches(name, alias) {
                out.push(names[idx]);
            }
        }
    }
    out
}

/// The single best name for `region`, if any.
pub fn resolve_field<'a>(names: &[&'a str], region: Region) -> Option<&'a str> {
    candidates(names, region).into_iter().next()
}

/// Map a subsystem identifier value (`SE`, `SUDESTE`, `nordeste`, ...) to a region.
///
/// Regions are tried in canonical order with the same alias rule used for
/// column names.
pub fn region_for_identifier(value: &str) -> Option<Region> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Region::ALL
        .into_iter()
        .find(|region| resolve_field(&[value], *region).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_suffix_matches_are_accepted() {
        let names = ["din_instante", "val_carga_ne", "Sudeste "];
        assert_eq!(resolve_field(&names, Region::Southeast), Some("Sudeste "));
        assert_eq!(resolve_field(&names, Region::Northeast), Some("val_carga_ne"));
        assert_eq!(resolve_field(&names, Region::North), None);
    }

    #[test]
    fn suffix_requires_an_underscore_boundary() {
        // "nordeste" ends with "se" and "norte" starts with "n", neither may leak.
        let names = ["nordeste", "norte"];
        assert_eq!(resolve_field(&names, Region::Southeast), None);
        assert_eq!(resolve_field(&names, Region::South), None);
        assert_eq!(resolve_field(&names, Region::Northeast), Some("nordeste"));
        assert_eq!(resolve_field(&names, Region::North), Some("norte"));
    }

    #[test]
    fn earliest_alias_wins_over_field_order() {
        // Regression pin: `se_co` sits before `se` in the table, so it wins even
        // though `se` appears first in the record.
        let names = ["se", "se_co"];
        for _ in 0..3 {
            assert_eq!(resolve_field(&names, Region::Southeast), Some("se_co"));
        }
        assert_eq!(candidates(&names, Region::Southeast), vec!["se_co", "se"]);
    }

    #[test]
    fn earliest_field_wins_within_one_alias() {
        let names = ["ear_se", "val_se", "se"];
        assert_eq!(resolve_field(&names, Region::Southeast), Some("ear_se"));
    }

    #[test]
    fn identifiers_resolve_to_regions() {
        assert_eq!(region_for_identifier("SE"), Some(Region::Southeast));
        assert_eq!(region_for_identifier("SUDESTE"), Some(Region::Southeast));
        assert_eq!(region_for_identifier(" s "), Some(Region::South));
        assert_eq!(region_for_identifier("SUL"), Some(Region::South));
        assert_eq!(region_for_identifier("NE"), Some(Region::Northeast));
        assert_eq!(region_for_identifier("Nordeste"), Some(Region::Northeast));
        assert_eq!(region_for_identifier("N"), Some(Region::North));
        assert_eq!(region_for_identifier("NORTE"), Some(Region::North));
        assert_eq!(region_for_identifier("SIN"), None);
        assert_eq!(region_for_identifier(""), None);
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::key::StratumKey;

/// User choice of regions, owners, sites and species to aggregate over.
///
/// An empty set, or a set containing 0, selects every value of that field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub regions: BTreeSet<u32>,
    pub owners: BTreeSet<u8>,
    pub sites: BTreeSet<u8>,
    pub species: BTreeSet<u8>,
}

fn is_wildcard<T: Ord + Default>(set: &BTreeSet<T>) -> bool {
    set.is_empty() || set.contains(&T::default())
}

fn values_or_any<T: Ord + Default + Copy>(set: &BTreeSet<T>) -> Vec<T> {
    if set.is_empty() {
        vec![T::default()]
    } else {
        set.iter().copied().collect()
    }
}

impl Selection {
    /// Selection of every stratum.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(
        regions: impl IntoIterator<Item = u32>,
        owners: impl IntoIterator<Item = u8>,
        sites: impl IntoIterator<Item = u8>,
        species: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            regions: regions.into_iter().collect(),
            owners: owners.into_iter().collect(),
            sites: sites.into_iter().collect(),
            species: species.into_iter().collect(),
        }
    }

    /// Whether a stored stratum key lies inside this selection.
    ///
    /// Each stratum is tested once, so listing both 0 and a concrete value
    /// in one set does not count the same stratum twice.
    pub fn matches(&self, key: StratumKey) -> bool {
        let owners = values_or_any(&self.owners);
        let sites = values_or_any(&self.sites);
        let species = values_or_any(&self.species);
        values_or_any(&self.regions).into_iter().any(|r| {
            owners.iter().any(|&o| {
                sites
                    .iter()
                    .any(|&s| species.iter().any(|&sp| key.matches(r, o, s, sp)))
            })
        })
    }

    /// Whether every field is a wildcard.
    pub fn is_all(&self) -> bool {
        is_wildcard(&self.regions)
            && is_wildcard(&self.owners)
            && is_wildcard(&self.sites)
            && is_wildcard(&self.species)
    }
}

/// Parse a comma-separated id list such as "1,3,4". "all" and "" give the wildcard.
pub fn parse_id_list<T>(input: &str) -> Result<BTreeSet<T>, crate::error::EfiscenError>
where
    T: std::str::FromStr + Ord,
{
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return Ok(BTreeSet::new());
    }
    trimmed
        .split(',')
        .map(|part| {
            part.trim().parse::<T>().map_err(|_| {
                crate::error::EfiscenError::ParseError(format!("Invalid id '{}'", part.trim()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_everything() {
        let sel = Selection::all();
        assert!(sel.is_all());
        assert!(sel.matches(StratumKey::pack(4, 3, 2, 1)));
    }

    #[test]
    fn test_zero_in_set_is_wildcard() {
        let sel = Selection::new([0], [2], [0], [0]);
        assert!(!sel.is_all());
        assert!(sel.matches(StratumKey::pack(1, 2, 3, 4)));
        assert!(!sel.matches(StratumKey::pack(1, 3, 3, 4)));
    }

    #[test]
    fn test_multiple_values_per_field() {
        let sel = Selection::new([1, 2], [], [], [5, 6]);
        assert!(sel.matches(StratumKey::pack(2, 1, 1, 6)));
        assert!(!sel.matches(StratumKey::pack(3, 1, 1, 6)));
        assert!(!sel.matches(StratumKey::pack(1, 1, 1, 7)));
    }

    #[test]
    fn test_parse_id_list() {
        let ids: BTreeSet<u32> = parse_id_list("1, 3,4").unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 3, 4]);
        assert!(parse_id_list::<u8>("all").unwrap().is_empty());
        assert!(parse_id_list::<u8>("").unwrap().is_empty());
        assert!(parse_id_list::<u8>("1,x").is_err());
        assert!(parse_id_list::<u8>("300").is_err());
    }
}

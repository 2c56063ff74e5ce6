use serde::{Deserialize, Serialize};

const BAND_MASK: u64 = 0xFF;
const OWNER_SHIFT: u32 = 16;
const SITE_SHIFT: u32 = 8;
const REGION_SHIFT: u32 = 24;

/// Packed identifier of one stratum: `region<<24 | owner<<16 | site<<8 | species`.
///
/// Owner, site and species each occupy an 8-bit band; region takes every bit
/// above them. A field value of 0 is reserved for "any" when the key is used
/// as a filter, so real strata are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StratumKey(pub u64);

impl StratumKey {
    /// Pack the four stratum fields into one key.
    pub fn pack(region: u32, owner: u8, site: u8, species: u8) -> Self {
        StratumKey(
            (u64::from(region) << REGION_SHIFT)
                | (u64::from(owner) << OWNER_SHIFT)
                | (u64::from(site) << SITE_SHIFT)
                | u64::from(species),
        )
    }

    pub fn region(&self) -> u32 {
        (self.0 >> REGION_SHIFT) as u32
    }

    pub fn owner(&self) -> u8 {
        ((self.0 >> OWNER_SHIFT) & BAND_MASK) as u8
    }

    pub fn site(&self) -> u8 {
        ((self.0 >> SITE_SHIFT) & BAND_MASK) as u8
    }

    pub fn species(&self) -> u8 {
        (self.0 & BAND_MASK) as u8
    }

    /// Decode into `(region, owner, site, species)`.
    pub fn unpack(&self) -> (u32, u8, u8, u8) {
        (self.region(), self.owner(), self.site(), self.species())
    }

    /// Whether this stored key falls under the given filter.
    ///
    /// Filter fields equal to 0 are wildcards: their band is masked out of
    /// both sides before the comparison. Consequently a genuine field value
    /// of 0 in the stored key can never be selected on its own.
    pub fn matches(&self, region: u32, owner: u8, site: u8, species: u8) -> bool {
        let mut mask = u64::MAX;
        if region == 0 {
            mask &= (1u64 << REGION_SHIFT) - 1;
        }
        if owner == 0 {
            mask &= !(BAND_MASK << OWNER_SHIFT);
        }
        if site == 0 {
            mask &= !(BAND_MASK << SITE_SHIFT);
        }
        if species == 0 {
            mask &= !BAND_MASK;
        }
        let filter = StratumKey::pack(region, owner, site, species);
        self.0 & mask == filter.0 & mask
    }

    /// Whether the region fits the 32 bits that `pack` and `region` carry.
    pub fn is_packable(&self) -> bool {
        self.0 >> (REGION_SHIFT + u32::BITS) == 0
    }

    /// True when every field is non-zero, i.e. the key can name a real stratum.
    pub fn is_concrete(&self) -> bool {
        self.region() != 0 && self.owner() != 0 && self.site() != 0 && self.species() != 0
    }
}

impl std::fmt::Display for StratumKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (r, o, s, sp) = self.unpack();
        write!(f, "R{r}/O{o}/S{s}/Sp{sp}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_scenario_value() {
        let key = StratumKey::pack(1, 2, 3, 4);
        assert_eq!(key.0, (1 << 24) + (2 << 16) + (3 << 8) + 4);
        assert_eq!(key.0, 16_909_060);
    }

    #[test]
    fn test_owner_only_filter_matches() {
        let key = StratumKey::pack(1, 2, 3, 4);
        assert!(key.matches(0, 2, 0, 0));
        assert!(!key.matches(0, 3, 0, 0));
    }

    #[test]
    fn test_all_wildcards_match_everything() {
        assert!(StratumKey::pack(7, 9, 1, 200).matches(0, 0, 0, 0));
    }

    #[test]
    fn test_large_region_occupies_upper_bits() {
        let key = StratumKey::pack(1000, 1, 1, 1);
        assert_eq!(key.region(), 1000);
        assert!(key.matches(1000, 0, 0, 0));
        assert!(!key.matches(999, 0, 0, 0));
    }

    #[test]
    fn test_zero_field_is_indistinguishable_from_wildcard() {
        // A stored species of 0 is matched by any species filter of 0 and by
        // nothing else.
        let key = StratumKey::pack(1, 1, 1, 0);
        assert!(key.matches(1, 1, 1, 0));
        assert!(!key.is_concrete());
    }

    #[test]
    fn test_region_above_32_bits_is_not_packable() {
        assert!(StratumKey::pack(u32::MAX, 255, 255, 255).is_packable());
        let wide = StratumKey((1u64 << 56) | StratumKey::pack(1, 1, 1, 1).0);
        assert!(!wide.is_packable());
        // the truncated region aliases a packable key
        assert_eq!(wide.unpack(), StratumKey::pack(1, 1, 1, 1).unpack());
    }

    #[test]
    fn test_display() {
        assert_eq!(StratumKey::pack(1, 2, 3, 4).to_string(), "R1/O2/S3/Sp4");
    }

    proptest! {
        #[test]
        fn prop_unpack_inverts_pack(r in 0u32..100_000, o: u8, s: u8, sp: u8) {
            let key = StratumKey::pack(r, o, s, sp);
            prop_assert_eq!(key.unpack(), (r, o, s, sp));
        }

        #[test]
        fn prop_matches_iff_non_wildcard_fields_equal(
            r in 1u32..50, o in 1u8..=255, s in 1u8..=255, sp in 1u8..=255,
            fr in 0u32..50, fo: u8, fs: u8, fsp: u8,
        ) {
            let key = StratumKey::pack(r, o, s, sp);
            let expected = (fr == 0 || fr == r)
                && (fo == 0 || fo == o)
                && (fs == 0 || fs == s)
                && (fsp == 0 || fsp == sp);
            prop_assert_eq!(key.matches(fr, fo, fs, fsp), expected);
        }

        #[test]
        fn prop_key_matches_itself(
            r in 1u32..100_000, o in 1u8..=255, s in 1u8..=255, sp in 1u8..=255,
        ) {
            let key = StratumKey::pack(r, o, s, sp);
            prop_assert!(key.matches(r, o, s, sp));
        }
    }
}

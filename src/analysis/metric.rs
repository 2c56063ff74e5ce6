use serde::{Deserialize, Serialize};

use crate::error::EfiscenError;

/// Output metrics that can be charted or summarised over a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Area,
    GrowingStock,
    DeadWood,
    /// Area-weighted mean net annual increment
    IncrAv,
    NatMort,
    ThinArea,
    FellArea,
    ThinRems,
    FelRems,
    PotentFellArea,
    PotentFellVol,
    BareArea,
    AfforFund,
    /// Growing stock per hectare
    AvgVolume,
    Nwl,
    Fwl,
    Cwl,
    Sol,
    Cel,
    Lig,
    Hum1,
    Hum2,
    Cout,
    CSoil,
    Stem,
    CRoots,
    FRoots,
    Branches,
    Leaves,
    TCarbon,
}

impl Metric {
    pub const ALL: [Metric; 30] = [
        Metric::Area,
        Metric::GrowingStock,
        Metric::DeadWood,
        Metric::IncrAv,
        Metric::NatMort,
        Metric::ThinArea,
        Metric::FellArea,
        Metric::ThinRems,
        Metric::FelRems,
        Metric::PotentFellArea,
        Metric::PotentFellVol,
        Metric::BareArea,
        Metric::AfforFund,
        Metric::AvgVolume,
        Metric::Nwl,
        Metric::Fwl,
        Metric::Cwl,
        Metric::Sol,
        Metric::Cel,
        Metric::Lig,
        Metric::Hum1,
        Metric::Hum2,
        Metric::Cout,
        Metric::CSoil,
        Metric::Stem,
        Metric::CRoots,
        Metric::FRoots,
        Metric::Branches,
        Metric::Leaves,
        Metric::TCarbon,
    ];

    /// Tag used in charts, config files and on the command line.
    pub fn tag(&self) -> &'static str {
        match self {
            Metric::Area => "Area",
            Metric::GrowingStock => "GrStock",
            Metric::DeadWood => "DeadWood",
            Metric::IncrAv => "IncrAv",
            Metric::NatMort => "NatMort",
            Metric::ThinArea => "ThinArea",
            Metric::FellArea => "FFarea",
            Metric::ThinRems => "ThinRems",
            Metric::FelRems => "FelRems",
            Metric::PotentFellArea => "PotentFellArea",
            Metric::PotentFellVol => "PotentFellVol",
            Metric::BareArea => "BareArea",
            Metric::AfforFund => "AfforFund",
            Metric::AvgVolume => "avgVolume",
            Metric::Nwl => "NWL",
            Metric::Fwl => "FWL",
            Metric::Cwl => "CWL",
            Metric::Sol => "SOL",
            Metric::Cel => "CEL",
            Metric::Lig => "LIG",
            Metric::Hum1 => "HUM1",
            Metric::Hum2 => "HUM2",
            Metric::Cout => "COUT",
            Metric::CSoil => "CSoil",
            Metric::Stem => "Stem",
            Metric::CRoots => "CRoots",
            Metric::FRoots => "FRoots",
            Metric::Branches => "Branches",
            Metric::Leaves => "Leaves",
            Metric::TCarbon => "tCarbon",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Area
            | Metric::ThinArea
            | Metric::FellArea
            | Metric::PotentFellArea
            | Metric::BareArea
            | Metric::AfforFund => "ha",
            Metric::GrowingStock
            | Metric::DeadWood
            | Metric::NatMort
            | Metric::ThinRems
            | Metric::FelRems
            | Metric::PotentFellVol => "m3",
            Metric::IncrAv => "m3/ha/yr",
            Metric::AvgVolume => "m3/ha",
            Metric::Cout => "tC/yr",
            _ => "tC",
        }
    }

    /// Whether the metric is recorded as an age-class distribution.
    pub fn has_age_classes(&self) -> bool {
        matches!(
            self,
            Metric::Area
                | Metric::GrowingStock
                | Metric::DeadWood
                | Metric::NatMort
                | Metric::ThinArea
                | Metric::FellArea
                | Metric::ThinRems
                | Metric::FelRems
                | Metric::Stem
                | Metric::CRoots
                | Metric::FRoots
                | Metric::Branches
                | Metric::Leaves
        )
    }

    /// Whether the metric is a ratio over area rather than a plain sum.
    pub fn is_area_weighted(&self) -> bool {
        matches!(self, Metric::IncrAv | Metric::AvgVolume)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for Metric {
    type Err = EfiscenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("vol") {
            return Ok(Metric::GrowingStock);
        }
        Metric::ALL
            .iter()
            .find(|m| m.tag().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| EfiscenError::ParseError(format!("Unknown metric: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_parses_back() {
        for metric in Metric::ALL {
            let parsed: Metric = metric.tag().parse().unwrap();
            assert_eq!(parsed, metric);
        }
    }

    #[test]
    fn test_vol_alias() {
        assert_eq!("Vol".parse::<Metric>().unwrap(), Metric::GrowingStock);
        assert_eq!("grstock".parse::<Metric>().unwrap(), Metric::GrowingStock);
    }

    #[test]
    fn test_unknown_metric() {
        assert!("Biomass".parse::<Metric>().is_err());
    }

    #[test]
    fn test_area_weighted() {
        assert!(Metric::IncrAv.is_area_weighted());
        assert!(Metric::AvgVolume.is_area_weighted());
        assert!(!Metric::Area.is_area_weighted());
    }
}

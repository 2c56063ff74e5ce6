use serde::{Deserialize, Serialize};

/// Per-session output tables, in the order a full export writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Table {
    Base,
    FellingMatrix,
    ThinningMatrix,
    NatMort,
    CarbonSoil,
    TreeC,
    CarbonCountry,
    FellingResidues,
    ThinningResidues,
    Deadwood,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Base,
        Table::FellingMatrix,
        Table::ThinningMatrix,
        Table::NatMort,
        Table::CarbonSoil,
        Table::TreeC,
        Table::CarbonCountry,
        Table::FellingResidues,
        Table::ThinningResidues,
        Table::Deadwood,
    ];

    /// Key used in selection files.
    pub fn key(&self) -> &'static str {
        match self {
            Table::Base => "base",
            Table::FellingMatrix => "felling_matrix",
            Table::ThinningMatrix => "thinning_matrix",
            Table::NatMort => "natmort",
            Table::CarbonSoil => "carbon_soil",
            Table::TreeC => "treec_matrix",
            Table::CarbonCountry => "carbon_country",
            Table::FellingResidues => "felling_residues",
            Table::ThinningResidues => "thinning_residues",
            Table::Deadwood => "deadwood",
        }
    }

    /// Name of the table in the output store.
    pub fn table_name(&self) -> &'static str {
        match self {
            Table::Base => "base",
            Table::FellingMatrix => "fellingmatrix",
            Table::ThinningMatrix => "thinningmatrix",
            Table::NatMort => "natmort",
            Table::CarbonSoil => "carbonsoil",
            Table::TreeC => "treec",
            Table::CarbonCountry => "carboncountry",
            Table::FellingResidues => "fellresidues",
            Table::ThinningResidues => "thinresidues",
            Table::Deadwood => "deadwood",
        }
    }

    /// Label used in validation errors and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Table::Base => "Base",
            Table::FellingMatrix => "FellingMatrix",
            Table::ThinningMatrix => "ThinningMatrix",
            Table::NatMort => "NatMort",
            Table::CarbonSoil => "CarbonSoil",
            Table::TreeC => "TreeC",
            Table::CarbonCountry => "CarbonCountry",
            Table::FellingResidues => "FellResidues",
            Table::ThinningResidues => "ThinResidues",
            Table::Deadwood => "Deadwood",
        }
    }

    /// Whether rows of this table carry a `matrix_id`.
    pub fn is_per_stratum(&self) -> bool {
        !matches!(self, Table::CarbonSoil | Table::CarbonCountry)
    }

    pub fn from_key(key: &str) -> Option<Table> {
        Table::ALL.iter().find(|t| t.key() == key).copied()
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

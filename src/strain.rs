use std::fmt;

use serde::{Deserialize, Serialize};

/// The five challenge organisms, declared in canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strain {
    #[serde(rename = "E.coli")]
    EColi,
    #[serde(rename = "P.aeruginosa")]
    PAeruginosa,
    #[serde(rename = "S.aureus")]
    SAureus,
    #[serde(rename = "C.albicans")]
    CAlbicans,
    #[serde(rename = "A.brasiliensis")]
    ABrasiliensis,
}

impl Strain {
    pub const ALL: [Strain; 5] = [
        Strain::EColi,
        Strain::PAeruginosa,
        Strain::SAureus,
        Strain::CAlbicans,
        Strain::ABrasiliensis,
    ];

    pub fn canonical(self) -> &'static str {
        match self {
            Strain::EColi => "E.coli",
            Strain::PAeruginosa => "P.aeruginosa",
            Strain::SAureus => "S.aureus",
            Strain::CAlbicans => "C.albicans",
            Strain::ABrasiliensis => "A.brasiliensis",
        }
    }

    /// Spellings seen on reports, matched case-insensitively by containment.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Strain::EColi => &["E.coli", "Escherichia coli", "E. coli", "Escherichia"],
            Strain::PAeruginosa => &["P.aeruginosa", "Pseudomonas aeruginosa", "P. aeruginosa", "Pseudomonas"],
            Strain::SAureus => &["S.aureus", "Staphylococcus aureus", "S. aureus", "Staphylococcus"],
            Strain::CAlbicans => &["C.albicans", "Candida albicans", "C. albicans", "Candida"],
            Strain::ABrasiliensis => &["A.brasiliensis", "Aspergillus brasiliensis", "A. brasiliensis", "Aspergillus"],
        }
    }

    /// Recognize a strain inside free cell text.
    pub fn from_text(text: &str) -> Option<Strain> {
        let lower = text.to_lowercase();
        Strain::ALL
            .into_iter()
            .find(|s| s.aliases().iter().any(|a| lower.contains(&a.to_lowercase())))
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Canonical short name for a strain spelling, or "" when unrecognized.
pub fn normalize_strain(text: &str) -> String {
    Strain::from_text(text).map(|s| s.canonical().to_string()).unwrap_or_default()
}

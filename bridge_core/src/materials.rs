//! # Material Grades
//!
//! Fixed grade lists offered by the form: structural steel for girders and
//! cross bracing (IS 2062 E-grades) and deck concrete (IS 456 M-grades).
//!
//! Grades serialize as their designation string (`"E250"`, `"M25"`), which
//! is also what appears in exported project files.
//!
//! ```rust
//! use bridge_core::materials::{ConcreteGrade, SteelGrade};
//!
//! let girder: SteelGrade = "E350".parse().unwrap();
//! assert_eq!(girder, SteelGrade::E350);
//! assert_eq!(ConcreteGrade::default().designation(), "M25");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// Structural steel grade for girders and bracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SteelGrade {
    #[default]
    E250,
    E350,
    E450,
}

impl SteelGrade {
    /// All grades offered by the form, in display order
    pub const ALL: [SteelGrade; 3] = [SteelGrade::E250, SteelGrade::E350, SteelGrade::E450];

    /// Grade designation (e.g., "E250")
    pub fn designation(&self) -> &'static str {
        match self {
            SteelGrade::E250 => "E250",
            SteelGrade::E350 => "E350",
            SteelGrade::E450 => "E450",
        }
    }
}

impl fmt::Display for SteelGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.designation())
    }
}

impl FromStr for SteelGrade {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        SteelGrade::ALL
            .into_iter()
            .find(|g| g.designation() == wanted)
            .ok_or_else(|| CalcError::invalid_input("steel_grade", s, "Expected one of E250, E350, E450"))
    }
}

/// Deck concrete grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConcreteGrade {
    #[default]
    M25,
    M30,
    M35,
    M40,
    M45,
    M50,
    M55,
    M60,
}

impl ConcreteGrade {
    /// All grades offered by the form, in display order
    pub const ALL: [ConcreteGrade; 8] = [
        ConcreteGrade::M25,
        ConcreteGrade::M30,
        ConcreteGrade::M35,
        ConcreteGrade::M40,
        ConcreteGrade::M45,
        ConcreteGrade::M50,
        ConcreteGrade::M55,
        ConcreteGrade::M60,
    ];

    /// Grade designation (e.g., "M25")
    pub fn designation(&self) -> &'static str {
        match self {
            ConcreteGrade::M25 => "M25",
            ConcreteGrade::M30 => "M30",
            ConcreteGrade::M35 => "M35",
            ConcreteGrade::M40 => "M40",
            ConcreteGrade::M45 => "M45",
            ConcreteGrade::M50 => "M50",
            ConcreteGrade::M55 => "M55",
            ConcreteGrade::M60 => "M60",
        }
    }
}

impl fmt::Display for ConcreteGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.designation())
    }
}

impl FromStr for ConcreteGrade {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ConcreteGrade::ALL
            .into_iter()
            .find(|g| g.designation() == wanted)
            .ok_or_else(|| CalcError::invalid_input("concrete_grade", s, "Expected one of M25 through M60"))
    }
}

/// Material selection for one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialSelection {
    /// Girder steel grade
    pub girder_steel: SteelGrade,

    /// Cross bracing steel grade
    pub bracing_steel: SteelGrade,

    /// Deck concrete grade
    pub deck_concrete: ConcreteGrade,
}

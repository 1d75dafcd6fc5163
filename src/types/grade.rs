use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// School grade a question is aimed at.
///
/// The wire and storage form is the upper-case name, e.g. `GRADE7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    Grade1,
    Grade2,
    Grade3,
    Grade4,
    Grade5,
    Grade6,
    Grade7,
    Grade8,
    Grade9,
    Grade10,
    Grade11,
    Grade12,
}

impl Grade {
    pub const ALL: [Grade; 12] = [
        Grade::Grade1,
        Grade::Grade2,
        Grade::Grade3,
        Grade::Grade4,
        Grade::Grade5,
        Grade::Grade6,
        Grade::Grade7,
        Grade::Grade8,
        Grade::Grade9,
        Grade::Grade10,
        Grade::Grade11,
        Grade::Grade12,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Grade1 => "GRADE1",
            Grade::Grade2 => "GRADE2",
            Grade::Grade3 => "GRADE3",
            Grade::Grade4 => "GRADE4",
            Grade::Grade5 => "GRADE5",
            Grade::Grade6 => "GRADE6",
            Grade::Grade7 => "GRADE7",
            Grade::Grade8 => "GRADE8",
            Grade::Grade9 => "GRADE9",
            Grade::Grade10 => "GRADE10",
            Grade::Grade11 => "GRADE11",
            Grade::Grade12 => "GRADE12",
        }
    }

    /// Human readable label used by the submission form.
    pub fn label(&self) -> String {
        format!("Grade {}", self.number())
    }

    pub fn number(&self) -> u8 {
        Grade::ALL
            .iter()
            .position(|grade| grade == self)
            .map(|index| index as u8 + 1)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGrade(pub String);

impl std::fmt::Display for UnknownGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "unknown grade: {}", self.0)
    }
}

impl std::error::Error for UnknownGrade {}

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .iter()
            .find(|grade| grade.as_str() == s.trim())
            .copied()
            .ok_or_else(|| UnknownGrade(s.to_string()))
    }
}

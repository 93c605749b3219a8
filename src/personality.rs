//! Pet personality test: the bundled question sheet and the classifier.
//!
//! The test scores three axes 0–100. A score above 50 sets the axis flag;
//! the three flags form a 3-bit index into the eight personality types.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Bundled question sheet, parsed on first use.
const SHEET_JSON: &str = include_str!("../assets/personality-sheet.json");

/// The eight personality types, ordered by their 3-bit index:
/// +4 extroverted, +2 leading, +1 emotional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonalityType {
    #[serde(rename = "IDR")]
    Idr,
    #[serde(rename = "IDE")]
    Ide,
    #[serde(rename = "ILR")]
    Ilr,
    #[serde(rename = "ILE")]
    Ile,
    #[serde(rename = "EDR")]
    Edr,
    #[serde(rename = "EDE")]
    Ede,
    #[serde(rename = "ELR")]
    Elr,
    #[serde(rename = "ELE")]
    Ele,
}

const ALL_TYPES: [PersonalityType; 8] = [
    PersonalityType::Idr,
    PersonalityType::Ide,
    PersonalityType::Ilr,
    PersonalityType::Ile,
    PersonalityType::Edr,
    PersonalityType::Ede,
    PersonalityType::Elr,
    PersonalityType::Ele,
];

impl PersonalityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityType::Idr => "IDR",
            PersonalityType::Ide => "IDE",
            PersonalityType::Ilr => "ILR",
            PersonalityType::Ile => "ILE",
            PersonalityType::Edr => "EDR",
            PersonalityType::Ede => "EDE",
            PersonalityType::Elr => "ELR",
            PersonalityType::Ele => "ELE",
        }
    }
}

/// Classify three axis scores into a personality type.
pub fn classify(ie: i64, dl: i64, re: i64) -> PersonalityType {
    let mut index = 0;
    if ie > 50 {
        index += 4;
    }
    if dl > 50 {
        index += 2;
    }
    if re > 50 {
        index += 1;
    }
    ALL_TYPES[index]
}

/// One question on the sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub axis: String,
    pub text: String,
}

/// Description of one personality type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeInfo {
    pub code: String,
    pub name: String,
    pub summary: String,
}

/// The full test sheet served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSheet {
    pub version: i64,
    pub types: Vec<TypeInfo>,
    pub questions: Vec<Question>,
}

/// The bundled test sheet.
pub fn sheet() -> &'static TestSheet {
    static SHEET: OnceLock<TestSheet> = OnceLock::new();
    SHEET.get_or_init(|| {
        serde_json::from_str(SHEET_JSON).expect("Bundled personality sheet is invalid JSON")
    })
}

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Category used in place of a missing answer
pub const OTHER: &str = "other";

/// Categorical survey columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AgeGroup,
    Gender,
    Companion,
    VacationType,
    LocationType,
    Destination,
    Transportation,
    Duration,
    Cost,
    NextVacation,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::AgeGroup,
        Field::Gender,
        Field::Companion,
        Field::VacationType,
        Field::LocationType,
        Field::Destination,
        Field::Transportation,
        Field::Duration,
        Field::Cost,
        Field::NextVacation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::AgeGroup => "age_group",
            Field::Gender => "gender",
            Field::Companion => "companion",
            Field::VacationType => "vacation_type",
            Field::LocationType => "location_type",
            Field::Destination => "destination",
            Field::Transportation => "transportation",
            Field::Duration => "duration",
            Field::Cost => "cost",
            Field::NextVacation => "next_vacation",
        }
    }

    /// Column header used by the historical CSV exports
    pub fn export_header(self) -> &'static str {
        match self {
            Field::AgeGroup => "연령대",
            Field::Gender => "성별",
            Field::Companion => "함께한_사람",
            Field::VacationType => "가장_최근_여름_휴가",
            Field::LocationType => "휴가_장소_국내_해외",
            Field::Destination => "휴가_장소",
            Field::Transportation => "주요_교통수단",
            Field::Duration => "휴가_기간",
            Field::Cost => "총_비용",
            Field::NextVacation => "다음_휴가_경험",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s || field.export_header() == s)
            .ok_or_else(|| format!("unknown survey field '{}'", s))
    }
}

/// Ordinal satisfaction rating, 1 (very dissatisfied) to 5 (very satisfied)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SatisfactionRepr", into = "u8")]
pub enum Satisfaction {
    VeryDissatisfied = 1,
    Dissatisfied = 2,
    Neutral = 3,
    Satisfied = 4,
    VerySatisfied = 5,
}

impl Satisfaction {
    pub fn score(self) -> u8 {
        self as u8
    }

    /// Neutral or better
    pub fn is_satisfied(self) -> bool {
        self >= Satisfaction::Neutral
    }

    pub fn label(self) -> &'static str {
        match self {
            Satisfaction::VeryDissatisfied => "very dissatisfied",
            Satisfaction::Dissatisfied => "dissatisfied",
            Satisfaction::Neutral => "neutral",
            Satisfaction::Satisfied => "satisfied",
            Satisfaction::VerySatisfied => "very satisfied",
        }
    }
}

impl TryFrom<u8> for Satisfaction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Satisfaction::VeryDissatisfied),
            2 => Ok(Satisfaction::Dissatisfied),
            3 => Ok(Satisfaction::Neutral),
            4 => Ok(Satisfaction::Satisfied),
            5 => Ok(Satisfaction::VerySatisfied),
            other => Err(format!("satisfaction must be between 1 and 5, got {}", other)),
        }
    }
}

impl From<Satisfaction> for u8 {
    fn from(value: Satisfaction) -> Self {
        value.score()
    }
}

impl FromStr for Satisfaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if let Ok(score) = normalized.parse::<u8>() {
            return Satisfaction::try_from(score);
        }
        match normalized.as_str() {
            "very dissatisfied" | "매우 불만족" => Ok(Satisfaction::VeryDissatisfied),
            "dissatisfied" | "불만족" => Ok(Satisfaction::Dissatisfied),
            "neutral" | "보통" => Ok(Satisfaction::Neutral),
            "satisfied" | "만족" => Ok(Satisfaction::Satisfied),
            "very satisfied" | "매우 만족" => Ok(Satisfaction::VerySatisfied),
            _ => Err(format!("unknown satisfaction label '{}'", s.trim())),
        }
    }
}

impl Display for Satisfaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SatisfactionRepr {
    Score(u8),
    Label(String),
}

impl TryFrom<SatisfactionRepr> for Satisfaction {
    type Error = String;

    fn try_from(value: SatisfactionRepr) -> Result<Self, Self::Error> {
        match value {
            SatisfactionRepr::Score(score) => Satisfaction::try_from(score),
            SatisfactionRepr::Label(label) => label.parse(),
        }
    }
}

/// Categorical answers of one respondent; any field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacation_type: Option<String>,
    /// Domestic or international
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_vacation: Option<String>,
}

impl Profile {
    /// Explicit answer for a field. Blank answers count as missing.
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::AgeGroup => &self.age_group,
            Field::Gender => &self.gender,
            Field::Companion => &self.companion,
            Field::VacationType => &self.vacation_type,
            Field::LocationType => &self.location_type,
            Field::Destination => &self.destination,
            Field::Transportation => &self.transportation,
            Field::Duration => &self.duration,
            Field::Cost => &self.cost,
            Field::NextVacation => &self.next_vacation,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Answer for a field, with missing answers mapped to [`OTHER`]
    pub fn category(&self, field: Field) -> &str {
        self.get(field).unwrap_or(OTHER)
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::AgeGroup => &mut self.age_group,
            Field::Gender => &mut self.gender,
            Field::Companion => &mut self.companion,
            Field::VacationType => &mut self.vacation_type,
            Field::LocationType => &mut self.location_type,
            Field::Destination => &mut self.destination,
            Field::Transportation => &mut self.transportation,
            Field::Duration => &mut self.duration,
            Field::Cost => &mut self.cost,
            Field::NextVacation => &mut self.next_vacation,
        };
        *slot = Some(value.into());
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }
}

/// One historical respondent. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub satisfaction: Option<Satisfaction>,
}

impl SurveyResponse {
    pub fn new(profile: Profile, satisfaction: Option<Satisfaction>) -> Self {
        Self {
            profile,
            satisfaction,
        }
    }

    pub fn category(&self, field: Field) -> &str {
        self.profile.category(field)
    }

    /// Neutral or better. Unknown satisfaction never counts.
    pub fn is_satisfied(&self) -> bool {
        self.satisfaction.is_some_and(Satisfaction::is_satisfied)
    }

    /// Concrete destination, falling back to the domestic/international flag
    pub fn resolved_destination(&self) -> &str {
        match self.profile.get(Field::Destination) {
            Some(destination) if destination != OTHER => destination,
            _ => self.category(Field::LocationType),
        }
    }
}

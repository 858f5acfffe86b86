use serde::Deserialize;

use super::{Field, Profile, Satisfaction, SurveyResponse};
use crate::error::{AppError, AppResult};

/// A survey as submitted by a respondent, before it joins the corpus
///
/// Destination arrives split by domestic/overseas and satisfaction as a
/// raw 1-5 score; both are resolved by [`SurveySubmission::into_response`].
#[derive(Debug, Clone, Deserialize)]
pub struct SurveySubmission {
    pub age_group: String,
    pub gender: String,
    pub companion: String,
    pub vacation_type: String,
    pub location_type: String,
    #[serde(default)]
    pub domestic_location: Option<String>,
    #[serde(default)]
    pub overseas_location: Option<String>,
    pub transportation: String,
    pub duration: String,
    pub cost: String,
    pub satisfaction: u8,
    pub next_vacation: String,
}

/// Short form labels and the full labels the survey corpus is recorded with
const VACATION_LABELS: [(&str, &str); 6] = [
    ("해수욕, 물놀이", "해수욕, 물놀이 (바다/섬 여행)"),
    ("등산, 캠핑", "등산, 캠핑 등 아웃도어 활동 (산/계곡 여행)"),
    ("맛집 투어", "맛집 투어 (맛집 탐방, 지역 특산물 체험)"),
    ("도시 관광", "도시 관광 (쇼핑, 카페, 시내 구경)"),
    ("휴양·힐링", "휴양·힐링 (스파, 리조트, 펜션 휴식)"),
    ("문화생활", "문화생활 (박물관, 유적지, 공연 관람)"),
];

/// Full corpus label for a vacation type; unknown labels pass through
pub fn corpus_vacation_label(label: &str) -> &str {
    let label = label.trim();
    VACATION_LABELS
        .iter()
        .find(|(short, _)| *short == label)
        .map(|(_, full)| *full)
        .unwrap_or(label)
}

/// Whether a location type label denotes a domestic trip
pub fn is_domestic(location_type: &str) -> bool {
    let label = location_type.trim();
    label == "국내" || label.eq_ignore_ascii_case("domestic")
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SurveySubmission {
    /// Validates required answers and converts into a corpus row
    pub fn into_response(self) -> AppResult<SurveyResponse> {
        let satisfaction = Satisfaction::try_from(self.satisfaction).map_err(AppError::Validation)?;

        let required = [
            (Field::AgeGroup, &self.age_group),
            (Field::Gender, &self.gender),
            (Field::Companion, &self.companion),
            (Field::VacationType, &self.vacation_type),
            (Field::LocationType, &self.location_type),
            (Field::Transportation, &self.transportation),
            (Field::Duration, &self.duration),
            (Field::Cost, &self.cost),
            (Field::NextVacation, &self.next_vacation),
        ];

        let mut profile = Profile::default();
        for (field, value) in required {
            let value = value.trim();
            if value.is_empty() {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
            match field {
                Field::VacationType | Field::NextVacation => {
                    profile.set(field, corpus_vacation_label(value))
                }
                _ => profile.set(field, value),
            }
        }

        let destination = if is_domestic(&self.location_type) {
            non_blank(&self.domestic_location)
        } else {
            non_blank(&self.overseas_location)
        };
        profile.set(
            Field::Destination,
            destination.unwrap_or_else(|| self.location_type.trim()),
        );

        Ok(SurveyResponse::new(profile, Some(satisfaction)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> SurveySubmission {
        SurveySubmission {
            age_group: "20대".to_string(),
            gender: "여성".to_string(),
            companion: "가족".to_string(),
            vacation_type: "해수욕, 물놀이".to_string(),
            location_type: "해외".to_string(),
            domestic_location: Some("부산".to_string()),
            overseas_location: Some("일본".to_string()),
            transportation: "항공편".to_string(),
            duration: "4~6일".to_string(),
            cost: "30만~50만 원".to_string(),
            satisfaction: 5,
            next_vacation: "도시 관광".to_string(),
        }
    }

    #[test]
    fn test_overseas_destination_selected() {
        let response = submission().into_response().unwrap();
        assert_eq!(response.profile.get(Field::Destination), Some("일본"));
        assert_eq!(response.satisfaction, Some(Satisfaction::VerySatisfied));
    }

    #[test]
    fn test_domestic_destination_selected() {
        let mut raw = submission();
        raw.location_type = "국내".to_string();
        let response = raw.into_response().unwrap();
        assert_eq!(response.profile.get(Field::Destination), Some("부산"));
    }

    #[test]
    fn test_missing_destination_uses_location_type() {
        let mut raw = submission();
        raw.overseas_location = None;
        let response = raw.into_response().unwrap();
        assert_eq!(response.profile.get(Field::Destination), Some("해외"));
    }

    #[test]
    fn test_rejects_out_of_range_satisfaction() {
        let mut raw = submission();
        raw.satisfaction = 9;
        assert!(matches!(raw.into_response(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_blank_required_answer() {
        let mut raw = submission();
        raw.cost = "   ".to_string();
        let err = raw.into_response().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: cost is required");
    }

    #[test]
    fn test_vacation_labels_use_corpus_form() {
        let response = submission().into_response().unwrap();
        assert_eq!(
            response.profile.get(Field::VacationType),
            Some("해수욕, 물놀이 (바다/섬 여행)")
        );
        assert_eq!(
            response.profile.get(Field::NextVacation),
            Some("도시 관광 (쇼핑, 카페, 시내 구경)")
        );
    }

    #[test]
    fn test_corpus_vacation_label() {
        assert_eq!(
            corpus_vacation_label(" 문화생활 "),
            "문화생활 (박물관, 유적지, 공연 관람)"
        );
        assert_eq!(
            corpus_vacation_label("맛집 투어 (맛집 탐방, 지역 특산물 체험)"),
            "맛집 투어 (맛집 탐방, 지역 특산물 체험)"
        );
        assert_eq!(corpus_vacation_label("친척·지인 방문"), "친척·지인 방문");
        assert_eq!(corpus_vacation_label("beach"), "beach");
    }

    #[test]
    fn test_is_domestic() {
        assert!(is_domestic("국내"));
        assert!(is_domestic("Domestic"));
        assert!(!is_domestic("해외"));
    }
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ExpandError {
    pub code: String,
    pub message: String,
}

impl ExpandError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Bilingual,
    Regular,
}

impl ClassType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bilingual" => Some(ClassType::Bilingual),
            "regular" => Some(ClassType::Regular),
            _ => None,
        }
    }
}

/// One target class with its own time window. `class_type` is an explicit
/// override; when absent the type is derived from the class tag.
#[derive(Debug, Clone)]
pub struct ClassAssignment {
    pub class_tag: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub class_type: Option<ClassType>,
}

/// Compact multi-select input: the selected dates, the per-class rows in the
/// order the caller listed them, and one payload object applied verbatim to
/// every generated request.
#[derive(Debug, Clone, Default)]
pub struct BulkScheduleInput {
    pub dates: Vec<NaiveDate>,
    pub assignments: Vec<ClassAssignment>,
    pub payload: Map<String, JsonValue>,
}

/// One concrete creation request. The consumer performs one create call per
/// entry, in list order; the id, date, and class tag let it attribute a
/// failure to a specific (date, class) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub id: String,
    pub date: NaiveDate,
    pub class_tag: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub class_type: ClassType,
    #[serde(flatten)]
    pub payload: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandPreview {
    pub count: usize,
    pub dates: Vec<NaiveDate>,
    pub classes: Vec<String>,
}

pub fn class_type_for(assignment: &ClassAssignment) -> ClassType {
    if let Some(explicit) = assignment.class_type {
        return explicit;
    }
    if assignment.class_tag.to_ascii_lowercase().contains("bil") {
        ClassType::Bilingual
    } else {
        ClassType::Regular
    }
}

fn validate(input: &BulkScheduleInput) -> Result<(), ExpandError> {
    if input.dates.is_empty() {
        return Err(ExpandError::new(
            "bad_params",
            "dates must contain at least one date",
        ));
    }
    if input.assignments.is_empty() {
        return Err(ExpandError::new(
            "bad_params",
            "assignments must contain at least one class",
        ));
    }
    for (idx, assignment) in input.assignments.iter().enumerate() {
        if assignment.end_time <= assignment.start_time {
            return Err(ExpandError::new(
                "bad_params",
                format!(
                    "assignment {} ({}): end time must be after start time",
                    idx, assignment.class_tag
                ),
            ));
        }
    }
    Ok(())
}

fn sorted_unique_dates(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut out = dates.to_vec();
    out.sort();
    out.dedup();
    out
}

/// Validates, then shows what an expansion would generate without
/// materializing the payload copies.
pub fn preview(input: &BulkScheduleInput) -> Result<ExpandPreview, ExpandError> {
    validate(input)?;
    let dates = sorted_unique_dates(&input.dates);
    let classes: Vec<String> = input
        .assignments
        .iter()
        .map(|a| a.class_tag.clone())
        .collect();
    Ok(ExpandPreview {
        count: dates.len() * classes.len(),
        dates,
        classes,
    })
}

/// Expands the input into one request per (date, class) pair: dates
/// ascending, and within each date the assignments in caller order. Row
/// order is significant downstream (copy-time-from-previous-row affordances
/// key off it), so it is never resorted. The whole list is materialized
/// before anything is handed out; there is no partial-success mode.
pub fn expand(input: &BulkScheduleInput) -> Result<Vec<SessionRequest>, ExpandError> {
    validate(input)?;
    let dates = sorted_unique_dates(&input.dates);
    let mut requests = Vec::with_capacity(dates.len() * input.assignments.len());
    for date in &dates {
        for assignment in &input.assignments {
            requests.push(SessionRequest {
                id: Uuid::new_v4().to_string(),
                date: *date,
                class_tag: assignment.class_tag.clone(),
                starts_at: date.and_time(assignment.start_time),
                ends_at: date.and_time(assignment.end_time),
                class_type: class_type_for(assignment),
                payload: input.payload.clone(),
            });
        }
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").expect("test time")
    }

    fn assignment(class_tag: &str, start: &str, end: &str) -> ClassAssignment {
        ClassAssignment {
            class_tag: class_tag.to_string(),
            start_time: time(start),
            end_time: time(end),
            class_type: None,
        }
    }

    fn payload(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().expect("payload object").clone()
    }

    #[test]
    fn expands_exact_cartesian_product() {
        let input = BulkScheduleInput {
            dates: vec![date("2025-01-07"), date("2025-01-06")],
            assignments: vec![
                assignment("5A", "08:00", "09:00"),
                assignment("5B", "10:00", "11:00"),
            ],
            payload: payload(json!({ "topic": "X" })),
        };
        let requests = expand(&input).expect("expand");
        assert_eq!(requests.len(), 4);

        let pairs: Vec<(String, String, String)> = requests
            .iter()
            .map(|r| {
                (
                    r.date.format("%Y-%m-%d").to_string(),
                    r.class_tag.clone(),
                    r.starts_at.format("%H:%M").to_string(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("2025-01-06".into(), "5A".into(), "08:00".into()),
                ("2025-01-06".into(), "5B".into(), "10:00".into()),
                ("2025-01-07".into(), "5A".into(), "08:00".into()),
                ("2025-01-07".into(), "5B".into(), "10:00".into()),
            ]
        );

        for r in &requests {
            assert_eq!(r.payload.get("topic"), Some(&json!("X")));
        }

        let unique: HashSet<(NaiveDate, String)> = requests
            .iter()
            .map(|r| (r.date, r.class_tag.clone()))
            .collect();
        assert_eq!(unique.len(), 4);

        let ids: HashSet<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn duplicate_dates_collapse_before_expansion() {
        let input = BulkScheduleInput {
            dates: vec![date("2025-01-06"), date("2025-01-06")],
            assignments: vec![assignment("5A", "08:00", "09:00")],
            payload: Map::new(),
        };
        let requests = expand(&input).expect("expand");
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn rejects_empty_dates_and_assignments() {
        let input = BulkScheduleInput {
            dates: Vec::new(),
            assignments: vec![assignment("5A", "08:00", "09:00")],
            payload: Map::new(),
        };
        assert!(expand(&input).is_err());

        let input = BulkScheduleInput {
            dates: vec![date("2025-01-06")],
            assignments: Vec::new(),
            payload: Map::new(),
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn rejects_non_positive_time_windows() {
        let input = BulkScheduleInput {
            dates: vec![date("2025-01-06")],
            assignments: vec![
                assignment("5A", "08:00", "09:00"),
                assignment("5B", "10:00", "10:00"),
            ],
            payload: Map::new(),
        };
        let err = expand(&input).expect_err("zero-length window");
        assert_eq!(err.code, "bad_params");
        assert!(err.message.contains("assignment 1"), "{}", err.message);

        let input = BulkScheduleInput {
            dates: vec![date("2025-01-06")],
            assignments: vec![assignment("5A", "09:00", "08:00")],
            payload: Map::new(),
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn class_type_derived_from_tag_unless_overridden() {
        assert_eq!(
            class_type_for(&assignment("5A-BIL", "08:00", "09:00")),
            ClassType::Bilingual
        );
        assert_eq!(
            class_type_for(&assignment("5A", "08:00", "09:00")),
            ClassType::Regular
        );

        let mut forced = assignment("5A-BIL", "08:00", "09:00");
        forced.class_type = Some(ClassType::Regular);
        assert_eq!(class_type_for(&forced), ClassType::Regular);
    }

    #[test]
    fn preview_reports_counts_without_payload() {
        let input = BulkScheduleInput {
            dates: vec![date("2025-01-07"), date("2025-01-06"), date("2025-01-06")],
            assignments: vec![
                assignment("5A", "08:00", "09:00"),
                assignment("5B", "10:00", "11:00"),
            ],
            payload: payload(json!({ "topic": "X" })),
        };
        let p = preview(&input).expect("preview");
        assert_eq!(p.count, 4);
        assert_eq!(p.dates, vec![date("2025-01-06"), date("2025-01-07")]);
        assert_eq!(p.classes, vec!["5A".to_string(), "5B".to_string()]);
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use crate::calendar::{week_date_range, week_in_semester, AcademicYear, Semester};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Session,
    Test,
}

impl ItemKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "session" => Some(ItemKind::Session),
            "test" => Some(ItemKind::Test),
            _ => None,
        }
    }
}

/// One schedulable record: a class session or a test. Only the common fields
/// matter for classification and grouping; everything else the host sends
/// (durations, skill tags, CEFR levels, test types) rides along untouched in
/// `extra` and is echoed back on output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub kind: ItemKind,
    pub starts_at: NaiveDateTime,
    pub title: String,
    pub class_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_ref: Option<String>,
    pub materials: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ScheduleItem {
    pub fn has_materials(&self) -> bool {
        !self.materials.is_empty()
    }
}

/// Drill-down category. A filter predicate over items, not a stored
/// attribute: `materials` selects sessions carrying at least one attached
/// file, `lesson-plan` selects all sessions, `task` selects all tests.
///
/// Tests are excluded from `materials` even when they carry attachments;
/// the drill-down screens count on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Materials,
    LessonPlan,
    Task,
}

impl Category {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "materials" => Some(Category::Materials),
            "lesson-plan" => Some(Category::LessonPlan),
            "task" => Some(Category::Task),
            _ => None,
        }
    }

    pub fn matches(self, item: &ScheduleItem) -> bool {
        match self {
            Category::Materials => item.kind == ItemKind::Session && item.has_materials(),
            Category::LessonPlan => item.kind == ItemKind::Session,
            Category::Task => item.kind == ItemKind::Test,
        }
    }
}

/// Root scope of a navigation session: the selected teacher and/or class.
/// Empty scope admits everything.
#[derive(Debug, Clone, Default)]
pub struct ItemScope {
    pub teacher: Option<String>,
    pub class: Option<String>,
}

impl ItemScope {
    pub fn admits(&self, item: &ScheduleItem) -> bool {
        if let Some(teacher) = &self.teacher {
            let matched = item
                .teacher_ref
                .as_deref()
                .map(|t| t.eq_ignore_ascii_case(teacher))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        if let Some(class) = &self.class {
            if !item.class_tag.eq_ignore_ascii_case(class) {
                return false;
            }
        }
        true
    }
}

/// A progressively-narrowing navigation path. Each level is only meaningful
/// once its parent is chosen; handlers parse one per request, so there is
/// nothing to reset server-side when the root scope changes.
#[derive(Debug, Clone)]
pub struct NavCoordinate {
    pub academic_year: AcademicYear,
    pub semester: Option<Semester>,
    pub category: Option<Category>,
    pub week: Option<i64>,
}

/// Narrows a full collection to one academic year, optionally one semester,
/// and the root scope. Input order is preserved.
pub fn items_in_scope<'a>(
    items: &'a [ScheduleItem],
    year: AcademicYear,
    semester: Option<Semester>,
    scope: &ItemScope,
) -> Vec<&'a ScheduleItem> {
    items
        .iter()
        .filter(|item| {
            let date = item.starts_at.date();
            AcademicYear::containing(date) == year
                && semester
                    .map(|s| Semester::containing(date) == s)
                    .unwrap_or(true)
                && scope.admits(item)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SemesterCounts {
    pub first: usize,
    pub second: usize,
}

/// Partitions items (already narrowed to one academic year) between the two
/// semesters. Semester membership is total, so the two counts always sum to
/// the input length.
pub fn count_by_semester(items: &[&ScheduleItem]) -> SemesterCounts {
    let mut counts = SemesterCounts::default();
    for item in items {
        match Semester::containing(item.starts_at.date()) {
            Semester::First => counts.first += 1,
            Semester::Second => counts.second += 1,
        }
    }
    counts
}

pub fn filter_by_category<'a>(
    items: &[&'a ScheduleItem],
    category: Category,
) -> Vec<&'a ScheduleItem> {
    items
        .iter()
        .copied()
        .filter(|item| category.matches(item))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGroup {
    pub week: i64,
    pub count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Buckets items by week-in-semester and emits one group per occupied week,
/// ascending by week number regardless of input order. Items may arrive in
/// arbitrary order, so first-seen order is never trusted. Each group's date
/// range is computed once from the coordinate, independent of which items
/// landed in it.
pub fn group_by_week(
    items: &[&ScheduleItem],
    year: AcademicYear,
    semester: Semester,
) -> Vec<WeekGroup> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for item in items {
        let week = week_in_semester(item.starts_at.date(), year);
        *counts.entry(week).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(week, count)| {
            let (start_date, end_date) = week_date_range(year, semester, week);
            WeekGroup {
                week,
                count,
                start_date,
                end_date,
            }
        })
        .collect()
}

/// Items falling in the given week, ascending by start instant. The sort is
/// stable, so items sharing an instant keep their input order. Required so a
/// week renders chronologically no matter how the collection arrived.
pub fn items_in_week<'a>(
    items: &[&'a ScheduleItem],
    year: AcademicYear,
    week: i64,
) -> Vec<&'a ScheduleItem> {
    let mut selected: Vec<&ScheduleItem> = items
        .iter()
        .copied()
        .filter(|item| week_in_semester(item.starts_at.date(), year) == week)
        .collect();
    selected.sort_by_key(|item| item.starts_at);
    selected
}

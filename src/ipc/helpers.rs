use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value as JsonValue};

use crate::calendar::{AcademicYear, Semester};
use crate::expand::{BulkScheduleInput, ClassAssignment, ClassType};
use crate::schedule::{Category, ItemKind, ItemScope, NavCoordinate, ScheduleItem};

pub fn required_str(params: &JsonValue, key: &str) -> Result<String, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {}", key))
}

pub fn opt_str(params: &JsonValue, key: &str) -> Result<Option<String>, String> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| format!("{} must be string or null", key))?
                .trim()
                .to_string();
            if s.is_empty() {
                Ok(None)
            } else {
                Ok(Some(s))
            }
        }
    }
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Accepts the timestamp shapes the dashboard emits; a bare date means
/// midnight. Everything is a civil local instant, no offsets.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let t = raw.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(ts);
        }
    }
    parse_date(t).and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let t = raw.trim();
    NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .ok()
}

/// Optional root-scope filters shared by every `schedule.*` method.
pub fn scope_params(params: &JsonValue) -> Result<ItemScope, String> {
    Ok(ItemScope {
        teacher: opt_str(params, "teacher")?,
        class: opt_str(params, "class")?,
    })
}

/// Parses the navigation coordinate path. `academicYear` is always
/// required; the narrower levels are picked up when present and each
/// handler enforces how deep its own path must go.
pub fn coordinate_params(params: &JsonValue) -> Result<NavCoordinate, String> {
    let label = required_str(params, "academicYear")?;
    let academic_year =
        AcademicYear::parse(&label).ok_or("academicYear must look like 2024/2025")?;

    let semester = match params.get("semester") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => {
            let n = v.as_i64().ok_or("semester must be 1 or 2")?;
            Some(Semester::from_number(n).ok_or("semester must be 1 or 2")?)
        }
    };

    let category = match opt_str(params, "category")? {
        None => None,
        Some(raw) => Some(
            Category::parse(&raw)
                .ok_or("category must be one of: materials, lesson-plan, task")?,
        ),
    };

    let week = match params.get("week") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => {
            let n = v.as_i64().ok_or("week must be a positive integer")?;
            if n < 1 {
                return Err("week must be a positive integer".to_string());
            }
            Some(n)
        }
    };

    Ok(NavCoordinate {
        academic_year,
        semester,
        category,
        week,
    })
}

/// Strict boundary parse of one incoming item. The core only ever sees
/// well-formed items; anything malformed is reported here with its index
/// and the whole load is rejected.
pub fn parse_item(raw: &JsonValue, idx: usize) -> Result<ScheduleItem, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| format!("items[{}] must be an object", idx))?;

    let field = |key: &str| format!("items[{}].{}", idx, key);

    let id = required_str(raw, "id").map_err(|_| format!("{} is required", field("id")))?;
    let kind_raw = required_str(raw, "kind").map_err(|_| format!("{} is required", field("kind")))?;
    let kind = ItemKind::parse(&kind_raw)
        .ok_or_else(|| format!("{} must be session or test", field("kind")))?;
    let starts_raw =
        required_str(raw, "startsAt").map_err(|_| format!("{} is required", field("startsAt")))?;
    let starts_at = parse_timestamp(&starts_raw)
        .ok_or_else(|| format!("{} is not a valid timestamp", field("startsAt")))?;
    let title = required_str(raw, "title").map_err(|_| format!("{} is required", field("title")))?;
    let class_tag =
        required_str(raw, "classTag").map_err(|_| format!("{} is required", field("classTag")))?;
    let teacher_ref = opt_str(raw, "teacherRef").map_err(|m| format!("items[{}].{}", idx, m))?;

    let materials = match obj.get("materials") {
        None => Vec::new(),
        Some(v) if v.is_null() => Vec::new(),
        Some(v) => {
            let arr = v
                .as_array()
                .ok_or_else(|| format!("{} must be an array of file refs", field("materials")))?;
            let mut out = Vec::with_capacity(arr.len());
            for entry in arr {
                let s = entry
                    .as_str()
                    .ok_or_else(|| format!("{} must be an array of file refs", field("materials")))?
                    .trim()
                    .to_string();
                if !s.is_empty() {
                    out.push(s);
                }
            }
            out
        }
    };

    const COMMON_KEYS: [&str; 6] = ["id", "kind", "startsAt", "title", "classTag", "teacherRef"];
    let mut extra = Map::new();
    for (k, v) in obj {
        if COMMON_KEYS.contains(&k.as_str()) || k == "materials" {
            continue;
        }
        extra.insert(k.clone(), v.clone());
    }

    Ok(ScheduleItem {
        id,
        kind,
        starts_at,
        title,
        class_tag,
        teacher_ref,
        materials,
        extra,
    })
}

/// Parses the bulk-expansion params. Shape errors (wrong types, missing or
/// unparseable dates and times) are caught here; the emptiness and
/// time-window contract checks stay in the expander itself.
pub fn parse_bulk_input(params: &JsonValue) -> Result<BulkScheduleInput, String> {
    let dates_raw = params
        .get("dates")
        .and_then(|v| v.as_array())
        .ok_or("missing dates")?;
    let mut dates = Vec::with_capacity(dates_raw.len());
    for (idx, entry) in dates_raw.iter().enumerate() {
        let s = entry
            .as_str()
            .ok_or_else(|| format!("dates[{}] must be a string", idx))?;
        let date = parse_date(s).ok_or_else(|| format!("dates[{}] must be YYYY-MM-DD", idx))?;
        dates.push(date);
    }

    let assignments_raw = params
        .get("assignments")
        .and_then(|v| v.as_array())
        .ok_or("missing assignments")?;
    let mut assignments = Vec::with_capacity(assignments_raw.len());
    for (idx, entry) in assignments_raw.iter().enumerate() {
        if !entry.is_object() {
            return Err(format!("assignments[{}] must be an object", idx));
        }
        let class_tag = required_str(entry, "class")
            .map_err(|_| format!("assignments[{}].class is required", idx))?;
        let start_raw = required_str(entry, "start")
            .map_err(|_| format!("assignments[{}].start is required", idx))?;
        let start_time = parse_time(&start_raw)
            .ok_or_else(|| format!("assignments[{}].start must be HH:MM", idx))?;
        let end_raw = required_str(entry, "end")
            .map_err(|_| format!("assignments[{}].end is required", idx))?;
        let end_time =
            parse_time(&end_raw).ok_or_else(|| format!("assignments[{}].end must be HH:MM", idx))?;
        let class_type = match opt_str(entry, "type").map_err(|m| format!("assignments[{}].{}", idx, m))? {
            None => None,
            Some(raw) => Some(
                ClassType::parse(&raw)
                    .ok_or_else(|| format!("assignments[{}].type must be bilingual or regular", idx))?,
            ),
        };
        assignments.push(ClassAssignment {
            class_tag,
            start_time,
            end_time,
            class_type,
        });
    }

    let payload = match params.get("payload") {
        None => Map::new(),
        Some(v) if v.is_null() => Map::new(),
        Some(v) => v
            .as_object()
            .cloned()
            .ok_or("payload must be an object")?,
    };

    Ok(BulkScheduleInput {
        dates,
        assignments,
        payload,
    })
}

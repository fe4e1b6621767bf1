use crate::calendar::{week_date_range, week_in_semester, AcademicYear, Semester};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn iso_date(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn handle_locate(req: &Request) -> serde_json::Value {
    let raw = match helpers::required_str(&req.params, "timestamp") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let Some(instant) = helpers::parse_timestamp(&raw) else {
        return err(&req.id, "bad_params", "timestamp is not a valid timestamp", None);
    };

    let date = instant.date();
    let year = AcademicYear::containing(date);
    let semester = Semester::containing(date);
    let week = week_in_semester(date, year);
    let (week_start, week_end) = week_date_range(year, semester, week);

    ok(
        &req.id,
        json!({
            "academicYear": year.label(),
            "semester": semester.number(),
            "week": week,
            "weekStart": iso_date(week_start),
            "weekEnd": iso_date(week_end),
        }),
    )
}

fn handle_week_range(req: &Request) -> serde_json::Value {
    let coord = match helpers::coordinate_params(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    let Some(semester) = coord.semester else {
        return err(&req.id, "bad_params", "missing semester", None);
    };
    let Some(week) = coord.week else {
        return err(&req.id, "bad_params", "missing week", None);
    };

    let (start, end) = week_date_range(coord.academic_year, semester, week);
    ok(
        &req.id,
        json!({
            "start": iso_date(start),
            "end": iso_date(end),
        }),
    )
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.locate" => Some(handle_locate(req)),
        "calendar.weekRange" => Some(handle_week_range(req)),
        _ => None,
    }
}

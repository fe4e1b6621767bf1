use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::schedule::{
    count_by_semester, filter_by_category, group_by_week, items_in_scope, items_in_week, Category,
    ItemScope, NavCoordinate, ScheduleItem,
};
use serde_json::json;

fn loaded_items<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a [ScheduleItem], serde_json::Value> {
    state
        .items
        .as_deref()
        .ok_or_else(|| err(&req.id, "no_items", "load an item collection first", None))
}

fn nav_params(req: &Request) -> Result<(NavCoordinate, ItemScope), serde_json::Value> {
    let coord = helpers::coordinate_params(&req.params)
        .map_err(|m| err(&req.id, "bad_params", m, None))?;
    let scope = helpers::scope_params(&req.params)
        .map_err(|m| err(&req.id, "bad_params", m, None))?;
    Ok((coord, scope))
}

fn handle_semesters(state: &mut AppState, req: &Request) -> serde_json::Value {
    let items = match loaded_items(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (coord, scope) = match nav_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let selected = items_in_scope(items, coord.academic_year, None, &scope);
    let counts = count_by_semester(&selected);
    ok(
        &req.id,
        json!({
            "counts": {
                "1": counts.first,
                "2": counts.second,
            }
        }),
    )
}

fn handle_categories(state: &mut AppState, req: &Request) -> serde_json::Value {
    let items = match loaded_items(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (coord, scope) = match nav_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(semester) = coord.semester else {
        return err(&req.id, "bad_params", "missing semester", None);
    };

    let selected = items_in_scope(items, coord.academic_year, Some(semester), &scope);
    ok(
        &req.id,
        json!({
            "counts": {
                "materials": filter_by_category(&selected, Category::Materials).len(),
                "lessonPlan": filter_by_category(&selected, Category::LessonPlan).len(),
                "task": filter_by_category(&selected, Category::Task).len(),
            }
        }),
    )
}

fn handle_weeks(state: &mut AppState, req: &Request) -> serde_json::Value {
    let items = match loaded_items(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (coord, scope) = match nav_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(semester) = coord.semester else {
        return err(&req.id, "bad_params", "missing semester", None);
    };

    let mut selected = items_in_scope(items, coord.academic_year, Some(semester), &scope);
    if let Some(category) = coord.category {
        selected = filter_by_category(&selected, category);
    }

    let weeks: Vec<serde_json::Value> = group_by_week(&selected, coord.academic_year, semester)
        .iter()
        .map(|g| {
            json!({
                "week": g.week,
                "count": g.count,
                "startDate": g.start_date.format("%Y-%m-%d").to_string(),
                "endDate": g.end_date.format("%Y-%m-%d").to_string(),
            })
        })
        .collect();
    ok(&req.id, json!({ "weeks": weeks }))
}

fn handle_week_items(state: &mut AppState, req: &Request) -> serde_json::Value {
    let items = match loaded_items(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (coord, scope) = match nav_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(semester) = coord.semester else {
        return err(&req.id, "bad_params", "missing semester", None);
    };
    let Some(week) = coord.week else {
        return err(&req.id, "bad_params", "missing week", None);
    };

    let mut selected = items_in_scope(items, coord.academic_year, Some(semester), &scope);
    if let Some(category) = coord.category {
        selected = filter_by_category(&selected, category);
    }

    let rows: Vec<serde_json::Value> = items_in_week(&selected, coord.academic_year, week)
        .iter()
        .map(|item| serde_json::to_value(item).unwrap_or_else(|_| json!(null)))
        .collect();
    ok(&req.id, json!({ "items": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.semesters" => Some(handle_semesters(state, req)),
        "schedule.categories" => Some(handle_categories(state, req)),
        "schedule.weeks" => Some(handle_weeks(state, req)),
        "schedule.weekItems" => Some(handle_week_items(state, req)),
        _ => None,
    }
}

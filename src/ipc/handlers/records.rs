use crate::aggregate::{self, round_off_1_decimal, SortDir, STATUS_FIELD};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    filtered_records, optional_usize, parse_filters, parse_records, required_str, string_list,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const MAX_TOP: usize = 1000;

fn optional_field(req: &Request, key: &str, default: &str) -> String {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn parse_sort_dir(req: &Request, default: SortDir) -> Result<SortDir, serde_json::Value> {
    let Some(v) = req.params.get("sortDir") else {
        return Ok(default);
    };
    if v.is_null() {
        return Ok(default);
    }
    v.as_str().and_then(SortDir::parse).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "sortDir must be one of: asc, desc",
            Some(json!({ "sortDir": v })),
        )
    })
}

fn handle_filter(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match parse_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let filters = match parse_filters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rows = aggregate::filter_records(&records, &filters);
    ok(
        &req.id,
        json!({
            "records": rows,
            "totalRows": records.len(),
            "matchedRows": rows.len(),
            "appliedFilters": filters
        }),
    )
}

fn handle_status_counts(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let known = match string_list(req, "known") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return e,
    };
    let field = optional_field(req, "field", STATUS_FIELD);
    let observed = aggregate::compute_status_counts(&records, &field);
    let counts = aggregate::seed_status_counts(known.as_slice(), &observed);
    ok(
        &req.id,
        json!({ "field": field, "counts": counts, "total": records.len() }),
    )
}

fn handle_rate(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let statuses = match string_list(req, "statuses") {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "bad_params", "missing statuses", None),
        Err(e) => return e,
    };
    let field = optional_field(req, "field", STATUS_FIELD);
    let rate = aggregate::compute_rate_on(&records, &field, statuses.as_slice());
    ok(
        &req.id,
        json!({
            "rate": rate,
            "rateRounded": round_off_1_decimal(rate),
            "total": records.len()
        }),
    )
}

fn handle_top_n(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sort_by = match required_str(req, "sortBy") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let n = match optional_usize(req, "n", 0, MAX_TOP) {
        Ok(v) => v.unwrap_or(state.setup.default_top_count()),
        Err(e) => return e,
    };
    let dir = match parse_sort_dir(req, state.setup.default_sort_dir()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rows = aggregate::top_n(&records, &sort_by, n, dir);
    ok(
        &req.id,
        json!({
            "records": rows,
            "n": n,
            "sortBy": sort_by,
            "sortDir": dir.as_str()
        }),
    )
}

fn handle_sum(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let field = match required_str(req, "field") {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "field": field,
            "sum": aggregate::sum_field(&records, &field),
            "count": records.len()
        }),
    )
}

fn handle_attendance_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let summary = aggregate::summarize_attendance(&records, &state.setup.attendance());
    ok(
        &req.id,
        json!({
            "summary": summary,
            "attendanceRateRounded": round_off_1_decimal(summary.attendance_rate)
        }),
    )
}

fn handle_fees_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let summary = aggregate::summarize_fees(&records, &state.setup.fees());
    ok(
        &req.id,
        json!({
            "summary": summary,
            "collectionRateRounded": round_off_1_decimal(summary.collection_rate)
        }),
    )
}

fn handle_performance_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_records(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let field = optional_field(req, "field", "score");
    let top = match optional_usize(req, "top", 0, MAX_TOP) {
        Ok(v) => v.unwrap_or(state.setup.default_top_count()),
        Err(e) => return e,
    };
    let summary = aggregate::summarize_scores(&records, &field);
    ok(
        &req.id,
        json!({
            "field": field,
            "summary": summary,
            "averageRounded": round_off_1_decimal(summary.average),
            "topPerformers": aggregate::top_n(&records, &field, top, SortDir::Desc),
            "needsSupport": aggregate::top_n(&records, &field, top, SortDir::Asc)
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.filter" => Some(handle_filter(state, req)),
        "records.statusCounts" => Some(handle_status_counts(state, req)),
        "records.rate" => Some(handle_rate(state, req)),
        "records.topN" => Some(handle_top_n(state, req)),
        "records.sum" => Some(handle_sum(state, req)),
        "attendance.summary" => Some(handle_attendance_summary(state, req)),
        "fees.summary" => Some(handle_fees_summary(state, req)),
        "performance.summary" => Some(handle_performance_summary(state, req)),
        _ => None,
    }
}

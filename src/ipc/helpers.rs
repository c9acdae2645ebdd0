use crate::aggregate::{self, Record, RecordFilters};
use crate::identity::coerce_form_text;
use crate::ipc::error::err;
use crate::ipc::types::Request;
use serde_json::{json, Value};

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// `params[key]` as form text; a missing key reads as `""`.
pub fn param_text(params: &Value, key: &str) -> String {
    params.get(key).map(coerce_form_text).unwrap_or_default()
}

pub fn optional_usize(
    req: &Request,
    key: &str,
    min: usize,
    max: usize,
) -> Result<Option<usize>, Value> {
    let Some(v) = req.params.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let n = v.as_u64().map(|n| n as usize).filter(|n| (min..=max).contains(n));
    match n {
        Some(n) => Ok(Some(n)),
        None => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be an integer in {}..={}", key, min, max),
            Some(json!({ key: v })),
        )),
    }
}

pub fn string_list(req: &Request, key: &str) -> Result<Option<Vec<String>>, Value> {
    let Some(v) = req.params.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let Some(items) = v.as_array() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be an array of strings", key),
            None,
        ));
    };
    Ok(Some(
        items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
    ))
}

/// `params.records`, with non-object entries read as empty records.
pub fn parse_records(req: &Request) -> Result<Vec<Record>, Value> {
    let Some(items) = req.params.get("records").and_then(|v| v.as_array()) else {
        return Err(err(
            &req.id,
            "bad_params",
            "records must be an array",
            None,
        ));
    };
    Ok(items.iter().cloned().map(Record::from_value).collect())
}

pub fn parse_filters(req: &Request) -> Result<RecordFilters, Value> {
    aggregate::parse_record_filters(req.params.get("filters"))
        .map_err(|e| err(&req.id, &e.code, e.message, e.details))
}

/// Records narrowed by `params.filters`, the shape most aggregate methods
/// start from.
pub fn filtered_records(req: &Request) -> Result<Vec<Record>, Value> {
    let records = parse_records(req)?;
    let filters = parse_filters(req)?;
    if filters.is_wildcard() {
        return Ok(records);
    }
    Ok(aggregate::filter_records(&records, &filters))
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const STATUS_FIELD: &str = "status";
const SEARCH_FIELDS: [&str; 4] = ["name", "displayName", "id", "subjectId"];

/// One dashboard row (attendance mark, fee line, score...). Any field may be
/// missing; readers fall back to `""` or `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Non-object values become an empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn text(&self, field: &str) -> String {
        match self.0.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn number(&self, field: &str) -> f64 {
        match self.0.get(field) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => parse_finite(s).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn sort_key(&self, field: &str) -> SortKey {
        match self.0.get(field) {
            Some(Value::Number(n)) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => match parse_finite(s) {
                Some(v) => SortKey::Number(v),
                None => SortKey::Text(s.trim().to_lowercase()),
            },
            Some(Value::Bool(b)) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            _ => SortKey::Number(0.0),
        }
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Numbers rank ahead of text whatever the direction; `dir` only orders
/// keys of the same kind.
fn compare_keys(a: &SortKey, b: &SortKey, dir: SortDir) -> Ordering {
    let within = match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => return a.is_text().cmp(&b.is_text()),
    };
    match dir {
        SortDir::Asc => within,
        SortDir::Desc => within.reverse(),
    }
}

pub fn normalize_status(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Legacy 1-decimal display rounding: `Int(10*x + 0.5) / 10`.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AggregateError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilters {
    pub date: Option<String>,
    pub person_type: Option<String>,
    pub class_id: Option<String>,
    pub level_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl RecordFilters {
    pub fn is_wildcard(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(date) = self.date.as_deref() {
            if record.text("date").trim() != date {
                return false;
            }
        }
        if let Some(person_type) = self.person_type.as_deref() {
            if !record.text("personType").trim().eq_ignore_ascii_case(person_type) {
                return false;
            }
        }
        if let Some(class_id) = self.class_id.as_deref() {
            if record.text("classId").trim() != class_id {
                return false;
            }
        }
        if let Some(level_id) = self.level_id.as_deref() {
            if record.text("levelId").trim() != level_id {
                return false;
            }
        }
        if let Some(status) = self.status.as_deref() {
            if normalize_status(&record.text(STATUS_FIELD)) != status {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref() {
            let hit = SEARCH_FIELDS
                .iter()
                .any(|f| record.text(f).to_lowercase().contains(search));
            if !hit {
                return false;
            }
        }
        true
    }
}

fn parse_filter_value(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, AggregateError> {
    let raw = match obj.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(AggregateError::new(
                "bad_params",
                format!("filters.{} must be string or null", key),
            ))
        }
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        Ok(Some(raw))
    }
}

pub fn parse_record_filters(raw: Option<&Value>) -> Result<RecordFilters, AggregateError> {
    let Some(raw) = raw else {
        return Ok(RecordFilters::default());
    };
    if raw.is_null() {
        return Ok(RecordFilters::default());
    }
    let Some(obj) = raw.as_object() else {
        return Err(AggregateError::new("bad_params", "filters must be an object"));
    };

    let search = match parse_filter_value(obj, "search")? {
        Some(s) => Some(s),
        None => parse_filter_value(obj, "searchText")?,
    };

    Ok(RecordFilters {
        date: parse_filter_value(obj, "date")?,
        person_type: parse_filter_value(obj, "personType")?,
        class_id: parse_filter_value(obj, "classId")?,
        level_id: parse_filter_value(obj, "levelId")?,
        status: parse_filter_value(obj, "status")?.map(|s| normalize_status(&s)),
        search: search.map(|s| s.to_lowercase()),
    })
}

/// Matching records in their original order.
pub fn filter_records(records: &[Record], filters: &RecordFilters) -> Vec<Record> {
    records
        .iter()
        .filter(|r| filters.matches(r))
        .cloned()
        .collect()
}

/// Observed values of `field` only; records without it are skipped.
pub fn compute_status_counts(records: &[Record], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for r in records {
        let status = normalize_status(&r.text(field));
        if status.is_empty() {
            continue;
        }
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}

/// Zero entries for every declared category, then the observed counts.
pub fn seed_status_counts<S: AsRef<str>>(
    known: &[S],
    observed: &BTreeMap<String, usize>,
) -> BTreeMap<String, usize> {
    let mut out: BTreeMap<String, usize> = known
        .iter()
        .map(|k| normalize_status(k.as_ref()))
        .filter(|k| !k.is_empty())
        .map(|k| (k, 0))
        .collect();
    for (k, v) in observed {
        *out.entry(k.clone()).or_insert(0) += v;
    }
    out
}

pub fn compute_rate<S: AsRef<str>>(records: &[Record], numerator_statuses: &[S]) -> f64 {
    compute_rate_on(records, STATUS_FIELD, numerator_statuses)
}

/// Share of records whose `field` is one of `numerator_statuses`, in
/// `0..=100` at full precision. An empty collection yields `0.0`.
pub fn compute_rate_on<S: AsRef<str>>(
    records: &[Record],
    field: &str,
    numerator_statuses: &[S],
) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let wanted: Vec<String> = numerator_statuses
        .iter()
        .map(|s| normalize_status(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    let hits = records
        .iter()
        .filter(|r| wanted.contains(&normalize_status(&r.text(field))))
        .count();
    100.0 * (hits as f64) / (records.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// First `n` records ordered by `sort_key`. Ties keep input order in both
/// directions. Non-numeric text ranks after every number in both directions;
/// missing values sort as `0`.
pub fn top_n(records: &[Record], sort_key: &str, n: usize, dir: SortDir) -> Vec<Record> {
    let mut ranked: Vec<(SortKey, &Record)> =
        records.iter().map(|r| (r.sort_key(sort_key), r)).collect();
    ranked.sort_by(|(a, _), (b, _)| compare_keys(a, b, dir));
    ranked.into_iter().take(n).map(|(_, r)| r.clone()).collect()
}

pub fn sum_field(records: &[Record], field: &str) -> f64 {
    records.iter().map(|r| r.number(field)).sum()
}

pub fn average_field(records: &[Record], field: &str) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    sum_field(records, field) / (records.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSettings {
    pub known_statuses: Vec<String>,
    pub present_statuses: Vec<String>,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            known_statuses: ["present", "absent", "late", "excused"]
                .map(String::from)
                .to_vec(),
            present_statuses: ["present", "late", "excused"].map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total: usize,
    pub attended: usize,
    pub counts: BTreeMap<String, usize>,
    pub attendance_rate: f64,
}

pub fn summarize_attendance(records: &[Record], settings: &AttendanceSettings) -> AttendanceSummary {
    let observed = compute_status_counts(records, STATUS_FIELD);
    let counts = seed_status_counts(settings.known_statuses.as_slice(), &observed);
    let attended = settings
        .present_statuses
        .iter()
        .map(|s| observed.get(&normalize_status(s)).copied().unwrap_or(0))
        .sum();
    AttendanceSummary {
        total: records.len(),
        attended,
        counts,
        attendance_rate: compute_rate(records, settings.present_statuses.as_slice()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSettings {
    pub known_statuses: Vec<String>,
    pub amount_field: String,
    pub paid_field: String,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            known_statuses: ["paid", "pending", "overdue"].map(String::from).to_vec(),
            amount_field: "amount".to_string(),
            paid_field: "paid".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSummary {
    pub record_count: usize,
    pub total_billed: f64,
    pub total_paid: f64,
    pub outstanding: f64,
    pub collection_rate: f64,
    pub counts: BTreeMap<String, usize>,
}

/// A line without an explicit paid amount counts as fully paid when its
/// status is `paid`, otherwise as unpaid.
fn paid_amount(record: &Record, settings: &FeeSettings) -> f64 {
    if record.get(&settings.paid_field).is_some() {
        return record.number(&settings.paid_field);
    }
    if normalize_status(&record.text(STATUS_FIELD)) == "paid" {
        record.number(&settings.amount_field)
    } else {
        0.0
    }
}

pub fn summarize_fees(records: &[Record], settings: &FeeSettings) -> FeeSummary {
    let total_billed = sum_field(records, &settings.amount_field);
    let total_paid: f64 = records.iter().map(|r| paid_amount(r, settings)).sum();
    let collection_rate = if total_billed > 0.0 {
        100.0 * total_paid / total_billed
    } else {
        0.0
    };
    FeeSummary {
        record_count: records.len(),
        total_billed,
        total_paid,
        outstanding: (total_billed - total_paid).max(0.0),
        collection_rate,
        counts: seed_status_counts(
            settings.known_statuses.as_slice(),
            &compute_status_counts(records, STATUS_FIELD),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub count: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
}

pub fn summarize_scores(records: &[Record], field: &str) -> ScoreSummary {
    let values: Vec<f64> = records.iter().map(|r| r.number(field)).collect();
    if values.is_empty() {
        return ScoreSummary {
            count: 0,
            average: 0.0,
            highest: 0.0,
            lowest: 0.0,
        };
    }
    ScoreSummary {
        count: values.len(),
        average: average_field(records, field),
        highest: values.iter().copied().fold(f64::MIN, f64::max),
        lowest: values.iter().copied().fold(f64::MAX, f64::min),
    }
}

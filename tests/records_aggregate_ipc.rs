use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schooldeskd");
    let mut child = Command::new(exe)
        .env_remove("SCHOOLDESKD_SETUP")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schooldeskd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value.pointer("/error/code").and_then(|v| v.as_str())
}

fn register() -> serde_json::Value {
    json!([
        { "id": "a1", "subjectId": "s1", "name": "Amara Obi", "personType": "student", "classId": "7A", "levelId": "7", "date": "2025-03-03", "status": "present" },
        { "id": "a2", "subjectId": "s2", "name": "Ben Cho", "personType": "student", "classId": "7A", "levelId": "7", "date": "2025-03-03", "status": "present" },
        { "id": "a3", "subjectId": "s3", "name": "Chen Li", "personType": "student", "classId": "7B", "levelId": "7", "date": "2025-03-03", "status": "late" },
        { "id": "a4", "subjectId": "t1", "name": "Dana Ruiz", "personType": "teacher", "classId": "7B", "levelId": "7", "date": "2025-03-03", "status": "absent" },
        { "id": "a5", "subjectId": "s1", "name": "Amara Obi", "personType": "student", "classId": "7A", "levelId": "7", "date": "2025-03-04", "status": "excused" }
    ])
}

fn ids(rows: &serde_json::Value) -> Vec<String> {
    rows.as_array()
        .map(|rs| {
            rs.iter()
                .filter_map(|r| r.get("id").and_then(|v| v.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn attendance_day_counts_and_rate() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let day = json!({ "date": "2025-03-03" });

    let counts = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.statusCounts",
        json!({ "records": register(), "filters": day, "known": ["present", "absent", "late", "excused"] }),
    );
    assert_eq!(counts.pointer("/counts/present").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(counts.pointer("/counts/late").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(counts.pointer("/counts/absent").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(counts.pointer("/counts/excused").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(counts.get("total").and_then(|v| v.as_u64()), Some(4));

    let observed_only = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.statusCounts",
        json!({ "records": register(), "filters": day }),
    );
    assert!(observed_only.pointer("/counts/excused").is_none());

    let rate = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "records.rate",
        json!({ "records": register(), "filters": day, "statuses": ["present", "late", "excused"] }),
    );
    assert_eq!(rate.get("rate").and_then(|v| v.as_f64()), Some(75.0));

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "records.rate",
        json!({ "records": [], "statuses": ["present"] }),
    );
    assert_eq!(empty.get("rate").and_then(|v| v.as_f64()), Some(0.0));

    let blank_status = request_ok(
        &mut stdin,
        &mut reader,
        "4b",
        "records.rate",
        json!({
            "records": [{ "status": "present" }, {}, {}, { "status": "absent" }],
            "statuses": ["present", ""]
        }),
    );
    assert_eq!(blank_status.get("rate").and_then(|v| v.as_f64()), Some(25.0));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.summary",
        json!({ "records": register(), "filters": { "classId": "7A" } }),
    );
    assert_eq!(summary.pointer("/summary/total").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(summary.pointer("/summary/attended").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(
        summary.pointer("/summary/attendanceRate").and_then(|v| v.as_f64()),
        Some(100.0)
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn filters_combine_and_wildcards_pass_through() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.filter",
        json!({ "records": register(), "filters": { "date": "all", "personType": "all", "classId": "all" } }),
    );
    assert_eq!(all.get("records"), Some(&register()));

    let narrowed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.filter",
        json!({ "records": register(), "filters": { "personType": "student", "search": "obi" } }),
    );
    assert_eq!(ids(narrowed.get("records").expect("records")), vec!["a1", "a5"]);
    assert_eq!(narrowed.get("totalRows").and_then(|v| v.as_u64()), Some(5));
    assert_eq!(narrowed.get("matchedRows").and_then(|v| v.as_u64()), Some(2));

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "records.filter",
        json!({ "records": narrowed.get("records"), "filters": { "personType": "student", "search": "obi" } }),
    );
    assert_eq!(again.get("records"), narrowed.get("records"));

    let by_subject = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "records.filter",
        json!({ "records": register(), "filters": { "searchText": "T1", "levelId": 7 } }),
    );
    assert_eq!(ids(by_subject.get("records").expect("records")), vec!["a4"]);

    let bad = request(
        &mut stdin,
        &mut reader,
        "5",
        "records.filter",
        json!({ "records": register(), "filters": "7A" }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));

    let missing = request(&mut stdin, &mut reader, "6", "records.filter", json!({}));
    assert_eq!(error_code(&missing), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn fees_sums_and_overdue_ranking() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let fees = json!([
        { "id": "f1", "name": "Amara Obi", "amount": 500, "status": "paid", "dueDate": "2025-01-10" },
        { "id": "f2", "name": "Ben Cho", "amount": 300, "paid": 100, "status": "pending", "dueDate": "2025-02-01" },
        { "id": "f3", "name": "Chen Li", "amount": 200, "status": "overdue", "dueDate": "2024-12-15" },
        { "id": "f4", "name": "Dana Ruiz", "amount": "250", "status": "overdue", "dueDate": "2024-11-30" }
    ]);

    let sum = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.sum",
        json!({ "records": fees, "field": "amount" }),
    );
    assert_eq!(sum.get("sum").and_then(|v| v.as_f64()), Some(1250.0));

    let empty_sum = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.sum",
        json!({ "records": [], "field": "amount" }),
    );
    assert_eq!(empty_sum.get("sum").and_then(|v| v.as_f64()), Some(0.0));

    let overdue = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "records.topN",
        json!({ "records": fees, "sortBy": "dueDate", "sortDir": "asc", "n": 2, "filters": { "status": "OVERDUE" } }),
    );
    assert_eq!(ids(overdue.get("records").expect("records")), vec!["f4", "f3"]);
    assert_eq!(overdue.get("sortDir").and_then(|v| v.as_str()), Some("asc"));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "fees.summary",
        json!({ "records": fees }),
    );
    assert_eq!(summary.pointer("/summary/totalBilled").and_then(|v| v.as_f64()), Some(1250.0));
    assert_eq!(summary.pointer("/summary/totalPaid").and_then(|v| v.as_f64()), Some(600.0));
    assert_eq!(summary.pointer("/summary/outstanding").and_then(|v| v.as_f64()), Some(650.0));
    assert_eq!(summary.pointer("/summary/counts/overdue").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(summary.get("collectionRateRounded").and_then(|v| v.as_f64()), Some(48.0));

    let bad_dir = request(
        &mut stdin,
        &mut reader,
        "5",
        "records.topN",
        json!({ "records": fees, "sortBy": "amount", "sortDir": "sideways" }),
    );
    assert_eq!(error_code(&bad_dir), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn performance_summary_ranks_with_stable_ties() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let scores = json!([
        { "id": "p1", "score": 88 },
        { "id": "p2", "score": 95 },
        { "id": "p3", "score": 71 },
        { "id": "p4", "score": 95 },
        { "id": "p5", "score": 60 },
        { "id": "p6" }
    ]);

    let perf = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "performance.summary",
        json!({ "records": scores, "top": 3 }),
    );
    assert_eq!(ids(perf.get("topPerformers").expect("top")), vec!["p2", "p4", "p1"]);
    assert_eq!(ids(perf.get("needsSupport").expect("bottom")), vec!["p6", "p5", "p3"]);
    assert_eq!(perf.pointer("/summary/count").and_then(|v| v.as_u64()), Some(6));
    assert_eq!(perf.pointer("/summary/highest").and_then(|v| v.as_f64()), Some(95.0));
    assert_eq!(perf.get("averageRounded").and_then(|v| v.as_f64()), Some(68.2));

    let top_default = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.topN",
        json!({ "records": scores, "sortBy": "score" }),
    );
    assert_eq!(top_default.get("n").and_then(|v| v.as_u64()), Some(5));
    assert_eq!(
        ids(top_default.get("records").expect("records")),
        vec!["p2", "p4", "p1", "p3", "p5"]
    );

    let with_absence = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "performance.summary",
        json!({
            "records": [
                { "id": "q1", "score": 95 },
                { "id": "q2", "score": "absent" },
                { "id": "q3", "score": 70 }
            ],
            "top": 1
        }),
    );
    assert_eq!(ids(with_absence.get("topPerformers").expect("top")), vec!["q1"]);
    assert_eq!(ids(with_absence.get("needsSupport").expect("bottom")), vec!["q3"]);

    drop(stdin);
    let _ = child.wait();
}

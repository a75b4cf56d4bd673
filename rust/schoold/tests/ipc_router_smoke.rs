use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
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
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request(&mut stdin, &mut reader, "2", "session.set", json!({ "teacher": true }));
    let _ = request(&mut stdin, &mut reader, "3", "session.get", json!({}));
    let _ = request(&mut stdin, &mut reader, "4", "setup.get", json!({ "section": "calendar" }));
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "setup.update",
        json!({ "section": "routine", "patch": { "periods": 8 } }),
    );
    let sel = request(
        &mut stdin,
        &mut reader,
        "6",
        "selection.begin",
        json!({ "scope": "calendar", "key": "2024-02" }),
    );
    let generation = sel["result"]["generation"].as_u64().expect("generation");
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "selection.current",
        json!({ "scope": "calendar" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "calendar.monthMatrix",
        json!({ "year": 2024, "month": 1 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "calendar.indexByMonth",
        json!({ "monthKey": "2024-02", "notices": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "calendar.noticesForDate",
        json!({ "date": "2024-02-10", "notices": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "calendar.load",
        json!({ "generation": generation, "year": 2024, "month": 1, "notices": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "calendar.dayNotices",
        json!({ "date": "2024-02-10" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "routine.densify",
        json!({ "entries": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "routine.flatten",
        json!({ "grid": {} }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "15",
        "routine.load",
        json!({ "generation": 1, "teacherId": "t-1", "entries": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "16",
        "routine.setCell",
        json!({ "day": "Sunday", "period": 1, "subject": "Math", "class": "5" }),
    );
    let _ = request(&mut stdin, &mut reader, "17", "routine.submit", json!({}));

    let unknown = {
        writeln!(stdin, "{}", json!({ "id": "18", "method": "fees.list", "params": {} }))
            .expect("write");
        stdin.flush().expect("flush");
        let mut line = String::new();
        reader.read_line(&mut line).expect("read");
        serde_json::from_str::<serde_json::Value>(line.trim()).expect("json")
    };
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    writeln!(stdin, "this is not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let bad: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(bad["ok"], json!(false));
    assert_eq!(bad["error"]["code"], json!("bad_json"));

    drop(stdin);
    let _ = child.wait();
}

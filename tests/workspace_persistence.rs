mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn gradebook_survives_a_sidecar_restart() {
    let workspace = temp_dir("gradebook-persist");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        request_ok(&mut stdin, &mut reader, "2", "students.create", json!({ "name": "Ada" }));
        request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "subjects.create",
            json!({ "name": "Chemistry", "total": 40 }),
        );
        request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "marks.set",
            json!({ "studentIndex": 0, "sequence": "sixthSequence", "subject": "Chemistry", "value": "31" }),
        );
        request_ok(
            &mut stdin,
            &mut reader,
            "5",
            "comments.set",
            json!({ "studentIndex": 0, "slot": "annual", "text": "Promoted" }),
        );
        drop(stdin);
        let _ = child.wait();
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["studentCount"], json!(1));
    assert_eq!(selected["subjectCount"], json!(1));

    let subjects = request_ok(&mut stdin, &mut reader, "2", "subjects.list", json!({}));
    assert_eq!(subjects["subjects"][0], json!({ "name": "Chemistry", "total": 40.0 }));
    let marks = request_ok(&mut stdin, &mut reader, "3", "marks.get", json!({}));
    assert_eq!(marks["marks"][0]["sixthSequence"]["Chemistry"], json!(31.0));
    let comments = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "comments.get",
        json!({ "studentIndex": 0 }),
    );
    assert_eq!(comments["comments"]["annual"], json!("Promoted"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn legacy_flat_marks_load_as_first_sequence() {
    let workspace = temp_dir("gradebook-legacy-marks");
    {
        let conn = gradebookd::db::open_db(&workspace).expect("open db");
        for (key, value) in [
            ("students", r#"["Ada","Ben"]"#),
            ("subjects", r#"[{"name":"Math","total":20}]"#),
            ("marks", r#"[{"Math":"15"},{"Math":""}]"#),
        ] {
            conn.execute(
                "INSERT INTO kv(key, value) VALUES(?, ?)",
                (key, value),
            )
            .expect("seed kv");
        }
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let marks = request_ok(&mut stdin, &mut reader, "2", "marks.get", json!({}));
    assert_eq!(marks["marks"][0]["firstSequence"]["Math"], json!(15.0));
    assert_eq!(marks["marks"][1]["firstSequence"]["Math"], json!(""));
    assert_eq!(marks["marks"][0]["secondSequence"], json!({}));

    let seq = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "results.computeSequence",
        json!({ "sequence": "firstSequence" }),
    );
    assert_eq!(seq["results"]["results"][0]["student"], json!("Ada"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn reset_requires_confirmation_and_clears_the_workspace() {
    let workspace = temp_dir("gradebook-reset");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(&mut stdin, &mut reader, "2", "students.create", json!({ "name": "Ada" }));

    let refused = request(&mut stdin, &mut reader, "3", "data.reset", json!({}));
    assert_eq!(error_code(&refused), Some("confirm_required"));
    let health = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(health["studentCount"], json!(1));

    request_ok(&mut stdin, &mut reader, "5", "data.reset", json!({ "confirm": true }));
    let reselected = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(reselected["studentCount"], json!(0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

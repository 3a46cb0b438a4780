mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar};

fn seed_class(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
) {
    for (i, name) in ["Ada", "Ben"].iter().enumerate() {
        request_ok(stdin, reader, &format!("s{i}"), "students.create", json!({ "name": name }));
    }
    request_ok(stdin, reader, "sub1", "subjects.create", json!({ "name": "Math", "total": 20 }));
    request_ok(stdin, reader, "sub2", "subjects.create", json!({ "name": "French", "total": 40 }));
}

#[test]
fn single_mark_entry_validates_against_subject_total() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed_class(&mut stdin, &mut reader);

    let cases = [
        (json!("14"), true),
        (json!(20), true),
        (json!("21"), false),
        (json!("-1"), false),
        (json!("abc"), false),
        (json!(true), false),
        (json!(""), true),
    ];
    for (i, (value, applied)) in cases.iter().enumerate() {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("m{i}"),
            "marks.set",
            json!({ "studentIndex": 0, "sequence": "firstSequence", "subject": "Math", "value": value }),
        );
        assert_eq!(res["applied"], json!(*applied), "value {}", value);
    }

    let unknown_subject = request_ok(
        &mut stdin,
        &mut reader,
        "u1",
        "marks.set",
        json!({ "studentIndex": 0, "sequence": "firstSequence", "subject": "Art", "value": "5" }),
    );
    assert_eq!(unknown_subject["applied"], json!(false));

    let bad_seq = request(
        &mut stdin,
        &mut reader,
        "u2",
        "marks.set",
        json!({ "studentIndex": 0, "sequence": "seventhSequence", "subject": "Math", "value": "5" }),
    );
    assert_eq!(error_code(&bad_seq), Some("bad_params"));

    // The last accepted entry was the empty-string clear.
    let rows = request_ok(
        &mut stdin,
        &mut reader,
        "g1",
        "marks.get",
        json!({ "sequence": "firstSequence" }),
    );
    assert_eq!(rows["rows"][0]["marks"]["Math"], json!(""));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bulk_entry_matches_single_entry_and_counts_rejections() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed_class(&mut stdin, &mut reader);

    let bulk = request_ok(
        &mut stdin,
        &mut reader,
        "b1",
        "marks.bulkSet",
        json!({
            "sequence": "thirdSequence",
            "edits": [
                { "studentIndex": 0, "subject": "Math", "value": "12" },
                { "studentIndex": 1, "subject": "French", "value": 33.5 },
                { "studentIndex": 1, "subject": "Math", "value": "25" },
                { "studentIndex": 7, "subject": "Math", "value": "5" },
                { "subject": "Math", "value": "5" },
                { "studentIndex": 0, "subject": "French", "value": [12] }
            ]
        }),
    );
    assert_eq!(bulk["updated"], json!(2));
    assert_eq!(bulk["rejected"], json!(4));

    let marks = request_ok(&mut stdin, &mut reader, "g1", "marks.get", json!({}));
    assert_eq!(marks["marks"][0]["thirdSequence"]["Math"], json!(12.0));
    assert_eq!(marks["marks"][1]["thirdSequence"]["French"], json!(33.5));
    assert!(marks["marks"][1]["thirdSequence"].get("Math").is_none());
    assert!(marks["marks"][0]["thirdSequence"].get("French").is_none());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bulk_entry_over_the_limit_is_rejected_whole() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed_class(&mut stdin, &mut reader);

    let edits: Vec<serde_json::Value> = (0..5001)
        .map(|_| json!({ "studentIndex": 0, "subject": "Math", "value": "1" }))
        .collect();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "b1",
        "marks.bulkSet",
        json!({ "sequence": "firstSequence", "edits": edits }),
    );
    assert_eq!(res["limitExceeded"], json!(true));
    assert_eq!(res["updated"], json!(0));
    assert_eq!(res["rejected"], json!(5001));

    let marks = request_ok(&mut stdin, &mut reader, "g1", "marks.get", json!({}));
    assert!(marks["marks"][0]["firstSequence"].get("Math").is_none());

    drop(stdin);
    let _ = child.wait();
}

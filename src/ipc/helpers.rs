use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::SequenceId;
use crate::store::Collection;
use serde_json::json;
use tracing::warn;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// Non-negative integer parameter. Negative or missing values are rejected
/// here so handlers only deal in `usize`.
pub fn required_index(req: &Request, key: &str) -> Result<usize, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_i64()) {
        Some(v) if v >= 0 => Ok(v as usize),
        _ => Err(err(
            &req.id,
            "bad_params",
            format!("missing/invalid {}", key),
            None,
        )),
    }
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn parse_sequence(req: &Request, raw: &str) -> Result<SequenceId, serde_json::Value> {
    SequenceId::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "sequence must be one of: firstSequence, secondSequence, thirdSequence, fourthSequence, fifthSequence, sixthSequence",
            Some(json!({ "sequence": raw })),
        )
    })
}

pub fn required_sequence(req: &Request) -> Result<SequenceId, serde_json::Value> {
    let raw = required_str(req, "sequence")?;
    parse_sequence(req, &raw)
}

/// Mark entries arrive as strings, numbers or null; all of them are reduced to
/// the text form mark validation works on. Other JSON types are not marks.
pub fn mark_input_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        None | Some(serde_json::Value::Null) => Some(String::new()),
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(_) => None,
    }
}

/// Persists after a mutation. On failure the mutation stays applied in memory
/// and the caller gets a `store_failed` response.
pub fn persist(
    state: &mut AppState,
    req: &Request,
    collections: &[Collection],
) -> Result<(), serde_json::Value> {
    state.persist(collections).map_err(|e| {
        warn!(method = %req.method, error = %format!("{e:#}"), "store write failed");
        err(&req.id, "store_failed", format!("{e:#}"), None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ipc::router::handle_request;
    use crate::store::KeyValueStore;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk I/O error"))
        }

        fn remove(&mut self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk I/O error"))
        }

        fn clear(&mut self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk I/O error"))
        }
    }

    fn request(id: &str, method: &str, params: serde_json::Value) -> Request {
        Request {
            id: id.to_string(),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn store_failure_keeps_the_mutation_in_memory() {
        let mut state = AppState::new(Config::default());
        state.store = Box::new(FailingStore);

        let resp = handle_request(&mut state, request("1", "students.create", json!({ "name": "Ada" })));
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("store_failed"));
        assert!(resp["error"]["message"]
            .as_str()
            .unwrap_or("")
            .contains("disk I/O error"));
        assert_eq!(state.gradebook.students(), &["Ada".to_string()]);

        handle_request(&mut state, request("2", "subjects.create", json!({ "name": "Math", "total": 20 })));
        let resp = handle_request(
            &mut state,
            request(
                "3",
                "marks.set",
                json!({ "studentIndex": 0, "sequence": "firstSequence", "subject": "Math", "value": "9" }),
            ),
        );
        assert_eq!(resp["error"]["code"], json!("store_failed"));
        assert_eq!(
            state.gradebook.marks()[0].mark(SequenceId::FirstSequence, "Math"),
            crate::model::MarkValue::Score(9.0)
        );

        let list = handle_request(&mut state, request("4", "students.list", json!({})));
        assert_eq!(list["result"]["students"], json!([{ "index": 0, "name": "Ada" }]));
    }

    #[test]
    fn mark_input_text_accepts_only_mark_shaped_values() {
        assert_eq!(mark_input_text(None), Some(String::new()));
        assert_eq!(mark_input_text(Some(&json!(null))), Some(String::new()));
        assert_eq!(mark_input_text(Some(&json!("12.5"))), Some("12.5".to_string()));
        assert_eq!(mark_input_text(Some(&json!(7))), Some("7".to_string()));
        assert_eq!(mark_input_text(Some(&json!(true))), None);
        assert_eq!(mark_input_text(Some(&json!({ "v": 1 }))), None);
    }
}

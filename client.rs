// Client side: build a request, send it, read the single response

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::net::TcpStream;

use crate::errors::{IoContext, JsonDbError, Result};
use crate::outcome::Response;
use crate::path_key::PathKey;
use crate::protocol::{read_frame, write_frame};

/// Build a request body from command-line style arguments.
///
/// Only the fields the operation needs are included. The value is sent
/// as a JSON string.
pub fn build_request(kind: &str, key: Option<&str>, value: Option<&str>) -> Result<Value> {
    let mut body = Map::new();
    body.insert("type".to_string(), Value::String(kind.to_string()));

    let require_key = || {
        key.map(|k| parse_key_arg(k).to_json())
            .ok_or_else(|| JsonDbError::invalid_request(format!("{} requires a key", kind)))
    };

    match kind {
        "get" | "delete" => {
            body.insert("key".to_string(), require_key()?);
        }
        "set" => {
            body.insert("key".to_string(), require_key()?);
            let value = value.ok_or_else(|| JsonDbError::invalid_request("set requires a value"))?;
            body.insert("value".to_string(), Value::String(value.to_string()));
        }
        "exit" => {}
        other => {
            return Err(JsonDbError::invalid_request(format!(
                "unknown request type '{}'",
                other
            )))
        }
    }

    Ok(Value::Object(body))
}

/// A key argument that is a JSON array of strings becomes a path,
/// anything else is a plain field name.
pub fn parse_key_arg(key: &str) -> PathKey {
    if key.trim_start().starts_with('[') {
        if let Ok(array @ Value::Array(_)) = serde_json::from_str::<Value>(key) {
            if let Ok(path) = PathKey::from_json(&array) {
                return path;
            }
        }
    }
    PathKey::scalar(key)
}

/// Read a ready-made request body from `data_dir/name`.
/// The data directory is created when missing.
pub fn read_request_file(data_dir: &Path, name: &str) -> Result<String> {
    fs::create_dir_all(data_dir)
        .io_context(format!("creating directory {}", data_dir.display()))?;
    let path = data_dir.join(name);
    fs::read_to_string(&path).io_context(format!("reading {}", path.display()))
}

/// Send one request frame and wait for the response frame
pub async fn send(addr: SocketAddr, request: &str) -> Result<String> {
    let mut stream = TcpStream::connect(addr)
        .await
        .io_context(format!("connecting to {}", addr))?;
    write_frame(&mut stream, request).await?;
    read_frame(&mut stream).await
}

/// Send a request body and decode the response
pub async fn request(addr: SocketAddr, body: &Value) -> Result<Response> {
    let text = send(addr, &body.to_string()).await?;
    Response::decode(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_build_request_fields() {
        assert_eq!(
            build_request("set", Some("1"), Some("Hello world!")).unwrap(),
            json!({"type": "set", "key": "1", "value": "Hello world!"})
        );
        assert_eq!(
            build_request("get", Some("1"), Some("ignored")).unwrap(),
            json!({"type": "get", "key": "1"})
        );
        assert_eq!(build_request("exit", None, None).unwrap(), json!({"type": "exit"}));
    }

    #[test]
    fn test_build_request_rejects_incomplete() {
        assert!(build_request("get", None, None).is_err());
        assert!(build_request("set", Some("k"), None).is_err());
        assert!(build_request("sett", Some("k"), None).is_err());
    }

    #[test]
    fn test_key_argument_paths() {
        assert_eq!(parse_key_arg(r#"["person","name"]"#), PathKey::path(["person", "name"]));
        assert_eq!(parse_key_arg("[1,2]"), PathKey::scalar("[1,2]"));
        assert_eq!(parse_key_arg("[broken"), PathKey::scalar("[broken"));
        assert_eq!(parse_key_arg("name"), PathKey::scalar("name"));
        assert_eq!(
            build_request("delete", Some(r#"["a","b"]"#), None).unwrap(),
            json!({"type": "delete", "key": ["a", "b"]})
        );
    }

    #[test]
    fn test_read_request_file() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("client_data");
        assert!(read_request_file(&data, "missing.json").is_err());
        assert!(data.is_dir());

        fs::write(data.join("getFile.json"), r#"{"type":"get","key":"name"}"#).unwrap();
        assert_eq!(
            read_request_file(&data, "getFile.json").unwrap(),
            r#"{"type":"get","key":"name"}"#
        );
    }
}

// Wire protocol: one length-prefixed frame each way per connection
//
// Frame layout: u16 big-endian byte length, then that many bytes of
// UTF-8 JSON text.

use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{IoContext, JsonDbError, Result};
use crate::path_key::{json_kind, PathKey};

pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// A decoded request body
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Get(PathKey),
    Set(PathKey, Value),
    Delete(PathKey),
    Exit,
}

impl Operation {
    /// Decode request text. Every failure is an invalid-input error.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| JsonDbError::invalid_request(format!("body is not JSON: {}", e)))?;
        Operation::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(body) = value else {
            return Err(JsonDbError::invalid_request(format!(
                "body is {}, expected an object",
                json_kind(value)
            )));
        };

        let kind = match body.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                return Err(JsonDbError::invalid_request(format!(
                    "type is {}, expected a string",
                    json_kind(other)
                )))
            }
            None => return Err(JsonDbError::invalid_request("missing field type")),
        };

        match kind {
            "get" => Ok(Operation::Get(required_key(body)?)),
            "delete" => Ok(Operation::Delete(required_key(body)?)),
            "set" => {
                let key = required_key(body)?;
                match body.get("value") {
                    Some(value) if !value.is_null() => Ok(Operation::Set(key, value.clone())),
                    _ => Err(JsonDbError::invalid_request("set requires a value")),
                }
            }
            "exit" => Ok(Operation::Exit),
            other => Err(JsonDbError::invalid_request(format!(
                "unknown operation '{}'",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Get(_) => "get",
            Operation::Set(..) => "set",
            Operation::Delete(_) => "delete",
            Operation::Exit => "exit",
        }
    }
}

fn required_key(body: &Map<String, Value>) -> Result<PathKey> {
    match body.get("key") {
        Some(key) if !key.is_null() => PathKey::from_json(key),
        _ => Err(JsonDbError::invalid_request("missing field key")),
    }
}

/// Read one frame. Non-UTF-8 payloads are reported as invalid input.
pub async fn read_frame<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u16().await.io_context("reading frame length")?;
    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .io_context("reading frame body")?;
    String::from_utf8(buf)
        .map_err(|e| JsonDbError::invalid_request(format!("frame is not UTF-8: {}", e)))
}

pub async fn write_frame<W>(writer: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = text.len();
    if len > MAX_FRAME_LEN {
        return Err(JsonDbError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    writer
        .write_u16(len as u16)
        .await
        .io_context("writing frame length")?;
    writer
        .write_all(text.as_bytes())
        .await
        .io_context("writing frame body")?;
    writer.flush().await.io_context("flushing frame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_operations() {
        assert_eq!(
            Operation::parse(r#"{"type":"get","key":"name"}"#).unwrap(),
            Operation::Get(PathKey::scalar("name"))
        );
        assert_eq!(
            Operation::parse(r#"{"type":"set","key":["a","b"],"value":{"c":1}}"#).unwrap(),
            Operation::Set(PathKey::path(["a", "b"]), json!({"c": 1}))
        );
        assert_eq!(
            Operation::parse(r#"{"type":"delete","key":["x"]}"#).unwrap(),
            Operation::Delete(PathKey::path(["x"]))
        );
        assert_eq!(Operation::parse(r#"{"type":"exit"}"#).unwrap(), Operation::Exit);
    }

    #[test]
    fn test_parse_rejects_bad_envelopes() {
        for text in [
            "not json",
            "[1,2]",
            r#"{"key":"a"}"#,
            r#"{"type":5}"#,
            r#"{"type":"get"}"#,
            r#"{"type":"get","key":null}"#,
            r#"{"type":"set","key":"a"}"#,
            r#"{"type":"set","key":"a","value":null}"#,
            r#"{"type":"delete","key":7}"#,
            r#"{"type":"drop","key":"a"}"#,
        ] {
            let err = Operation::parse(text).unwrap_err();
            assert!(err.is_invalid_input(), "{} gave {}", text, err);
        }
    }

    #[test]
    fn test_empty_path_is_left_to_the_store() {
        assert_eq!(
            Operation::parse(r#"{"type":"get","key":[]}"#).unwrap(),
            Operation::Get(PathKey::Path(vec![]))
        );
    }

    #[tokio::test]
    async fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, r#"{"type":"exit"}"#).await.unwrap();
        assert_eq!(&buf[..2], &[0, 15]);

        let mut reader = &buf[..];
        assert_eq!(read_frame(&mut reader).await.unwrap(), r#"{"type":"exit"}"#);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_refused() {
        let mut buf = Vec::new();
        let text = "x".repeat(MAX_FRAME_LEN + 1);
        let err = write_frame(&mut buf, &text).await.unwrap_err();
        assert!(matches!(err, JsonDbError::FrameTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_truncated_frame_is_io_error() {
        let mut reader: &[u8] = &[0, 10, b'{'];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, JsonDbError::Io { .. }));
    }

    #[tokio::test]
    async fn test_non_utf8_frame_is_invalid_input() {
        let mut reader: &[u8] = &[0, 2, 0xff, 0xfe];
        assert!(read_frame(&mut reader).await.unwrap_err().is_invalid_input());
    }
}

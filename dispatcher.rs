// Request dispatch: decoded operation -> store call -> outcome
//
// One pass per connection. No state survives between requests.

use tracing::{debug, error, info};

use crate::async_wrapper::AsyncStore;
use crate::outcome::{Outcome, Response};
use crate::protocol::{Operation, MAX_FRAME_LEN};
use crate::server::Shutdown;

#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: AsyncStore,
    shutdown: Shutdown,
}

impl Dispatcher {
    pub fn new(store: AsyncStore, shutdown: Shutdown) -> Self {
        Dispatcher { store, shutdown }
    }

    pub fn store(&self) -> &AsyncStore {
        &self.store
    }

    /// Decode `text`, run it, and produce the encoded response frame text.
    ///
    /// Malformed requests and unknown operations answer
    /// `Invalid arguments`. A response too large to frame answers with a
    /// server-side error instead.
    pub async fn handle(&self, text: &str) -> String {
        let response = self.dispatch(text).await;
        match response.encode() {
            Ok(encoded) if encoded.len() <= MAX_FRAME_LEN => encoded,
            Ok(encoded) => {
                error!(len = encoded.len(), max = MAX_FRAME_LEN, "response does not fit in a frame");
                fallback_response()
            }
            Err(e) => {
                error!(error = %e, "could not encode response");
                fallback_response()
            }
        }
    }

    pub async fn dispatch(&self, text: &str) -> Response {
        let outcome = match Operation::parse(text) {
            Ok(operation) => self.execute(operation).await,
            Err(e) => {
                debug!(error = %e, "rejected request");
                Outcome::InvalidArguments
            }
        };
        Response::from(outcome)
    }

    pub async fn execute(&self, operation: Operation) -> Outcome {
        let name = operation.name();
        let outcome = match operation {
            Operation::Get(key) => self.store.get(key).await,
            Operation::Set(key, value) => self.store.set(key, value).await,
            Operation::Delete(key) => self.store.delete(key).await,
            Operation::Exit => {
                info!("exit requested, stopping the accept loop");
                self.shutdown.trigger();
                Outcome::ok()
            }
        };
        debug!(operation = name, success = outcome.is_success(), "dispatched");
        outcome
    }
}

const LAST_RESORT_RESPONSE: &str =
    r#"{"response":"ERROR","reason":"503 - something went wrong on server side"}"#;

fn fallback_response() -> String {
    Response::from(Outcome::DatabaseError)
        .encode()
        .unwrap_or_else(|_| LAST_RESORT_RESPONSE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    async fn dispatcher(dir: &std::path::Path) -> Dispatcher {
        let store = AsyncStore::open(&dir.join("db.json"), false).await.unwrap();
        Dispatcher::new(store, Shutdown::new())
    }

    async fn call(d: &Dispatcher, request: Value) -> Value {
        serde_json::from_str(&d.handle(&request.to_string()).await).unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get_over_dispatcher() {
        let dir = tempdir().unwrap();
        let d = dispatcher(dir.path()).await;

        assert_eq!(
            call(&d, json!({"type": "set", "key": ["a", "b"], "value": {"c": [1, 2]}})).await,
            json!({"response": "OK"})
        );
        assert_eq!(
            call(&d, json!({"type": "get", "key": "a"})).await,
            json!({"response": "OK", "value": {"b": {"c": [1, 2]}}})
        );
        assert_eq!(
            call(&d, json!({"type": "delete", "key": ["a", "b", "c"]})).await,
            json!({"response": "OK"})
        );
        assert_eq!(
            call(&d, json!({"type": "get", "key": ["a", "b", "c"]})).await,
            json!({"response": "ERROR", "reason": "No such key"})
        );
    }

    #[tokio::test]
    async fn test_unknown_operation_is_invalid_arguments() {
        let dir = tempdir().unwrap();
        let d = dispatcher(dir.path()).await;

        assert_eq!(
            call(&d, json!({"type": "truncate"})).await,
            json!({"response": "ERROR", "reason": "Invalid arguments"})
        );
        assert_eq!(
            d.handle("garbage").await,
            r#"{"response":"ERROR","reason":"Invalid arguments"}"#
        );
    }

    #[tokio::test]
    async fn test_exit_triggers_shutdown() {
        let dir = tempdir().unwrap();
        let d = dispatcher(dir.path()).await;
        assert!(!d.shutdown.is_triggered());

        assert_eq!(call(&d, json!({"type": "exit"})).await, json!({"response": "OK"}));
        assert!(d.shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_oversized_response_falls_back() {
        let dir = tempdir().unwrap();
        let d = dispatcher(dir.path()).await;
        let big = "x".repeat(MAX_FRAME_LEN);

        assert_eq!(
            d.execute(Operation::Set("big".into(), json!(big))).await,
            Outcome::ok()
        );
        assert_eq!(
            call(&d, json!({"type": "get", "key": "big"})).await,
            json!({"response": "ERROR", "reason": "503 - something went wrong on server side"})
        );
    }

    #[test]
    fn test_fallback_response_is_valid_json() {
        let parsed: Response = Response::decode(&fallback_response()).unwrap();
        assert_eq!(parsed, Response::from(Outcome::DatabaseError));
        assert_eq!(fallback_response(), LAST_RESORT_RESPONSE);
    }
}

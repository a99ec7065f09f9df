use crate::error::AppError;
use crate::storage::{PUSH_TOKEN_KEY, StorageGateway};
use log::{error, info};

/// Remote endpoint accepting device push tokens. Consumed as an opaque
/// success/failure signal; nothing here retries or queues.
pub trait PushGateway {
    fn register_token(&self, token: &str) -> Result<(), AppError>;
}

pub struct HttpPushGateway {
    endpoint: String,
}

impl HttpPushGateway {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl PushGateway for HttpPushGateway {
    fn register_token(&self, token: &str) -> Result<(), AppError> {
        ureq::post(&self.endpoint)
            .send_json(serde_json::json!({ "token": token }))
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}

pub struct NoopPushGateway;

impl PushGateway for NoopPushGateway {
    fn register_token(&self, _token: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Posts the token and caches it under the `notification-token` key.
/// Best-effort: failures are logged and reported only as a disconnected
/// signal, and no token is cached unless registration succeeded.
pub fn register_device(
    push: &dyn PushGateway,
    storage: &dyn StorageGateway,
    token: &str,
) -> bool {
    let token = token.trim();
    if token.is_empty() {
        error!("refusing to register an empty push token");
        return false;
    }

    if let Err(err) = push.register_token(token) {
        error!("push token registration failed: {err}");
        return false;
    }

    if let Err(err) = storage.write_blob(PUSH_TOKEN_KEY, token) {
        error!("failed to cache push token: {err}");
        return false;
    }

    info!("device registered for push notifications");
    true
}

#[cfg(test)]
mod tests {
    use super::{PushGateway, register_device};
    use crate::error::AppError;
    use crate::storage::{PUSH_TOKEN_KEY, StorageGateway};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemStore {
        blobs: Mutex<HashMap<String, String>>,
    }

    impl MemStore {
        fn new() -> Self {
            Self {
                blobs: Mutex::new(HashMap::new()),
            }
        }

        fn token(&self) -> Option<String> {
            self.blobs.lock().unwrap().get(PUSH_TOKEN_KEY).cloned()
        }
    }

    impl StorageGateway for MemStore {
        fn read_blob(&self, key: &str) -> Option<String> {
            self.blobs.lock().unwrap().get(key).cloned()
        }

        fn write_blob(&self, key: &str, payload: &str) -> Result<(), AppError> {
            self.blobs
                .lock()
                .unwrap()
                .insert(key.to_string(), payload.to_string());
            Ok(())
        }
    }

    struct RecordingPush {
        tokens: RefCell<Vec<String>>,
    }

    impl RecordingPush {
        fn new() -> Self {
            Self {
                tokens: RefCell::new(Vec::new()),
            }
        }
    }

    impl PushGateway for RecordingPush {
        fn register_token(&self, token: &str) -> Result<(), AppError> {
            self.tokens.borrow_mut().push(token.to_string());
            Ok(())
        }
    }

    struct RejectingPush;

    impl PushGateway for RejectingPush {
        fn register_token(&self, _token: &str) -> Result<(), AppError> {
            Err(AppError::io("endpoint unreachable"))
        }
    }

    #[test]
    fn successful_registration_caches_token() {
        let push = RecordingPush::new();
        let storage = MemStore::new();

        assert!(register_device(&push, &storage, " expo-token-1 "));
        assert_eq!(push.tokens.borrow().as_slice(), ["expo-token-1"]);
        assert_eq!(storage.token().as_deref(), Some("expo-token-1"));
    }

    #[test]
    fn failed_registration_caches_nothing() {
        let storage = MemStore::new();

        assert!(!register_device(&RejectingPush, &storage, "expo-token-1"));
        assert_eq!(storage.token(), None);
    }

    #[test]
    fn empty_token_is_never_sent() {
        let push = RecordingPush::new();
        let storage = MemStore::new();

        assert!(!register_device(&push, &storage, "   "));
        assert!(push.tokens.borrow().is_empty());
        assert_eq!(storage.token(), None);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use uuid::Uuid;

/// Revoked token ids, kept until the token would have expired anyway.
#[derive(Clone, Default)]
pub struct TokenBlocklist {
    revoked: Arc<RwLock<HashMap<Uuid, i64>>>,
}

impl TokenBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: Uuid, exp: i64) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().unwrap_or_else(|e| e.into_inner());
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.insert(jti, exp);
    }

    pub fn is_revoked(&self, jti: &Uuid) -> bool {
        self.revoked
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(jti)
    }

    pub fn len(&self) -> usize {
        self.revoked.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Web restore sessions and the secrets used to open them

use std::fmt;

use serde::{Deserialize, Serialize};

/// A server-side handle scoping tree listings and restores against one
/// device archive.
///
/// Created once per accessor and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSession {
    pub session_id: String,
    pub device_guid: String,
    /// Storage node hosting the archive; push restores target it.
    pub node_guid: String,
}

/// How the archive for a device is decrypted
#[derive(Clone, Default, PartialEq, Eq)]
pub enum DecryptionCredentials {
    /// Keys are held by the service; a data-key token is fetched first.
    #[default]
    ServerManaged,
    /// Archive protected by a user-chosen private password.
    PrivatePassword(String),
    /// Archive protected by a custom encryption key.
    EncryptionKey(String),
}

/// The secret actually presented when opening a restore session
#[derive(Clone, PartialEq, Eq)]
pub enum SessionSecret {
    DataKeyToken(String),
    PrivatePassword(String),
    EncryptionKey(String),
}

impl SessionSecret {
    /// Name of the JSON field carrying this secret
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::DataKeyToken(_) => "dataKeyToken",
            Self::PrivatePassword(_) => "privatePassword",
            Self::EncryptionKey(_) => "encryptionKey",
        }
    }

    pub fn expose(&self) -> &str {
        match self {
            Self::DataKeyToken(value) | Self::PrivatePassword(value) | Self::EncryptionKey(value) => {
                value
            }
        }
    }
}

impl fmt::Debug for DecryptionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerManaged => write!(f, "ServerManaged"),
            Self::PrivatePassword(_) => write!(f, "PrivatePassword(<redacted>)"),
            Self::EncryptionKey(_) => write!(f, "EncryptionKey(<redacted>)"),
        }
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionSecret({}: <redacted>)", self.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let creds = DecryptionCredentials::PrivatePassword("hunter2".into());
        assert!(!format!("{creds:?}").contains("hunter2"));

        let secret = SessionSecret::EncryptionKey("k3y".into());
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("k3y"));
        assert!(rendered.contains("encryptionKey"));
        assert_eq!(secret.expose(), "k3y");
    }
}

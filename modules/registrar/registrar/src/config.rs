use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Catalog agent connection settings, shared by every agent in the pool.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// HTTP API port of every agent.
    pub port: u16,

    /// ACL token sent as `X-Consul-Token`.
    #[serde(with = "secret::optional")]
    pub token: Option<SecretString>,

    pub tls: TlsConfig,

    /// HTTP basic auth credentials; omitted means no `Authorization` header.
    pub auth: Option<BasicAuthConfig>,

    /// Deadline for a single catalog round trip.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            port: 8500,
            token: None,
            tls: TlsConfig::default(),
            auth: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsConfig {
    /// Talk HTTPS to the agents.
    pub enabled: bool,
    /// Verify agent certificates. Only meaningful with `enabled`.
    pub verify: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verify: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthConfig {
    pub username: String,
    #[serde(with = "secret::required")]
    pub password: SecretString,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Time between the starts of two passes.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Location of the desired-service list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub path: Option<PathBuf>,
}

/// Credentials read from text or from a bare number, since YAML and
/// environment values that are all digits arrive as integers. They always
/// serialize as a fixed marker so configuration dumps never carry them.
mod secret {
    use secrecy::SecretString;
    use serde::Deserialize;

    const MARKER: &str = "[REDACTED]";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    impl From<Raw> for SecretString {
        fn from(raw: Raw) -> Self {
            match raw {
                Raw::Text(text) => text.into(),
                Raw::Unsigned(n) => n.to_string().into(),
                Raw::Signed(n) => n.to_string().into(),
            }
        }
    }

    pub mod required {
        use super::{MARKER, Raw, SecretString};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            _value: &SecretString,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(MARKER)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<SecretString, D::Error> {
            Raw::deserialize(deserializer).map(SecretString::from)
        }
    }

    pub mod optional {
        use super::{MARKER, Raw, SecretString};
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<SecretString>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(_) => serializer.serialize_str(MARKER),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<SecretString>, D::Error> {
            Ok(Option::<Raw>::deserialize(deserializer)?.map(SecretString::from))
        }
    }
}

//! Data structures mirroring the two historical layouts of Traefik's `acme.json`.
//!
//! Traefik v1 writes a single flat document:
//!
//! ```text
//! { "Account": {...}, "Certificates": [ { "Domain": { "Main": ..., "SANs": [...] }, "Certificate": ..., "Key": ... } ] }
//! ```
//!
//! Traefik v2+ nests one such document per certificate resolver and spells the
//! certificate members in lowercase:
//!
//! ```text
//! { "letsencrypt": { "Account": {...}, "Certificates": [ { "domain": { "main": ..., "sans": [...] }, "certificate": ..., "key": ..., "Store": "default" } ] } }
//! ```

use ordermap::OrderMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Registration", default)]
    pub registration: Option<Registration>,
    #[serde(rename = "PrivateKey", default)]
    pub private_key: String,
    #[serde(rename = "KeyType", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub body: RegistrationBody,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub contact: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "Main", alias = "main", default)]
    pub main: String,
    #[serde(rename = "SANs", alias = "sans", default, deserialize_with = "null_as_empty")]
    pub sans: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "Domain", alias = "domain", default)]
    pub domain: Domain,
    /// Base64 encoded PEM certificate chain
    #[serde(rename = "Certificate", alias = "certificate", default)]
    pub certificate: String,
    /// Base64 encoded PEM private key
    #[serde(rename = "Key", alias = "key", default)]
    pub key: String,
    /// TLS store the certificate belongs to (v2 only)
    #[serde(rename = "Store", default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// Traefik v1 layout: one account and its certificates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatStore {
    #[serde(rename = "Account", default)]
    pub account: Option<Account>,
    #[serde(rename = "Certificates", default, deserialize_with = "null_as_empty")]
    pub certificates: Vec<Certificate>,
}

/// Traefik v2+ layout: one flat store per certificate resolver, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespacedStore {
    pub stores: OrderMap<String, FlatStore>,
}

impl Domain {
    /// Every name the certificate is exported under: SANs first, then the main name
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.sans
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.main.as_str()))
    }
}

impl FlatStore {
    pub fn is_empty(&self) -> bool {
        self.account.is_none() && self.certificates.is_empty()
    }
}

/// Go's encoder writes `null` for nil slices, treat it like a missing member
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v1_certificate() {
        let json = r#"{
            "Domain": { "Main": "example.com", "SANs": ["www.example.com", "api.example.com"] },
            "Certificate": "Y2VydA==",
            "Key": "a2V5"
        }"#;
        let cert: Certificate = serde_json::from_str(json).unwrap();

        assert_eq!(cert.domain.main, "example.com");
        assert_eq!(cert.domain.sans, vec!["www.example.com", "api.example.com"]);
        assert_eq!(cert.certificate, "Y2VydA==");
        assert_eq!(cert.key, "a2V5");
        assert_eq!(cert.store, None);
    }

    #[test]
    fn test_parse_v2_certificate() {
        let json = r#"{
            "domain": { "main": "example.org" },
            "certificate": "Y2VydA==",
            "key": "a2V5",
            "Store": "default"
        }"#;
        let cert: Certificate = serde_json::from_str(json).unwrap();

        assert_eq!(cert.domain.main, "example.org");
        assert!(cert.domain.sans.is_empty());
        assert_eq!(cert.store.as_deref(), Some("default"));
    }

    #[test]
    fn test_null_sans_and_certificates() {
        let json = r#"{ "Account": null, "Certificates": null }"#;
        let store: FlatStore = serde_json::from_str(json).unwrap();
        assert!(store.is_empty());

        let json = r#"{ "Main": "example.com", "SANs": null }"#;
        let domain: Domain = serde_json::from_str(json).unwrap();
        assert!(domain.sans.is_empty());
    }

    #[test]
    fn test_parse_account() {
        let json = r#"{
            "Email": "admin@example.com",
            "Registration": {
                "body": { "status": "valid", "contact": ["mailto:admin@example.com"] },
                "uri": "https://acme-v02.api.letsencrypt.org/acme/acct/1"
            },
            "PrivateKey": "cHJpdmF0ZQ==",
            "KeyType": "4096"
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();

        assert_eq!(account.email, "admin@example.com");
        let registration = account.registration.unwrap();
        assert_eq!(registration.body.status, "valid");
        assert_eq!(registration.body.contact, vec!["mailto:admin@example.com"]);
        assert_eq!(account.key_type.as_deref(), Some("4096"));
    }

    #[test]
    fn test_export_names_order() {
        let domain = Domain {
            main: "example.com".to_string(),
            sans: vec!["b.example.com".to_string(), "a.example.com".to_string()],
        };
        let names: Vec<_> = domain.export_names().collect();
        assert_eq!(names, vec!["b.example.com", "a.example.com", "example.com"]);
    }
}

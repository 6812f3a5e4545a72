//! Security-Client Adaptation (C7): translates an external security
//! credential into the pieces the registration stage needs, without the
//! pipeline depending on any concrete credential implementation. The
//! credential type itself (X.509, SAS token, TPM-backed, ...) is out of
//! scope; this module only defines the seam, the same way
//! `control-plane/grpc/src/operations/registry/client.rs` adapts an
//! external gRPC client into the internal operation type without owning
//! the gRPC stack itself.
//!
//! Mirrors `UseSecurityClientStage._run_op` (spec.md §4.7): every security
//! client carries `provisioning_host`, `registration_id` and `id_scope`
//! regardless of credential kind, plus exactly one of a SAS token or an
//! X.509 certificate.

/// Either credential kind a [`SecurityClient`] may hold
/// (`SetSymmetricKeySecurityClientOperation` /
/// `SetX509SecurityClientOperation` in the original).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    SharedAccessSignature(String),
    X509Certificate(String),
}

/// Whatever a registration needs out of a security credential.
pub trait SecurityClient: Send + Sync {
    fn provisioning_host(&self) -> &str;

    fn registration_id(&self) -> &str;

    fn id_scope(&self) -> &str;

    fn credential(&self) -> Credential;
}

/// The pieces pulled out of a [`SecurityClient`] that the registration
/// stage actually consumes. Exactly one of `sas_token`/`client_cert` is
/// `Some`, matching the original's two distinct worker-op shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedCredentials {
    pub provisioning_host: String,
    pub registration_id: String,
    pub id_scope: String,
    pub sas_token: Option<String>,
    pub client_cert: Option<String>,
}

/// Adapt any `SecurityClient` implementation into the plain data the
/// stages work with.
pub fn adapt(security_client: &dyn SecurityClient) -> AdaptedCredentials {
    let (sas_token, client_cert) = match security_client.credential() {
        Credential::SharedAccessSignature(token) => (Some(token), None),
        Credential::X509Certificate(cert) => (None, Some(cert)),
    };
    AdaptedCredentials {
        provisioning_host: security_client.provisioning_host().to_string(),
        registration_id: security_client.registration_id().to_string(),
        id_scope: security_client.id_scope().to_string(),
        sas_token,
        client_cert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SymmetricKeyClient {
        host: String,
        id: String,
        scope: String,
        token: String,
    }

    impl SecurityClient for SymmetricKeyClient {
        fn provisioning_host(&self) -> &str {
            &self.host
        }

        fn registration_id(&self) -> &str {
            &self.id
        }

        fn id_scope(&self) -> &str {
            &self.scope
        }

        fn credential(&self) -> Credential {
            Credential::SharedAccessSignature(self.token.clone())
        }
    }

    struct X509Client {
        host: String,
        id: String,
        scope: String,
        cert: String,
    }

    impl SecurityClient for X509Client {
        fn provisioning_host(&self) -> &str {
            &self.host
        }

        fn registration_id(&self) -> &str {
            &self.id
        }

        fn id_scope(&self) -> &str {
            &self.scope
        }

        fn credential(&self) -> Credential {
            Credential::X509Certificate(self.cert.clone())
        }
    }

    #[test]
    fn adapts_symmetric_key_credentials() {
        let client = SymmetricKeyClient {
            host: "global.azure-devices-provisioning.net".to_string(),
            id: "reg-1".to_string(),
            scope: "0ne00000000".to_string(),
            token: "SharedAccessSignature sr=...".to_string(),
        };
        let adapted = adapt(&client);
        assert_eq!(adapted.provisioning_host, "global.azure-devices-provisioning.net");
        assert_eq!(adapted.registration_id, "reg-1");
        assert_eq!(adapted.id_scope, "0ne00000000");
        assert_eq!(adapted.sas_token.as_deref(), Some("SharedAccessSignature sr=..."));
        assert_eq!(adapted.client_cert, None);
    }

    #[test]
    fn adapts_x509_credentials() {
        let client = X509Client {
            host: "global.azure-devices-provisioning.net".to_string(),
            id: "reg-2".to_string(),
            scope: "0ne00000000".to_string(),
            cert: "-----BEGIN CERTIFICATE-----...".to_string(),
        };
        let adapted = adapt(&client);
        assert_eq!(adapted.sas_token, None);
        assert_eq!(adapted.client_cert.as_deref(), Some("-----BEGIN CERTIFICATE-----..."));
    }
}

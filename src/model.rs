//! Result Builder (C2) and the registration data model (spec.md §3).

use crate::error::ProvisioningError;
use crate::json::get_optional_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal registration status. "assigning" is not terminal and is
/// handled directly by the stages rather than appearing here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Assigned,
    Failed,
}

impl RegistrationStatus {
    /// Parse a terminal status string. Returns `None` for "assigning" or
    /// any other value — callers distinguish those cases themselves.
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "assigned" => Some(Self::Assigned),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assigned => write!(f, "assigned"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Immutable service-reported registration state. All fields are optional:
/// the service may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationState {
    #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(rename = "assignedHub", skip_serializing_if = "Option::is_none")]
    pub assigned_hub: Option<String>,
    /// Note the wire key is `substatus`, not `subStatus` — preserved from
    /// the original service contract (see DESIGN.md).
    #[serde(rename = "substatus", skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<String>,
    #[serde(rename = "createdDateTimeUtc", skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<String>,
    #[serde(rename = "lastUpdatedDateTimeUtc", skip_serializing_if = "Option::is_none")]
    pub last_update_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Immutable terminal result of a registration attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationResult {
    pub operation_id: Option<String>,
    pub status: RegistrationStatus,
    pub registration_state: Option<RegistrationState>,
}

/// Result Builder (C2). Reads `registrationState` out of the decoded
/// response directly — the Python original wraps it in a one-element
/// tuple before indexing `[0]`, which appears accidental (spec.md §9 Open
/// Question #2); that indirection is not reproduced here.
pub fn form_complete_result(
    operation_id: Option<String>,
    decoded: &Value,
    status: RegistrationStatus,
) -> Result<RegistrationResult, ProvisioningError> {
    let registration_state = match crate::json::get_optional(decoded, "registrationState") {
        None => None,
        Some(state) => Some(RegistrationState {
            device_id: get_optional_str(state, "deviceId")?,
            assigned_hub: get_optional_str(state, "assignedHub")?,
            sub_status: get_optional_str(state, "substatus")?,
            created_date_time: get_optional_str(state, "createdDateTimeUtc")?,
            last_update_date_time: get_optional_str(state, "lastUpdatedDateTimeUtc")?,
            etag: get_optional_str(state, "etag")?,
            payload: crate::json::get_optional(state, "payload").cloned(),
        }),
    };

    Ok(RegistrationResult {
        operation_id,
        status,
        registration_state,
    })
}

/// The request body sent for a registration PUT. Field declaration order
/// matters here: it must match the alphabetical key order
/// (`payload` < `registrationId`) that the Python original produces via
/// `json.dumps(..., sort_keys=True)`, since `serde_json` serializes struct
/// fields in declaration order rather than sorting them. `payload` is
/// never omitted: an absent payload serializes as explicit `null`,
/// matching `json.dumps` on a dict whose `payload` key is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRegistrationPayload {
    pub payload: Option<Value>,
    #[serde(rename = "registrationId")]
    pub registration_id: String,
}

impl DeviceRegistrationPayload {
    pub fn new(registration_id: String, payload: Option<Value>) -> Self {
        Self {
            registration_id,
            payload,
        }
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("DeviceRegistrationPayload is always serializable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_sorted_keys() {
        let payload = DeviceRegistrationPayload::new(
            "reg-1".to_string(),
            Some(serde_json::json!({"custom": "data"})),
        );
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"payload":{"custom":"data"},"registrationId":"reg-1"}"#
        );
    }

    #[test]
    fn absent_payload_serializes_as_explicit_null() {
        let payload = DeviceRegistrationPayload::new("reg-1".to_string(), None);
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"payload":null,"registrationId":"reg-1"}"#);
    }

    #[test]
    fn form_complete_result_handles_absent_registration_state() {
        let decoded = serde_json::json!({"operationId": "op-1", "status": "assigned"});
        let result =
            form_complete_result(Some("op-1".to_string()), &decoded, RegistrationStatus::Assigned)
                .unwrap();
        assert_eq!(result.registration_state, None);
    }

    #[test]
    fn form_complete_result_reads_registration_state_directly() {
        let decoded = serde_json::json!({
            "operationId": "op-1",
            "status": "assigned",
            "registrationState": {
                "deviceId": "d1",
                "assignedHub": "h1.example",
                "substatus": "initialAssignment",
            }
        });
        let result =
            form_complete_result(Some("op-1".to_string()), &decoded, RegistrationStatus::Assigned)
                .unwrap();
        let state = result.registration_state.unwrap();
        assert_eq!(state.device_id.as_deref(), Some("d1"));
        assert_eq!(state.assigned_hub.as_deref(), Some("h1.example"));
        assert_eq!(state.sub_status.as_deref(), Some("initialAssignment"));
    }

    #[test]
    fn form_complete_result_is_pure() {
        let decoded = serde_json::json!({"status": "failed"});
        let a = form_complete_result(Some("x".into()), &decoded, RegistrationStatus::Failed).unwrap();
        let b = form_complete_result(Some("x".into()), &decoded, RegistrationStatus::Failed).unwrap();
        assert_eq!(a, b);
    }
}

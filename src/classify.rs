//! Error Classifier (C3).

use crate::constant::RequestType;
use crate::error::{ProvisioningError, TransportError};

/// Classify a completed `RequestAndResponseOperation`.
///
/// 1. A transport-level error always wins and is returned unchanged.
/// 2. A status code in `[300, 429)` is a terminal service error.
/// 3. Status codes `>= 429` are NOT classified as errors here — they are
///    throttling signals the caller (a stage) interprets as "retry after
///    the indicated interval", not a terminal failure.
pub fn classify(
    request_type: RequestType,
    status_code: u16,
    transport_error: Option<TransportError>,
) -> Option<ProvisioningError> {
    if let Some(source) = transport_error {
        return Some(ProvisioningError::Transport {
            request_type,
            source,
        });
    }
    if (300..429).contains(&status_code) {
        return Some(ProvisioningError::Service {
            request_type,
            status_code,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_wins_regardless_of_status() {
        let err: TransportError = "boom".into();
        let classified = classify(RequestType::Register, 200, Some(err));
        assert!(matches!(
            classified,
            Some(ProvisioningError::Transport { .. })
        ));
    }

    #[test]
    fn below_300_is_ok() {
        assert!(classify(RequestType::Register, 200, None).is_none());
        assert!(classify(RequestType::Register, 202, None).is_none());
    }

    #[test]
    fn service_error_band_is_300_to_428() {
        assert!(classify(RequestType::Query, 300, None).is_some());
        assert!(classify(RequestType::Query, 428, None).is_some());
    }

    #[test]
    fn throttle_band_is_not_an_error() {
        assert!(classify(RequestType::Query, 429, None).is_none());
        assert!(classify(RequestType::Query, 503, None).is_none());
    }
}

//! Illustrative CLI: drives one registration through the pipeline using
//! an in-memory transport that immediately reports success. A real
//! deployment supplies its own `Transport` over whatever protocol the
//! provisioning service actually speaks — transport binding is an
//! external collaborator, not part of this crate.

use async_trait::async_trait;
use dps_provisioning::transport::{Transport, TransportRequest, TransportResponse};
use dps_provisioning::{CliArgs, ProvisioningClient, ProvisioningConfig};
use std::sync::Arc;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

struct ImmediateAssignTransport;

#[async_trait]
impl Transport for ImmediateAssignTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, Box<dyn std::error::Error + Send + Sync + 'static>> {
        tracing::info!(request_type = ?request.request_type, method = ?request.method, "transport call");
        let body = serde_json::json!({
            "operationId": "demo-operation",
            "status": "assigned",
            "registrationState": {
                "deviceId": "demo-device",
                "assignedHub": "demo-hub.azure-devices.net",
            },
        });
        Ok(TransportResponse {
            status_code: 200,
            retry_after: None,
            response_body: serde_json::to_vec(&body).expect("static demo body is always valid JSON"),
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = CliArgs::from_args();
    let registration_id = args.registration_id.clone();
    let payload = args
        .payload
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .expect("--payload must be valid JSON");
    let config = ProvisioningConfig::from(args);

    let client = ProvisioningClient::new(Arc::new(ImmediateAssignTransport), config);
    match client.register(registration_id, payload).await {
        Ok(result) => println!("registered: {:#?}", result),
        Err(err) => eprintln!("registration failed: {}", err),
    }
}

//! Attack log endpoints.

use crate::error::ConsoleResult;
use crate::gateway::{RawResponse, RequestDescriptor, RequestGateway};

/// GET /logs/attacks/export
///
/// Exports the given logs, or all of them when `ids` is empty. The reply
/// is the exported file as sent by the backend.
pub async fn export_attack_logs(gateway: &RequestGateway, ids: &[u64]) -> ConsoleResult<RawResponse> {
    let descriptor = ids.iter().fold(
        RequestDescriptor::get("/logs/attacks/export").binary(),
        |d, id| d.query("ids", id),
    );
    gateway.download(descriptor).await
}

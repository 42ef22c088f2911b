use tracing::Instrument;
use uuid::Uuid;

use crate::delivery::{Deliverer, DeliveryResponse};
use crate::error::DeliveryError;
use crate::form::{FormLayout, SubmissionEvent};

/// How a single trigger invocation ended.
#[derive(Debug)]
pub enum Invocation {
    /// No event or no row values: nothing was sent.
    Ignored,
    Delivered(DeliveryResponse),
    Failed(DeliveryError),
}

/// Run one trigger invocation: map the row and forward it.
pub async fn handle_submission(
    event: Option<&SubmissionEvent>,
    layout: &FormLayout,
    deliverer: &Deliverer,
) -> Invocation {
    let Some(values) = event.and_then(SubmissionEvent::values) else {
        return Invocation::Ignored;
    };

    let payload = layout.build_payload(values);
    let span = tracing::info_span!("invocation", id = %Uuid::now_v7());

    async {
        tracing::debug!("Forwarding {} answers", payload.answers.len());
        match deliverer.deliver(&payload).await {
            Ok(resp) => Invocation::Delivered(resp),
            Err(e) => Invocation::Failed(e),
        }
    }
    .instrument(span)
    .await
}

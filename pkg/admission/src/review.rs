use pkg_state::NamespaceLookup;
use pkg_types::admission::{AdmissionResponse, AdmissionReview, AdmissionStatus};
use tracing::warn;

use crate::policy::{AdmissionDecision, NamespacePolicy};

/// A response envelope plus the HTTP status to answer with.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub http_status: u16,
    pub review: AdmissionReview,
    pub decision: AdmissionDecision,
}

impl ReviewOutcome {
    fn new(uid: String, decision: AdmissionDecision) -> Self {
        let status = if decision.allowed {
            None
        } else {
            Some(AdmissionStatus {
                code: decision.decode_error_status.unwrap_or(403),
                message: decision.message.clone(),
            })
        };
        Self {
            http_status: decision.decode_error_status.unwrap_or(200),
            review: AdmissionReview::from_response(AdmissionResponse {
                uid,
                allowed: decision.allowed,
                status,
            }),
            decision,
        }
    }
}

/// Decode an AdmissionReview body, decide it, and build the reply.
/// Malformed bodies produce a 400 outcome rather than an error.
pub async fn handle_review<L>(policy: &NamespacePolicy<L>, body: &[u8]) -> ReviewOutcome
where
    L: NamespaceLookup + ?Sized,
{
    let review: AdmissionReview = match serde_json::from_slice(body) {
        Ok(review) => review,
        Err(e) => {
            warn!("Admission: malformed AdmissionReview: {}", e);
            return ReviewOutcome::new(
                String::new(),
                AdmissionDecision::bad_request(format!("malformed AdmissionReview: {}", e)),
            );
        }
    };
    let Some(request) = review.request else {
        return ReviewOutcome::new(
            String::new(),
            AdmissionDecision::bad_request("AdmissionReview carries no request"),
        );
    };

    let decision = policy
        .decide(
            &request.kind.group,
            &request.kind.kind,
            &request.operation,
            request.namespace.as_deref(),
            request.object.as_ref(),
        )
        .await;
    ReviewOutcome::new(request.uid, decision)
}

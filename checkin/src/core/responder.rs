//! Optional reply-generation backend behind a safety gate.
//!
//! A [`Responder`] may replace the fixed acknowledgement lines with generated
//! text. Generated text is untrusted: it passes the same safety scan as user
//! input and is dropped in favor of the fixed line when flagged, empty, or
//! when generation fails.

use crate::core::safety::scan;
use crate::core::types::{AgeBand, FlowState};

/// What the backend sees when asked for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest<'a> {
    /// State whose answer is being acknowledged.
    pub state: FlowState,
    pub age_band: Option<AgeBand>,
    /// The child's answer (already scanned and accepted).
    pub answer: &'a str,
    /// Fixed acknowledgement used when the backend output is rejected.
    pub fallback: &'a str,
}

/// Abstraction over reply-generation backends.
pub trait Responder {
    fn generate(&self, request: &ReplyRequest<'_>) -> Result<String, String>;
}

/// Where the acknowledgement text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatedReply {
    Generated(String),
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoResponder,
    Failed(String),
    Empty,
    Flagged,
}

impl GatedReply {
    pub fn text<'a>(&'a self, request: &ReplyRequest<'a>) -> &'a str {
        match self {
            GatedReply::Generated(text) => text,
            GatedReply::Fallback(_) => request.fallback,
        }
    }
}

/// Ask `responder` for a reply and gate it through the safety scan.
pub fn gated_reply(responder: Option<&dyn Responder>, request: &ReplyRequest<'_>) -> GatedReply {
    let Some(responder) = responder else {
        return GatedReply::Fallback(FallbackReason::NoResponder);
    };
    let generated = match responder.generate(request) {
        Ok(text) => text,
        Err(err) => return GatedReply::Fallback(FallbackReason::Failed(err)),
    };
    let generated = generated.trim();
    if generated.is_empty() {
        return GatedReply::Fallback(FallbackReason::Empty);
    }
    if scan(Some(generated)).flagged {
        return GatedReply::Fallback(FallbackReason::Flagged);
    }
    GatedReply::Generated(generated.to_string())
}

use docchat_core::state::GateRejection;

/// What a chat or upload flow did.
///
/// Exchange failures are not errors at this level: they have already been
/// turned into a notice in the view, which `Failed` repeats for convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The exchange succeeded and the view was updated.
    Completed,
    /// The exchange failed; the view now shows `notice`.
    Failed { notice: String },
    /// The gate refused the request; nothing was sent.
    Rejected(GateRejection),
    /// The exchange finished after the user switched away from `session_id`;
    /// its result was not applied to the view.
    Discarded { session_id: String },
}

impl FlowOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, FlowOutcome::Completed)
    }
}

/// How a failure of an external call is handled at a particular call site.
///
/// Each outbound call in a flow names its policy explicitly instead of
/// leaving the behavior implicit in the surrounding step code. The three
/// variants cover the observed spectrum: strict steps abort the whole flow,
/// display steps surface an inline error the user can retry manually, and
/// enrichment lookups degrade silently to fallback content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Surface a blocking alert and reset the flow to its first step.
    /// No retry. Used where later steps cannot proceed without the data.
    Abort,
    /// Surface an inline error and stay on the current step; recovery is a
    /// manual retry by the user. Nothing is retried automatically.
    InlineRetry,
    /// Swallow the failure and substitute fallback content. The user never
    /// sees an error. Only for non-critical enrichment data.
    SilentFallback,
}

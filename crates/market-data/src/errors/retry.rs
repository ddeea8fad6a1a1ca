/// Classification for retry policy.
///
/// | Class | Retried by `fetch_with_retry`? |
/// |-------|-------------------------------|
/// | `Never` | No, surfaced immediately |
/// | `WithBackoff` | Yes, until the attempt budget is spent |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad ticker, bad field, or a vendor-side rejection.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Transient failure (timeout, 429, connection refused).
    /// Retried after a short pause, a bounded number of times.
    WithBackoff,
}

use futurecoin_core::FutureCoinError;

/// Join a collection of tasks and apply an optional request-level deadline.
///
/// On timeout this returns `RequestTimeout("request")`; call sites remap the
/// label to their capability.
pub async fn join_with_deadline<I, F, T>(
    tasks: I,
    deadline: Option<std::time::Duration>,
) -> Result<Vec<T>, FutureCoinError>
where
    I: IntoIterator<Item = F>,
    F: core::future::Future<Output = T>,
{
    crate::core::with_request_deadline(deadline, futures::future::join_all(tasks)).await
}

/// Collapse a set of provider errors into a uniform `FutureCoinError` outcome.
///
/// Rules:
/// - If `attempted_any` is false → `Unsupported(capability)`.
/// - If all errors are `ProviderTimeout` → `AllProvidersTimedOut(capability)`.
/// - If `not_found_what` is `Some` and all errors are `NotFound` (or no
///   provider returned an error, i.e. all were empty) → `NotFound(what)`.
/// - Else → `AllProvidersFailed(errors)`.
pub fn collapse_errors(
    capability: &str,
    attempted_any: bool,
    errors: Vec<FutureCoinError>,
    not_found_what: Option<String>,
) -> FutureCoinError {
    if !attempted_any {
        return FutureCoinError::unsupported(capability);
    }
    if !errors.is_empty()
        && errors
            .iter()
            .all(|e| matches!(e, FutureCoinError::ProviderTimeout { .. }))
    {
        return FutureCoinError::AllProvidersTimedOut {
            capability: capability.to_string(),
        };
    }
    if let Some(what) = not_found_what
        && errors
            .iter()
            .all(|e| matches!(e, FutureCoinError::NotFound { .. }))
    {
        return FutureCoinError::not_found(what);
    }
    FutureCoinError::AllProvidersFailed(errors)
}

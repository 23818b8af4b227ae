use crate::policy::{PolicyError, ScanKind};
use posture_cache::CacheStore;
use posture_source::PolicyGetter;
use posture_types::{Framework, PolicyIdentifier};

/// Fetch every identifier in order and assemble the evaluator's framework list.
///
/// - `Framework`: one entry per fetched framework, in request order.
/// - `Control`: a single synthetic framework holding every fetched control, in request order.
///
/// The first fetch error aborts the pass. A source answering "not found" (`Ok(None)`) is skipped
/// silently; the caller notices only through an empty result. An empty `identifiers` slice yields
/// an empty list, not an error.
pub fn aggregate<S: PolicyGetter + ?Sized>(
    kind: ScanKind,
    identifiers: &[PolicyIdentifier],
    source: &S,
    cache: &CacheStore,
) -> Result<Vec<Framework>, PolicyError> {
    match kind {
        ScanKind::Framework => download_frameworks(identifiers, source, cache),
        ScanKind::Control => download_controls(identifiers, source, cache),
        ScanKind::Unrecognized(kind) => Err(PolicyError::UnknownKind { kind }),
    }
}

fn download_frameworks<S: PolicyGetter + ?Sized>(
    identifiers: &[PolicyIdentifier],
    source: &S,
    cache: &CacheStore,
) -> Result<Vec<Framework>, PolicyError> {
    let mut frameworks = Vec::with_capacity(identifiers.len());
    for rule in identifiers {
        let Some(framework) = source
            .get_framework(&rule.name)
            .map_err(PolicyError::download)?
        else {
            tracing::debug!(name = %rule.name, "framework not found in source");
            continue;
        };

        tracing::debug!(
            name = %rule.name,
            controls = framework.controls.len(),
            "received framework"
        );
        cache.save(&rule.name, &framework);
        frameworks.push(framework);
    }
    Ok(frameworks)
}

fn download_controls<S: PolicyGetter + ?Sized>(
    identifiers: &[PolicyIdentifier],
    source: &S,
    cache: &CacheStore,
) -> Result<Vec<Framework>, PolicyError> {
    let mut controls = Vec::with_capacity(identifiers.len());
    for rule in identifiers {
        let Some(control) = source
            .get_control(&rule.name)
            .map_err(PolicyError::download)?
        else {
            tracing::debug!(name = %rule.name, "control not found in source");
            continue;
        };

        tracing::debug!(name = %rule.name, "received control");
        cache.save(&rule.name, &control);
        controls.push(control);
    }

    if controls.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Framework::synthetic(controls)])
}

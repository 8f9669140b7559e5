use rubric_model::{RawType, TypeKind, TypeUniverse, Value};

use crate::callable::ResolvedCallable;
use crate::distance::min_distance;
use crate::error::{Failure, Verify};

/// Ephemeral pairing of a candidate with its applicability score for one
/// invocation attempt.
struct ScoredCandidate<'c> {
    score: f32,
    callable: &'c ResolvedCallable,
}

/// Select the candidate whose parameters most closely match the runtime types
/// of `args`.
///
/// Every applicable candidate is scored per parameter position and the scores
/// summed; the maximum wins. `Ok(None)` means no candidate was applicable.
/// A tie at the maximum is [`Failure::AmbiguousOverload`]: silent arbitrary
/// choice would make overload resolution unobservable, so it is a hard
/// failure. Ties below the maximum are fine.
///
/// The same algorithm resolves constructors against construction arguments.
pub fn best_match(
    universe: &TypeUniverse,
    candidates: &[ResolvedCallable],
    args: &[Value],
) -> Verify<Option<ResolvedCallable>> {
    let mut scored: Vec<ScoredCandidate<'_>> = Vec::new();
    for callable in candidates {
        if let Some(score) = score_candidate(universe, callable, args) {
            tracing::trace!(
                target = "rubric.harness",
                candidate = %callable.describe(universe),
                score,
                "candidate scored"
            );
            scored.push(ScoredCandidate { score, callable });
        }
    }

    let Some(high) = scored
        .iter()
        .map(|s| s.score)
        .max_by(|a, b| a.total_cmp(b))
    else {
        return Ok(None);
    };

    // Exact float comparison on purpose: two candidates are ambiguous only
    // when the metric literally cannot separate them.
    let mut best = scored.iter().filter(|s| s.score == high);
    let winner = best.next().expect("a maximal score implies a candidate");
    if best.next().is_some() {
        let rendered: Vec<String> = args.iter().map(|a| universe.display_value(a)).collect();
        return Err(Failure::AmbiguousOverload {
            name: winner.callable.name.clone(),
            args: rendered.join(", "),
        });
    }
    Ok(Some(winner.callable.clone()))
}

/// Score one candidate, or `None` if it is inapplicable to this call.
fn score_candidate(
    universe: &TypeUniverse,
    callable: &ResolvedCallable,
    args: &[Value],
) -> Option<f32> {
    if callable.params.len() != args.len() {
        return None;
    }

    let wk = universe.well_known();
    let object = RawType::of(wk.object);
    let object_array = RawType {
        id: wk.object,
        dims: 1,
    };

    let mut score = 0f32;
    for (param, arg) in callable.params.iter().zip(args) {
        let param = param.raw();
        let arg = universe.runtime_type(arg)?;
        if param == arg {
            score += 3.0;
        } else if universe.is_assignable(arg, param) {
            // Generic "accepts anything" parameters lose to anything more
            // specific.
            let range = if param == object || param == object_array {
                1.0
            } else {
                2.0
            };
            score += range - min_distance(universe, arg, param) as f32 / 100.0;
        } else if param.dims == 0
            && universe.kind(param.id) == TypeKind::Primitive
            && wk.boxed_of(param.id) == Some(arg.id)
            && arg.dims == 0
        {
            score += 0.5;
        } else {
            return None;
        }
    }
    Some(score)
}

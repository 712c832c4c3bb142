//! Representative submission per submitter

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::models::Submission;

/// Submissions a submitter could be represented by, oldest first.
///
/// Never-selected submissions take priority; once all have been picked, the
/// ones picked longest ago are the candidates.
pub fn representative_candidates<'a>(submissions: &[&'a Submission]) -> Vec<&'a Submission> {
    let fresh: Vec<&Submission> = submissions
        .iter()
        .copied()
        .filter(|s| s.is_never_selected())
        .collect();

    let mut candidates = if !fresh.is_empty() {
        fresh
    } else {
        let oldest = submissions.iter().filter_map(|s| s.last_selected_date).min();
        submissions
            .iter()
            .copied()
            .filter(|s| s.last_selected_date == oldest)
            .collect()
    };

    candidates.sort_by(|a, b| {
        a.submission_date
            .cmp(&b.submission_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates
}

/// Pick one candidate uniformly, or the oldest when no RNG is given
pub fn pick_representative<'a>(
    candidates: &[&'a Submission],
    rng: Option<&mut dyn RngCore>,
) -> Option<&'a Submission> {
    match rng {
        Some(rng) => candidates.choose(rng).copied(),
        None => candidates.first().copied(),
    }
}

use std::cmp::Ordering;

/// Descending by score; equal scores fall back to ascending index so results
/// are reproducible. NaN sorts last.
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    match (a.1.is_nan(), b.1.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
    }
    .then_with(|| a.0.cmp(&b.0))
}

/// Returns the `min(k, scores.len())` best `(index, score)` pairs ordered by
/// descending score.
///
/// Uses a partial selection so only the head is sorted.
pub fn top_k<'a, I>(scores: I, k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut indexed: Vec<(usize, f32)> = scores.into_iter().copied().enumerate().collect();
    let k = k.min(indexed.len());
    if k == 0 {
        return Vec::new();
    }

    if k < indexed.len() {
        indexed.select_nth_unstable_by(k - 1, rank);
        indexed.truncate(k);
    }
    indexed.sort_unstable_by(rank);
    indexed
}

use ndarray::ArrayView1;

/// Index and value of the highest score. `None` for an empty or all-NaN slice.
pub(crate) fn argmax(scores: ArrayView1<f32>) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// Probability of the `index`-th class after a numerically stable softmax.
pub(crate) fn softmax_at(scores: ArrayView1<f32>, index: usize) -> f32 {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f32 = scores.iter().map(|&x| (x - max).exp()).sum();
    if sum > 0.0 {
        (scores[index] - max).exp() / sum
    } else {
        0.0
    }
}

/// Strips the WordNet id from a synset line:
/// `"n02085936 Maltese dog, Maltese terrier, Maltese"` -> `"Maltese dog, Maltese terrier, Maltese"`.
/// Lines without an id are returned trimmed.
pub(crate) fn synset_label(line: &str) -> &str {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((id, label)) if is_wordnet_id(id) => label.trim(),
        _ => line,
    }
}

fn is_wordnet_id(token: &str) -> bool {
    token.len() > 1
        && token.starts_with('n')
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

//! Gestalt (Ratcliff/Obershelp) string similarity.
//!
//! The ratio is `2 * M / T`, where `T` is the total number of characters in
//! both strings and `M` the number of characters in matching blocks, found by
//! repeatedly taking the longest common block and recursing on both sides.
//!
//! Matching is bounded for long inputs: only the first [`MAX_SCORED_CHARS`]
//! of each side take part, and once the indexed side reaches
//! [`AUTOJUNK_MIN_LEN`] characters its most frequent characters are left out
//! of the index (blocks are still extended over them).

use std::collections::HashMap;

/// Characters of each side that take part in matching.
pub const MAX_SCORED_CHARS: usize = 20_000;

/// Indexed length from which popular characters are dropped from the index.
pub const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity of `query` and `text` in `[0, 1]`.
///
/// Returns 0.0 when either side is empty. The arguments are put in a
/// canonical order first, so `similarity(a, b) == similarity(b, a)`.
pub fn similarity(query: &str, text: &str) -> f64 {
    if query.is_empty() || text.is_empty() {
        return 0.0;
    }
    if query == text {
        return 1.0;
    }

    let a: Vec<char> = query.chars().collect();
    let b: Vec<char> = text.chars().collect();

    // Longer sequence first; the shorter one gets indexed.
    let (long, short) = match a.len().cmp(&b.len()).then_with(|| a.cmp(&b)) {
        std::cmp::Ordering::Less => (b, a),
        _ => (a, b),
    };

    let total = long.len() + short.len();
    let long = &long[..long.len().min(MAX_SCORED_CHARS)];
    let short = &short[..short.len().min(MAX_SCORED_CHARS)];
    let matched = matching_chars(long, short);
    2.0 * matched as f64 / total as f64
}

/// Positions of each character of `b`, without the popular ones when `b` is long.
fn index(b: &[char]) -> HashMap<char, Vec<usize>> {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }
    if b.len() >= AUTOJUNK_MIN_LEN {
        let popular = b.len() / 100 + 1;
        positions.retain(|_, js| js.len() <= popular);
    }
    positions
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let positions = index(b);

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, &positions, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest block `a[i..i+size] == b[j..j+size]` inside the given windows.
///
/// Ties go to the earliest `i`, then the earliest `j`. The block found through
/// the index is then grown over equal characters on both ends.
fn longest_match(
    a: &[char], b: &[char], positions: &HashMap<char, Vec<usize>>, alo: usize, ahi: usize, blo: usize, bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run length of the match ending at b[j], for the previous row of `a`
    let mut run_ending: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_run = HashMap::new();
        if let Some(js) = positions.get(c) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let size = j.checked_sub(1).and_then(|prev| run_ending.get(&prev)).copied().unwrap_or(0) + 1;
                next_run.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        run_ending = next_run;
    }

    while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
        best_i -= 1;
        best_j -= 1;
        best_size += 1;
    }
    while best_i + best_size < ahi && best_j + best_size < bhi && a[best_i + best_size] == b[best_j + best_size] {
        best_size += 1;
    }

    (best_i, best_j, best_size)
}

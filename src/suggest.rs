//! "Did you mean" matching for member names.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::DEFAULT_MAX_SUGGESTIONS;

/// Lower-cases and drops spaces, hyphens and underscores.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// Ranks `candidates` against `query`, best first, at most `limit` names.
/// Ties keep the candidates' order.
pub fn suggest(query: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let cleaned = normalize(query);
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .collect();
    let threshold = 2.max(cleaned.chars().count() / 4);

    let mut accepted: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            let normalized = normalize(candidate);
            let distance = levenshtein(&cleaned, &normalized);
            let keep = normalized == cleaned
                || words.iter().all(|w| normalized.contains(w))
                || distance <= threshold;
            keep.then_some((distance, *candidate))
        })
        .collect();
    accepted.sort_by_key(|(distance, _)| *distance);
    accepted
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Entries kept before the memo is flushed.
const MEMO_CAPACITY: usize = 512;

/// Memoizes [`suggest`] per query and candidate list.
#[derive(Debug)]
pub struct Suggester {
    limit: usize,
    memo: RwLock<HashMap<String, Vec<String>>>,
}

impl Default for Suggester {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS)
    }
}

impl Suggester {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn suggest(&self, query: &str, candidates: &[&str]) -> Vec<String> {
        let key = format!("{}:{}", query.to_lowercase(), candidates.join(","));
        if let Some(hit) = self
            .memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }
        let result = suggest(query, candidates, self.limit);
        let mut memo = self.memo.write().unwrap_or_else(PoisonError::into_inner);
        if memo.len() >= MEMO_CAPACITY {
            memo.clear();
        }
        memo.insert(key, result.clone());
        result
    }

    pub fn clear(&self) {
        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspector_label_matches_camel_case_member() {
        let found = suggest("Max Reach Distance", &["maxReachDistance", "health"], 3);
        assert_eq!(found, vec!["maxReachDistance".to_string()]);
    }

    #[test]
    fn inspector_label_matches_snake_case_member() {
        let found = suggest("Max Reach Distance", &["health", "max_reach_distance"], 3);
        assert_eq!(found, vec!["max_reach_distance".to_string()]);
    }

    #[test]
    fn typos_within_threshold_are_ranked_by_distance() {
        let found = suggest("sped", &["spread", "speed", "seed", "health"], 3);
        assert_eq!(found[0], "speed");
        assert!(found.contains(&"seed".to_string()));
        assert!(!found.contains(&"health".to_string()));
    }

    #[test]
    fn results_are_capped() {
        let found = suggest("ab", &["aa", "ab", "ac", "ad", "ae"], 3);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], "ab");
    }

    #[test]
    fn blank_query_suggests_nothing() {
        assert!(suggest("  ", &["speed"], 3).is_empty());
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn suggester_memoizes_results() {
        let suggester = Suggester::new(2);
        let first = suggester.suggest("colr", &["color", "collider"]);
        let second = suggester.suggest("colr", &["color", "collider"]);
        assert_eq!(first, second);
        assert_eq!(first[0], "color");
        assert!(first.len() <= 2);
    }

    #[test]
    fn suggester_memo_stays_bounded() {
        let suggester = Suggester::default();
        for i in 0..MEMO_CAPACITY * 2 + 7 {
            suggester.suggest(&format!("query{i}"), &["speed"]);
        }
        let len = suggester
            .memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        assert!(len > 0 && len <= MEMO_CAPACITY);
    }
}

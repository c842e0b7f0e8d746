//! Approximate command matching.
//!
//! The vocabulary is loaded into a trie once. A query walks the trie depth first and
//! carries one row of the Levenshtein table per edge, so shared prefixes are only
//! scored once and any branch whose best cell already exceeds the bound is pruned.

use std::collections::BTreeMap;

/// Default edit-distance bound.
pub const DEFAULT_MAX_COST: usize = 4;

#[derive(Debug, Default)]
struct TrieNode {
    word: Option<String>,
    children: BTreeMap<char, TrieNode>,
}

impl TrieNode {
    fn insert(&mut self, word: &str) {
        let mut node = self;
        for c in word.chars() {
            node = node.children.entry(c).or_default();
        }
        node.word = Some(word.to_string());
    }
}

/// Ranking tuple; the smallest one wins.
type Candidate<'a> = (usize, usize, &'a str);

/// Resolves noisy operator input against a fixed vocabulary.
#[derive(Debug)]
pub struct CommandMatcher {
    root: TrieNode,
    max_cost: usize,
}

impl CommandMatcher {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = TrieNode::default();
        for word in vocabulary {
            root.insert(&word.as_ref().to_lowercase());
        }
        Self {
            root,
            max_cost: DEFAULT_MAX_COST,
        }
    }

    pub fn with_max_cost(mut self, max_cost: usize) -> Self {
        self.max_cost = max_cost;
        self
    }

    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    /// Best entry within the configured bound, or `None` for unrecognised input.
    pub fn resolve(&self, query: &str) -> Option<&str> {
        self.resolve_within(query, self.max_cost)
    }

    /// Best entry whose edit distance to `query` is at most `max_cost`.
    ///
    /// Candidates are ranked by `(edit distance, alignment penalty, word)`.
    pub fn resolve_within(&self, query: &str, max_cost: usize) -> Option<&str> {
        let query: Vec<char> = query.trim().to_lowercase().chars().collect();
        if query.is_empty() {
            return None;
        }
        let first_row: Vec<usize> = (0..=query.len()).collect();
        let mut best: Option<Candidate<'_>> = None;
        for (&c, child) in &self.root.children {
            search(child, c, &query, &first_row, max_cost, &mut best);
        }
        best.map(|(_, _, word)| word)
    }
}

fn search<'a>(
    node: &'a TrieNode,
    letter: char,
    query: &[char],
    previous: &[usize],
    max_cost: usize,
    best: &mut Option<Candidate<'a>>,
) {
    let mut row = Vec::with_capacity(previous.len());
    row.push(previous[0] + 1);
    for col in 1..previous.len() {
        let insert = row[col - 1] + 1;
        let delete = previous[col] + 1;
        let replace = previous[col - 1] + usize::from(query[col - 1] != letter);
        row.push(insert.min(delete).min(replace));
    }

    let cost = row[row.len() - 1];
    if cost <= max_cost {
        if let Some(word) = node.word.as_deref() {
            let candidate = (cost, alignment_penalty(query, word), word);
            if best.is_none_or(|current| candidate < current) {
                *best = Some(candidate);
            }
        }
    }

    if row.iter().min().is_some_and(|&m| m <= max_cost) {
        for (&c, child) in &node.children {
            search(child, c, query, &row, max_cost, best);
        }
    }
}

/// `|len(query) - longest common substring|`: how far the query is from containing
/// one contiguous run of the word.
fn alignment_penalty(query: &[char], word: &str) -> usize {
    let word: Vec<char> = word.chars().collect();
    let mut prev = vec![0usize; word.len() + 1];
    let mut longest = 0;
    for &q in query {
        let mut cur = vec![0usize; word.len() + 1];
        for (j, &w) in word.iter().enumerate() {
            if q == w {
                cur[j + 1] = prev[j] + 1;
                longest = longest.max(cur[j + 1]);
            }
        }
        prev = cur;
    }
    query.len().abs_diff(longest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::VOCABULARY;

    fn matcher() -> CommandMatcher {
        CommandMatcher::new(VOCABULARY)
    }

    #[test]
    fn corrects_transposed_letters() {
        assert_eq!(matcher().resolve("stpo"), Some("stop"));
        assert_eq!(matcher().resolve("anlyze"), Some("analyze"));
        assert_eq!(matcher().resolve("get lnik"), Some("get link"));
        assert_eq!(matcher().resolve("swpa2"), Some("swap2"));
    }

    #[test]
    fn exact_match_wins() {
        let m = matcher();
        for word in VOCABULARY {
            assert_eq!(m.resolve(word), Some(word));
        }
        assert_eq!(m.resolve("  ANALYZE "), Some("analyze"));
    }

    #[test]
    fn nothing_within_bound_is_unrecognised() {
        assert_eq!(matcher().resolve_within("zzzzzzzz", 1), None);
        assert_eq!(matcher().resolve("zzzzzzzzzzzz"), None);
        assert_eq!(matcher().resolve(""), None);
        assert_eq!(matcher().resolve("   "), None);
    }

    #[test]
    fn bound_is_respected() {
        let m = matcher().with_max_cost(1);
        assert_eq!(m.max_cost(), 1);
        assert_eq!(m.resolve("stpo"), None);
        assert_eq!(m.resolve("stopp"), Some("stop"));
    }

    #[test]
    fn resolution_is_repeatable() {
        let m = matcher();
        let queries = ["stpo", "dispaly", "bset move", "qiut", "mnual", "xyz", "a"];
        let first: Vec<Option<String>> =
            queries.iter().map(|q| m.resolve(q).map(str::to_string)).collect();
        for _ in 0..5 {
            let again: Vec<Option<String>> =
                queries.iter().map(|q| m.resolve(q).map(str::to_string)).collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn alignment_breaks_edit_distance_ties() {
        // "bc" はどちらとも距離 1。連続一致はどちらも "bc" なので語順で "abc"
        let m = CommandMatcher::new(["abc", "xbc"]);
        assert_eq!(m.resolve("bc"), Some("abc"));

        // 距離はどちらも 1。"abcd" との最長連続一致は "cd" と "ab" で同じ 2 → 語順
        let m = CommandMatcher::new(["axcd", "abxd"]);
        assert_eq!(m.resolve("abcd"), Some("abxd"));

        // 距離はどちらも 2 (x を 2 つ挿入)。連続一致 3 vs 1 で、語順では後ろの "xxabc" が勝つ
        let m = CommandMatcher::new(["xxabc", "axbxc"]);
        assert_eq!(m.resolve("abc"), Some("xxabc"));
        assert_eq!(alignment_penalty(&['a', 'b', 'c'], "xxabc"), 0);
        assert_eq!(alignment_penalty(&['a', 'b', 'c'], "axbxc"), 2);
    }
}

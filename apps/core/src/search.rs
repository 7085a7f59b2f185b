use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::{Item, ItemKind, Snapshot};

/// Lowercased, trimmed, whitespace-split query words with duplicates removed.
pub fn query_words(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|word| seen.insert(word.to_string()))
        .map(str::to_string)
        .collect()
}

/// Filters and ranks snapshot items. Pure: the same inputs always give the same order.
pub fn search(snapshot: &Snapshot, query: &str) -> Vec<Item> {
    let normalized_query = query.trim().to_lowercase();
    let words = query_words(&normalized_query);
    if words.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<(ItemKind, &str)> = HashSet::new();
    let mut ranked: Vec<Ranked<'_>> = snapshot
        .items()
        .filter(|item| seen.insert((item.kind, item.id.as_str())))
        .filter_map(|item| rank_item(item, &normalized_query, &words))
        .collect();

    ranked.sort_by(compare_ranked);
    ranked.into_iter().map(|entry| entry.item.clone()).collect()
}

struct Ranked<'a> {
    item: &'a Item,
    exact: bool,
    all_in_title: bool,
    title_len: usize,
    lower_title: String,
}

fn rank_item<'a>(item: &'a Item, normalized_query: &str, words: &[String]) -> Option<Ranked<'a>> {
    let lower_title = item.title.to_lowercase();
    let haystack = format!("{lower_title} {}", item.subtitle.to_lowercase());
    if !words.iter().all(|word| haystack.contains(word.as_str())) {
        return None;
    }

    Some(Ranked {
        item,
        exact: lower_title.trim() == normalized_query,
        all_in_title: words.iter().all(|word| lower_title.contains(word.as_str())),
        title_len: item.title.chars().count(),
        lower_title,
    })
}

fn compare_ranked(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.exact
        .cmp(&a.exact)
        .then_with(|| b.all_in_title.cmp(&a.all_in_title))
        .then_with(|| a.title_len.cmp(&b.title_len))
        .then_with(|| a.lower_title.cmp(&b.lower_title))
        .then_with(|| a.item.kind.cmp(&b.item.kind))
        .then_with(|| a.item.id.cmp(&b.item.id))
}

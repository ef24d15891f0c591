use crate::{models::Movie, services::Catalog};

/// Minimum similarity a title needs to count as a match (exclusive)
pub const MATCH_THRESHOLD: f64 = 0.7;

/// Multiplier applied when the title contains the query verbatim
pub const SUBSTRING_BOOST: f64 = 1.5;

/// Levenshtein edit distance over Unicode scalar values (unit costs)
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Similarity of a query to a title, after case folding both
///
/// `1 - distance / len(title)`, boosted by `SUBSTRING_BOOST` when the title
/// contains the query. An empty title has no similarity to anything.
pub fn similarity(title: &str, query: &str) -> Option<f64> {
    let title = title.to_lowercase();
    let query = query.to_lowercase();

    let title_len = title.chars().count();
    if title_len == 0 {
        return None;
    }

    let distance = levenshtein(&title, &query);
    let mut score = 1.0 - distance as f64 / title_len as f64;
    if title.contains(&query) {
        score *= SUBSTRING_BOOST;
    }
    Some(score)
}

/// Movies whose title matches the query, in catalog order
///
/// An empty query matches nothing: its distance to any title equals the
/// title length, so the similarity is zero even after the substring boost.
pub fn search(catalog: &Catalog, query: &str) -> Vec<Movie> {
    search_scored(catalog, query)
        .into_iter()
        .map(|(movie, _)| movie)
        .collect()
}

/// Matches paired with their similarity, still in catalog order
pub fn search_scored(catalog: &Catalog, query: &str) -> Vec<(Movie, f64)> {
    let matches: Vec<(Movie, f64)> = catalog
        .movies()
        .filter_map(|movie| {
            similarity(&movie.title, query)
                .filter(|score| *score > MATCH_THRESHOLD)
                .map(|score| (movie.clone(), score))
        })
        .collect();

    tracing::debug!(query = %query, results = matches.len(), "Title search completed");
    matches
}

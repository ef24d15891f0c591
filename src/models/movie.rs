use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Genre string used by the catalog data for movies without any genre
const NO_GENRES: &str = "(no genres listed)";

/// Catalog identifier of a movie
///
/// The static data files store it either as a decimal string (`"1"`) or as a
/// plain number; both forms are accepted. It always serializes as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawMovieId", into = "u64")]
pub struct MovieId(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMovieId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawMovieId> for MovieId {
    type Error = String;

    fn try_from(raw: RawMovieId) -> Result<Self, Self::Error> {
        match raw {
            RawMovieId::Number(id) => Ok(MovieId(id)),
            RawMovieId::Text(text) => text.parse(),
        }
    }
}

impl From<MovieId> for u64 {
    fn from(id: MovieId) -> Self {
        id.0
    }
}

impl FromStr for MovieId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(MovieId)
            .map_err(|_| format!("invalid movie id: {:?}", s))
    }
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw movie record as stored in `movies.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    #[serde(default)]
    pub genres: String,
}

/// A catalog movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    /// Genre tags, in the order the data lists them
    pub genres: Vec<String>,
}

impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Movie {
            movie_id: record.movie_id,
            title: record.title,
            genres: split_genres(&record.genres),
        }
    }
}

fn split_genres(genres: &str) -> Vec<String> {
    if genres.trim() == NO_GENRES {
        return Vec::new();
    }
    genres
        .split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

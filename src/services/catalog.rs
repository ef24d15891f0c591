use std::{
    collections::{hash_map::Entry, HashMap},
    path::Path,
    sync::Arc,
};

use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{Link, LinkRecord, Movie, MovieId, MovieRecord},
};

/// Immutable in-memory movie catalog
///
/// Built once at startup from the static movie and link records. Movies keep
/// the order of the source data; lookups by id are O(1).
#[derive(Debug)]
pub struct Catalog {
    movies: Vec<Movie>,
    index: HashMap<MovieId, usize>,
    links: HashMap<MovieId, Arc<Link>>,
}

impl Catalog {
    /// Validates the records and builds the catalog indexes
    ///
    /// Fails with `CatalogLoad` on duplicate movie ids, duplicate links for the
    /// same movie, or a link pointing at a movie that does not exist.
    pub fn load(movie_records: Vec<MovieRecord>, link_records: Vec<LinkRecord>) -> AppResult<Self> {
        let mut movies = Vec::with_capacity(movie_records.len());
        let mut index = HashMap::with_capacity(movie_records.len());

        for record in movie_records {
            let movie = Movie::from(record);
            match index.entry(movie.movie_id) {
                Entry::Occupied(_) => {
                    return Err(AppError::CatalogLoad(format!(
                        "duplicate movieId {}",
                        movie.movie_id
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(movies.len());
                }
            }
            movies.push(movie);
        }

        let mut links = HashMap::with_capacity(link_records.len());
        for record in link_records {
            if !index.contains_key(&record.movie_id) {
                return Err(AppError::CatalogLoad(format!(
                    "link references unknown movieId {}",
                    record.movie_id
                )));
            }
            match links.entry(record.movie_id) {
                Entry::Occupied(_) => {
                    return Err(AppError::CatalogLoad(format!(
                        "duplicate link for movieId {}",
                        record.movie_id
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Link::from(record)));
                }
            }
        }

        let unlinked = movies.len() - links.len();
        if unlinked > 0 {
            tracing::warn!(unlinked, "Some catalog movies have no metadata link");
        }

        tracing::info!(
            movies = movies.len(),
            links = links.len(),
            "Catalog loaded"
        );

        Ok(Self {
            movies,
            index,
            links,
        })
    }

    /// Reads `movies.json` and `links.json` (JSON arrays of records) and loads them
    pub fn from_json_files(movies_path: &Path, links_path: &Path) -> AppResult<Self> {
        let movies: Vec<MovieRecord> = read_records(movies_path)?;
        let links: Vec<LinkRecord> = read_records(links_path)?;
        Self::load(movies, links)
    }

    pub fn movie(&self, id: MovieId) -> AppResult<&Movie> {
        self.index
            .get(&id)
            .map(|&i| &self.movies[i])
            .ok_or_else(|| AppError::NotFound(format!("movie {}", id)))
    }

    /// Metadata link for a movie
    ///
    /// Every movie is expected to have one, but a missing entry is reported as
    /// `NotFound` rather than trusted.
    pub fn link(&self, movie_id: MovieId) -> AppResult<Arc<Link>> {
        self.links
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("link for movie {}", movie_id)))
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.index.contains_key(&id)
    }

    /// All movies in catalog order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

fn read_records<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::CatalogLoad(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::CatalogLoad(format!("failed to parse {}: {}", path.display(), e))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn movie_record(id: u64, title: &str) -> MovieRecord {
        MovieRecord {
            movie_id: MovieId(id),
            title: title.to_string(),
            genres: "Drama".to_string(),
        }
    }

    pub(crate) fn link_record(id: u64, tmdb_id: Option<u64>) -> LinkRecord {
        LinkRecord {
            movie_id: MovieId(id),
            imdb_id: format!("{:07}", id),
            tmdb_id,
        }
    }

    /// Catalog with one link per movie, tmdb id = 1000 + movie id
    pub(crate) fn catalog_of(titles: &[(u64, &str)]) -> Catalog {
        let movies = titles.iter().map(|(id, t)| movie_record(*id, t)).collect();
        let links = titles
            .iter()
            .map(|(id, _)| link_record(*id, Some(1000 + id)))
            .collect();
        Catalog::load(movies, links).unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let catalog = catalog_of(&[(1, "Toy Story (1995)"), (2, "Jumanji (1995)")]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.movie(MovieId(2)).unwrap().title, "Jumanji (1995)");
        assert_eq!(catalog.link(MovieId(1)).unwrap().tmdb_id, Some(1001));
    }

    #[test]
    fn test_movies_keep_source_order() {
        let catalog = catalog_of(&[(30, "C"), (10, "A"), (20, "B")]);
        let ids: Vec<u64> = catalog.movies().map(|m| m.movie_id.0).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_unknown_movie_is_not_found() {
        let catalog = catalog_of(&[(1, "Toy Story (1995)")]);
        assert!(matches!(catalog.movie(MovieId(99)), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_missing_link_is_not_found() {
        let catalog = Catalog::load(vec![movie_record(1, "Heat (1995)")], vec![]).unwrap();
        assert!(matches!(catalog.link(MovieId(1)), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_movie_id_rejected() {
        let result = Catalog::load(vec![movie_record(1, "A"), movie_record(1, "B")], vec![]);
        assert!(matches!(result, Err(AppError::CatalogLoad(_))));
    }

    #[test]
    fn test_dangling_link_rejected() {
        let result = Catalog::load(vec![movie_record(1, "A")], vec![link_record(2, None)]);
        assert!(matches!(result, Err(AppError::CatalogLoad(_))));
    }

    #[test]
    fn test_duplicate_link_rejected() {
        let result = Catalog::load(
            vec![movie_record(1, "A")],
            vec![link_record(1, Some(5)), link_record(1, Some(6))],
        );
        assert!(matches!(result, Err(AppError::CatalogLoad(_))));
    }

    #[test]
    fn test_from_json_files() {
        let mut movies = tempfile::NamedTempFile::new().unwrap();
        let mut links = tempfile::NamedTempFile::new().unwrap();
        write!(
            movies,
            r#"[{{"movieId": "1", "title": "Toy Story (1995)", "genres": "Adventure|Animation"}}]"#
        )
        .unwrap();
        write!(links, r#"[{{"movieId": "1", "imdbId": "0114709", "tmdbId": "862"}}]"#).unwrap();

        let catalog = Catalog::from_json_files(movies.path(), links.path()).unwrap();
        assert_eq!(catalog.movie(MovieId(1)).unwrap().genres, vec!["Adventure", "Animation"]);
        assert_eq!(catalog.link(MovieId(1)).unwrap().tmdb_id, Some(862));
    }

    #[test]
    fn test_malformed_file_is_catalog_load_error() {
        let mut movies = tempfile::NamedTempFile::new().unwrap();
        let links = tempfile::NamedTempFile::new().unwrap();
        write!(movies, r#"[{{"title": "no id"}}]"#).unwrap();

        let result = Catalog::from_json_files(movies.path(), links.path());
        assert!(matches!(result, Err(AppError::CatalogLoad(_))));
    }

    #[test]
    fn test_missing_file_is_catalog_load_error() {
        let result = Catalog::from_json_files(
            Path::new("/nonexistent/movies.json"),
            Path::new("/nonexistent/links.json"),
        );
        assert!(matches!(result, Err(AppError::CatalogLoad(_))));
    }
}

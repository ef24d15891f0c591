mod link;
mod metadata;
mod movie;
mod rating;

pub use link::{Link, LinkRecord};
pub use metadata::{Image, MovieDetails};
pub use movie::{Movie, MovieId, MovieRecord};
pub use rating::{Rating, MAX_STARS};

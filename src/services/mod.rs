//! Third-party collaborators: place search and dish photos.

pub mod images;
pub mod places;

pub use images::{placeholder_for, ImageLookup, UnsplashImages, GENERIC_PLACEHOLDER};
pub use places::{GoongPlaces, PlaceLookup};

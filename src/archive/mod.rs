pub mod extractor;

pub use extractor::TripArchiveExtractor;

pub mod extractor;
pub mod jwt;
pub mod media;
pub mod request;
pub mod test_utils;
pub mod validation;

pub mod base62;
pub mod ip;
pub mod url_validator;

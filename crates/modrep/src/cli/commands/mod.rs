pub mod errors;
pub mod inspect;
pub mod reincidence;
pub mod summary;

pub mod fetch;
pub mod season;

pub mod store;
pub mod upstream;
pub mod web;

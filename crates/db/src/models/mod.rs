#![allow(clippy::useless_conversion)]

pub mod comment;
pub mod contributor;
pub mod issue;
pub mod project;
pub mod user;

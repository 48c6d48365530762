pub mod access;
pub mod auth;
pub mod issue;
pub mod project;
pub mod validation;

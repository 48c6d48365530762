pub mod auth;
pub mod comments;
pub mod contributors;
pub mod health;
pub mod issues;
pub mod projects;

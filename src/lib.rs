pub mod auth;
pub mod config;
pub mod corpus;
pub mod gateway;
pub mod session;
pub mod validate;

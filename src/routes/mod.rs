/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod blog;
pub mod contact;
pub mod extract;
pub mod health;
pub mod multipart;
pub mod project;
pub mod social_link;

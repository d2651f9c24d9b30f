// src/handlers/mod.rs

pub mod auth;
pub mod documents;
pub mod health;
pub mod mcq;
pub mod quizzes;
pub mod results;
pub mod upload;

// src/models/mod.rs

pub mod document;
pub mod question;
pub mod quiz_session;
pub mod result;
pub mod user;

// src/services/mod.rs

pub mod extraction;
pub mod llm;

// src/utils/mod.rs

pub mod codes;

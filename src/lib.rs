pub mod cli;
pub mod config;
pub mod generator;
pub mod node;
pub mod parser;
pub mod service;

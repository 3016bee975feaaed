//! CV ingestion: document decoding, heuristic and AI field extraction, and the
//! orchestrator that turns an upload into one canonical record.

pub mod ai;
pub mod assembler;
pub mod contact;
pub mod document;
pub mod education;
pub mod experience;
pub mod handlers;
pub mod heuristics;
pub mod pipeline;
pub mod projects;
pub mod prompts;
pub mod sections;
pub mod segment;
pub mod skills;
pub mod vocabulary;

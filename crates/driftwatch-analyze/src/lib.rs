//! Update analysis for local checkouts.
//!
//! Compares each checkout's `HEAD` against its upstream default branch on
//! GitHub, classifies the incoming commits through an advisory LLM (with a
//! deterministic fallback), and decides whether the update is safe to pull.
//!
//! - [`github`]: hosting API seam and the octocrab-backed client
//! - [`divergence`]: local/upstream head comparison
//! - [`llm`] and [`prompt`]: advisory service client, prompt and response parsing
//! - [`classify`]: risk classification with fallback
//! - [`decision`]: mapping of divergence and judgment to a status
//! - [`pipeline`]: bounded-concurrency orchestration
//! - [`report`] and [`script`]: presentation and the safe-update script

pub mod classify;
pub mod decision;
pub mod divergence;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod script;

#[cfg(test)]
mod testing;

//! Query routing for Cortex Assist.
//!
//! Classifies each question, drives the remote collaborators in
//! `cortex-client`, and assembles a [`Reply`] for a display surface.

pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod reply;
pub mod state;
pub mod summarizer;

pub use classifier::{IntentClassifier, KeywordClassifier, PolicyRule};
pub use dispatcher::{Dispatcher, MAX_MESSAGE_LENGTH};
pub use error::ChatError;
pub use reply::{Block, NoticeLevel, Reply};
pub use state::DispatchState;
pub use summarizer::SentenceSummarizer;

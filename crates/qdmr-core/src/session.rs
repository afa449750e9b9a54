//! An annotation session: one loaded question and its decomposition.

use tracing::info;

use crate::dataset::QuestionLookup;
use crate::question::{Question, QuestionId};
use crate::store::{DecompositionStore, ReferencePolicy, StoreError};
use crate::vocabulary::Vocabulary;

/// Errors surfaced by a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The dataset has no question with this id.
    #[error("question '{0}' not found")]
    QuestionNotFound(String),

    /// An operation needed a loaded question.
    #[error("no question loaded")]
    NotLoaded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// The question being annotated plus its decomposition.
#[derive(Debug, Clone)]
pub struct LoadedQuestion {
    pub id: QuestionId,
    pub question: Question,
    pub vocabulary: Vocabulary,
    pub store: DecompositionStore,
}

/// Session state. Starts unloaded; loading a question starts a fresh
/// decomposition with one empty step.
#[derive(Debug, Clone, Default)]
pub struct Session {
    policy: ReferencePolicy,
    loaded: Option<LoadedQuestion>,
}

impl Session {
    pub fn new(policy: ReferencePolicy) -> Self {
        Self {
            policy,
            loaded: None,
        }
    }

    /// Looks `id` up and, if found, makes it the session's question.
    ///
    /// An unknown id leaves the session exactly as it was.
    pub fn load_question<L>(&mut self, id: &QuestionId, lookup: &L) -> Result<&mut LoadedQuestion>
    where
        L: QuestionLookup + ?Sized,
    {
        let question = lookup
            .lookup(id)
            .cloned()
            .ok_or_else(|| SessionError::QuestionNotFound(id.to_string()))?;

        info!(id = %id, granular = id.is_granular(), "question loaded");
        let loaded = self.loaded.insert(LoadedQuestion {
            id: id.clone(),
            vocabulary: Vocabulary::new(&question.valid_tokens),
            question,
            store: DecompositionStore::with_policy(self.policy),
        });
        Ok(loaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn loaded(&self) -> Result<&LoadedQuestion> {
        self.loaded.as_ref().ok_or(SessionError::NotLoaded)
    }

    pub fn loaded_mut(&mut self) -> Result<&mut LoadedQuestion> {
        self.loaded.as_mut().ok_or(SessionError::NotLoaded)
    }

    pub fn store(&self) -> Result<&DecompositionStore> {
        self.loaded().map(|l| &l.store)
    }

    pub fn store_mut(&mut self) -> Result<&mut DecompositionStore> {
        self.loaded_mut().map(|l| &mut l.store)
    }

    /// Returns the submission code of the loaded decomposition.
    pub fn submission_code(&self) -> Result<String> {
        Ok(self.store()?.submission_code()?)
    }
}

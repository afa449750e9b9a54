//! [`DecompositionStore`] -- the single source of truth for a decomposition.
//!
//! The store owns the ordered step list and the arrays derived from it by the
//! resolver. Its whole mutation surface is [`add_step`], [`edit_step`],
//! [`delete_step`] and [`display_decomposition`]. Every operation either
//! applies completely or is refused with a [`StoreError`] and leaves the
//! store untouched.
//!
//! Invariant: step ids are exactly `1..=len()` in order, after every call.
//!
//! [`add_step`]: DecompositionStore::add_step
//! [`edit_step`]: DecompositionStore::edit_step
//! [`delete_step`]: DecompositionStore::delete_step
//! [`display_decomposition`]: DecompositionStore::display_decomposition

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolver;
use crate::step::{Step, StepId};
use crate::token::Token;

/// Separator between annotation strings in a submission code.
pub const SUBMISSION_SEPARATOR: &str = ";";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural violations refused by the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// `add_step` was given an id other than `len() + 1`.
    #[error("cannot add step {id}: the next step id is {expected}")]
    NonSequentialAdd {
        /// The id that was passed.
        id: StepId,
        /// The only id that can be appended.
        expected: StepId,
    },

    /// The id does not name an existing step.
    #[error("step {id} does not exist (the decomposition has {len} steps)")]
    StepOutOfRange {
        /// The id that was passed.
        id: StepId,
        /// Current number of steps.
        len: usize,
    },

    /// Deleting would leave the decomposition empty.
    #[error("cannot delete the only remaining step")]
    LastStep,

    /// A submission was requested while the preview is out of date.
    #[error("the preview is out of date; display the decomposition before submitting")]
    PreviewStale,
}

/// Convenience alias used throughout the store.
pub type Result<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Policy and state
// ---------------------------------------------------------------------------

/// What happens to back-references in other steps when a step is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencePolicy {
    /// Shift references above the deleted id down by one; references to the
    /// deleted step itself become `#0`, which never resolves.
    #[default]
    Renumber,
    /// Leave stored references untouched, so they may point one step off.
    Preserve,
}

impl ReferencePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Renumber => "renumber",
            Self::Preserve => "preserve",
        }
    }
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "renumber" => Ok(Self::Renumber),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!(
                "unknown reference policy '{other}' (expected 'renumber' or 'preserve')"
            )),
        }
    }
}

/// Whether the derived arrays reflect the current steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewState {
    /// Steps changed since the last display pass.
    Editing,
    /// The last display pass is current; submission is allowed.
    Previewed,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One line of a [`Preview`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub id: StepId,
    /// Resolved text, absent for steps without content.
    pub display: Option<String>,
    /// `"return ..."` form, absent for steps without content.
    pub annotation: Option<String>,
}

/// Immutable snapshot of the store's derived arrays, one line per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub state: PreviewState,
    pub lines: Vec<PreviewLine>,
}

impl Preview {
    /// Returns `true` if the snapshot was taken right after a display pass.
    pub fn is_valid(&self) -> bool {
        self.state == PreviewState::Previewed
    }

    /// Joins the annotation strings with `;`.
    ///
    /// Steps without content contribute an empty entry so positions line up
    /// with step ids.
    pub fn submission_code(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.annotation.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(SUBMISSION_SEPARATOR)
    }

    /// Returns the ids of lines whose display contains an unresolved reference.
    pub fn invalid_lines(&self) -> Vec<StepId> {
        self.lines
            .iter()
            .filter(|line| {
                line.display
                    .as_deref()
                    .is_some_and(|d| d.contains(resolver::INVALID_REFERENCE))
            })
            .map(|line| line.id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Ordered, densely numbered step list plus its resolved renderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionStore {
    steps: Vec<Step>,
    display_strings: Vec<Option<String>>,
    annotation_strings: Vec<Option<String>>,
    valid_preview: bool,
    policy: ReferencePolicy,
}

impl Default for DecompositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DecompositionStore {
    /// Creates a store holding a single empty step.
    pub fn new() -> Self {
        Self::with_policy(ReferencePolicy::default())
    }

    /// Creates a store holding a single empty step, using `policy` on delete.
    pub fn with_policy(policy: ReferencePolicy) -> Self {
        Self {
            steps: vec![Step::empty(1)],
            display_strings: Vec::new(),
            annotation_strings: Vec::new(),
            valid_preview: false,
            policy,
        }
    }

    // -- Mutations -----------------------------------------------------------

    /// Appends `step`, which must carry id `len() + 1`.
    pub fn add_step(&mut self, step: Step) -> Result<()> {
        let expected = self.next_step_id();
        if step.id != expected {
            return Err(StoreError::NonSequentialAdd {
                id: step.id,
                expected,
            });
        }

        debug!(id = step.id, empty = step.is_empty(), "adding step");
        self.steps.push(step);
        self.valid_preview = false;
        Ok(())
    }

    /// Replaces the step with the same id, leaving all others unchanged.
    pub fn edit_step(&mut self, step: Step) -> Result<()> {
        let index = self.index_of(step.id)?;

        debug!(id = step.id, "editing step");
        self.steps[index] = step;
        self.valid_preview = false;
        Ok(())
    }

    /// Removes step `id` and closes the gap by shifting later ids down.
    ///
    /// The last remaining step can never be deleted.
    pub fn delete_step(&mut self, id: StepId) -> Result<()> {
        if self.steps.len() <= 1 {
            return Err(StoreError::LastStep);
        }
        let index = self.index_of(id)?;

        debug!(id, policy = %self.policy, "deleting step");
        self.steps.remove(index);
        for step in &mut self.steps {
            if step.id > id {
                step.id -= 1;
            }
            if self.policy == ReferencePolicy::Renumber {
                if let Some(tokens) = step.value.as_mut() {
                    renumber_references(tokens, id);
                }
            }
        }
        self.valid_preview = false;
        Ok(())
    }

    /// Resolves every step in increasing id order and stores the results.
    ///
    /// Steps without content are skipped and leave absent entries. Afterwards
    /// both derived arrays hold exactly `len()` entries and the preview is
    /// valid.
    pub fn display_decomposition(&mut self) -> Preview {
        let (display, annotation): (Vec<_>, Vec<_>) = resolver::resolve_all(&self.steps)
            .into_iter()
            .map(|resolved| match resolved {
                Some(r) => (Some(r.display), Some(r.annotation)),
                None => (None, None),
            })
            .unzip();

        self.display_strings = display;
        self.annotation_strings = annotation;
        self.valid_preview = true;
        debug!(steps = self.steps.len(), "decomposition displayed");
        self.preview()
    }

    // -- Accessors -----------------------------------------------------------

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.index_of(id).ok().map(|index| &self.steps[index])
    }

    /// Number of steps (always at least one).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`: a decomposition keeps at least one step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The id the next [`add_step`](Self::add_step) must use.
    pub fn next_step_id(&self) -> StepId {
        self.steps.len() + 1
    }

    /// Display strings from the last display pass. Stale while editing.
    pub fn display_strings(&self) -> &[Option<String>] {
        &self.display_strings
    }

    /// Annotation strings from the last display pass. Stale while editing.
    pub fn annotation_strings(&self) -> &[Option<String>] {
        &self.annotation_strings
    }

    pub fn is_preview_valid(&self) -> bool {
        self.valid_preview
    }

    pub fn state(&self) -> PreviewState {
        if self.valid_preview {
            PreviewState::Previewed
        } else {
            PreviewState::Editing
        }
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    /// Snapshot of the derived arrays aligned with the current steps.
    ///
    /// While editing, the lines carry the renderings of the last display pass
    /// (if any) and the snapshot reports [`PreviewState::Editing`].
    pub fn preview(&self) -> Preview {
        let lines = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| PreviewLine {
                id: step.id,
                display: self.display_strings.get(index).cloned().flatten(),
                annotation: self.annotation_strings.get(index).cloned().flatten(),
            })
            .collect();
        Preview {
            state: self.state(),
            lines,
        }
    }

    /// Returns the submission code, available only while previewed.
    pub fn submission_code(&self) -> Result<String> {
        if !self.valid_preview {
            return Err(StoreError::PreviewStale);
        }
        Ok(self.preview().submission_code())
    }

    fn index_of(&self, id: StepId) -> Result<usize> {
        if id == 0 || id > self.steps.len() {
            return Err(StoreError::StepOutOfRange {
                id,
                len: self.steps.len(),
            });
        }
        Ok(id - 1)
    }
}

/// Rewrites references after step `deleted` was removed.
///
/// Only references whose target moves get a new `#n` label; saturated
/// targets (`StepId::MAX`) are left alone.
fn renumber_references(tokens: &mut [Token], deleted: StepId) {
    for token in tokens {
        let renumbered = match token.reference_target() {
            Some(target) if target == StepId::MAX => continue,
            Some(target) if target > deleted => target - 1,
            Some(target) if target == deleted => 0,
            _ => continue,
        };
        *token = Token::reference(renumbered);
    }
}

//! # Clip-Assembly Planner
//!
//! Matches a variable-length audio track to a sequence of video clips:
//! given the audio's duration and the candidates' probed durations, the
//! planner produces an ordered list of (clip, trim-length) pairs whose
//! trimmed lengths sum to at least the target.
//!
//! Candidates are cycled in order, wrapping around as often as needed,
//! so the plan can be longer than the candidate list. The cumulative
//! usable duration always lands in `[target, target + longest clip)`.

use std::path::PathBuf;

use crate::error::{PlanError, Result};

/// Durations at or below this threshold mark a clip as empty/invalid.
pub const TINY_SECS: f64 = 0.02;

/// A clip eligible for assembly, with its probed duration
#[derive(Debug, Clone)]
pub struct CandidateClip {
    pub path: PathBuf,

    /// Probed duration in seconds
    pub duration: f64,
}

impl CandidateClip {
    pub fn new<P: Into<PathBuf>>(path: P, duration: f64) -> Self {
        Self { path: path.into(), duration }
    }
}

/// One step of an assembly plan
///
/// `use_secs` is how much of the clip the target still needs; it equals
/// `full_secs` for every entry except possibly the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub path: PathBuf,

    /// The clip's full duration
    pub full_secs: f64,

    /// How much of the clip this plan step consumes
    pub use_secs: f64,
}

/// Ordered assembly plan; insertion order is playback order
#[derive(Debug, Clone)]
pub struct AssemblyPlan {
    pub entries: Vec<PlanEntry>,
}

impl AssemblyPlan {
    /// Total usable duration across all entries
    pub fn total_use_secs(&self) -> f64 {
        self.entries.iter().map(|e| e.use_secs).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the last entry is trimmed short of its full duration
    pub fn trims_last_entry(&self) -> bool {
        self.entries
            .last()
            .map(|e| e.use_secs < e.full_secs - TINY_SECS)
            .unwrap_or(false)
    }
}

/// Build a plan covering `target_secs` from the given candidates
///
/// Candidates at or below [`TINY_SECS`] are excluded up front; if that
/// leaves nothing, planning fails rather than producing an empty plan.
/// Shuffling, when wanted, is the caller's job before this call.
pub fn plan_assembly(target_secs: f64, candidates: &[CandidateClip]) -> Result<AssemblyPlan> {
    if target_secs <= 0.0 {
        return Err(PlanError::InvalidTarget { seconds: target_secs }.into());
    }

    let usable: Vec<&CandidateClip> = candidates
        .iter()
        .filter(|c| c.duration > TINY_SECS)
        .collect();

    if usable.is_empty() {
        return Err(PlanError::NoUsableInput.into());
    }

    let mut entries = Vec::new();
    let mut remaining = target_secs;
    let mut idx = 0usize;

    while remaining > TINY_SECS {
        let clip = usable[idx % usable.len()];
        let use_secs = clip.duration.min(remaining);

        entries.push(PlanEntry {
            path: clip.path.clone(),
            full_secs: clip.duration,
            use_secs,
        });

        remaining -= use_secs;
        idx += 1;
    }

    Ok(AssemblyPlan { entries })
}

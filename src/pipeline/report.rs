//! Run reports.
//!
//! A [`RunReport`] records what happened to every step and candidate of a
//! run. Skips are recorded here rather than raised as errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::state::StateResource;

/// Summary of one executor run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished (unset while running).
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether imports were only simulated.
    pub dry_run: bool,
    /// Where the state backup was written, if one was taken.
    pub backup_path: Option<PathBuf>,
    /// Per-step results, in plan order.
    pub steps: Vec<StepReport>,
}

/// Result of one plan step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Zero-based position in the plan.
    pub index: usize,
    /// The step's address template(s).
    pub import_name: String,
    /// Set when the whole step was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    /// One outcome per candidate.
    pub outcomes: Vec<ImportOutcome>,
}

/// What happened to one candidate resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The import command succeeded.
    Imported {
        /// Source resource address.
        source: String,
        /// Resolved target address.
        address: String,
        /// Import ID passed to the command.
        value: String,
    },
    /// The import was only described.
    DryRun {
        /// Source resource address.
        source: String,
        /// Resolved target address.
        address: String,
        /// Import ID that would be passed.
        value: String,
        /// The command that would run.
        line: String,
    },
    /// The candidate was not imported.
    Skipped {
        /// Source resource address.
        source: String,
        /// Why it was skipped.
        reason: SkipReason,
    },
}

/// Why a step or candidate was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// `for_each.resource` or `for_each.attribute` is empty.
    SelectorIncomplete,
    /// The resource name is not in `for_each.values`.
    NotInAllowList,
    /// The source attribute is absent.
    AttributeMissing {
        /// Attribute name.
        attribute: String,
    },
    /// The source attribute cannot be used as an import ID.
    UnsupportedAttributeType {
        /// Attribute name.
        attribute: String,
        /// JSON type that was found.
        found: &'static str,
    },
    /// The step condition did not hold.
    ConditionNotMet {
        /// Condition key path.
        key: String,
    },
    /// The target address is already in the state or was imported earlier
    /// in the run.
    AlreadyManaged {
        /// Resolved target address.
        address: String,
    },
}

impl RunReport {
    /// Starts a new report.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            backup_path: None,
            steps: Vec::new(),
        }
    }

    /// Marks the run as finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration in milliseconds, once finished.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// Iterates over every candidate outcome.
    pub fn outcomes(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.steps.iter().flat_map(|s| s.outcomes.iter())
    }

    /// Number of resources actually imported.
    #[must_use]
    pub fn imported_count(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, ImportOutcome::Imported { .. }))
            .count()
    }

    /// Number of simulated imports.
    #[must_use]
    pub fn dry_run_count(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, ImportOutcome::DryRun { .. }))
            .count()
    }

    /// Number of skipped candidates.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, ImportOutcome::Skipped { .. }))
            .count()
    }

    /// Number of steps skipped as a whole.
    #[must_use]
    pub fn skipped_step_count(&self) -> usize {
        self.steps.iter().filter(|s| s.skipped.is_some()).count()
    }

    /// The dry-run lines, in execution order.
    #[must_use]
    pub fn dry_run_lines(&self) -> Vec<&str> {
        self.outcomes()
            .filter_map(|o| match o {
                ImportOutcome::DryRun { line, .. } => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl StepReport {
    /// Creates an empty step report.
    #[must_use]
    pub fn new(index: usize, import_name: impl Into<String>) -> Self {
        Self {
            index,
            import_name: import_name.into(),
            skipped: None,
            outcomes: Vec::new(),
        }
    }
}

impl ImportOutcome {
    /// Creates a skipped outcome for `resource`.
    #[must_use]
    pub fn skipped(resource: &StateResource, reason: SkipReason) -> Self {
        Self::Skipped {
            source: resource.address.clone(),
            reason,
        }
    }

    /// Source resource address.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Imported { source, .. }
            | Self::DryRun { source, .. }
            | Self::Skipped { source, .. } => source,
        }
    }

    /// Resolved target address, if the candidate got that far.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Imported { address, .. } | Self::DryRun { address, .. } => Some(address),
            Self::Skipped { .. } => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectorIncomplete => write!(f, "for_each resource and attribute are required"),
            Self::NotInAllowList => write!(f, "not in for_each.values"),
            Self::AttributeMissing { attribute } => write!(f, "missing attribute: {attribute}"),
            Self::UnsupportedAttributeType { attribute, found } => {
                write!(f, "attribute {attribute} is a {found}, not a usable import ID")
            }
            Self::ConditionNotMet { key } => write!(f, "condition {key} not met"),
            Self::AlreadyManaged { address } => write!(f, "already managed as {address}"),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "{} import(s) planned (dry run)", self.dry_run_count())?;
        } else {
            write!(f, "{} resource(s) imported", self.imported_count())?;
        }
        write!(
            f,
            ", {} candidate(s) skipped across {} step(s)",
            self.skipped_count(),
            self.steps.len()
        )?;
        if self.skipped_step_count() > 0 {
            write!(f, " ({} step(s) skipped)", self.skipped_step_count())?;
        }
        Ok(())
    }
}

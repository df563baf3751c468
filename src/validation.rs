// ✅ Form Validator - Pre-submission checks over repeatable rows
//
// Runs on submit intent, before anything leaves the page. Reads rows, never
// changes them. Each rule set stops at the first violation in row order and
// reports exactly that one.

use crate::rows::{LocalId, RepeatableRowSet, ScheduleFields, Weekday};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// VIOLATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A lab row's trimmed name is empty
    LabNameRequired { row: LocalId },

    /// Two lab rows share the same trimmed name (case-sensitive)
    DuplicateLabName { row: LocalId, name: String },

    /// A schedule row is missing weekday, start or end
    IncompleteSchedule { row: LocalId },

    /// A schedule row starts at or after its end
    StartNotBeforeEnd { row: LocalId },

    /// Two schedule rows have the same weekday, start and end
    DuplicateSchedule { row: LocalId },

    /// Two schedule rows overlap on the same weekday (only under `OverlapPolicy::Reject`)
    OverlappingSchedule { row: LocalId, other: LocalId },
}

impl Violation {
    /// Row the operator has to fix
    pub fn row(&self) -> LocalId {
        match self {
            Violation::LabNameRequired { row }
            | Violation::DuplicateLabName { row, .. }
            | Violation::IncompleteSchedule { row }
            | Violation::StartNotBeforeEnd { row }
            | Violation::DuplicateSchedule { row }
            | Violation::OverlappingSchedule { row, .. } => *row,
        }
    }

    /// Short machine-friendly rule name
    pub fn rule_name(&self) -> &'static str {
        match self {
            Violation::LabNameRequired { .. } => "lab_name_required",
            Violation::DuplicateLabName { .. } => "duplicate_lab_name",
            Violation::IncompleteSchedule { .. } => "incomplete_schedule",
            Violation::StartNotBeforeEnd { .. } => "start_not_before_end",
            Violation::DuplicateSchedule { .. } => "duplicate_schedule",
            Violation::OverlappingSchedule { .. } => "overlapping_schedule",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::LabNameRequired { .. } => write!(f, "lab name required"),
            Violation::DuplicateLabName { .. } => write!(f, "duplicate lab name"),
            Violation::IncompleteSchedule { .. } => write!(f, "incomplete schedule entry"),
            Violation::StartNotBeforeEnd { .. } => write!(f, "start must precede end"),
            Violation::DuplicateSchedule { .. } => write!(f, "duplicate schedule entry"),
            Violation::OverlappingSchedule { .. } => write!(f, "overlapping schedule entries"),
        }
    }
}

impl std::error::Error for Violation {}

// ============================================================================
// OVERLAP POLICY
// ============================================================================

/// Whether distinct-but-overlapping schedule slots are rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Only exact duplicates are rejected
    #[default]
    Allow,

    /// Also reject same-weekday slots whose intervals intersect
    Reject,
}

/// A fully filled-in schedule slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    /// `None` unless weekday, start and end are all set
    pub fn from_fields(fields: &ScheduleFields) -> Option<Slot> {
        Some(Slot {
            weekday: fields.weekday?,
            start: fields.start?,
            end: fields.end?,
        })
    }
}

/// Same weekday and half-open intervals intersect
///
/// Back-to-back slots (`09:00-10:00`, `10:00-11:00`) do not overlap.
pub fn intervals_overlap(a: &Slot, b: &Slot) -> bool {
    a.weekday == b.weekday && a.start < b.end && b.start < a.end
}

// ============================================================================
// FORM VALIDATOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    pub overlap_policy: OverlapPolicy,
}

impl FormValidator {
    pub fn new(overlap_policy: OverlapPolicy) -> Self {
        FormValidator { overlap_policy }
    }

    /// Lab rules: non-empty trimmed name, then no repeated trimmed name
    pub fn validate_labs(&self, labs: &RepeatableRowSet) -> Result<(), Violation> {
        let mut seen: HashSet<&str> = HashSet::new();

        for row in labs.rows() {
            let Some(lab) = row.lab() else { continue };
            let name = lab.name.trim();

            if name.is_empty() {
                return Err(Violation::LabNameRequired { row: row.local_id });
            }
            if !seen.insert(name) {
                return Err(Violation::DuplicateLabName {
                    row: row.local_id,
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Schedule rules: complete, start before end, no exact duplicate,
    /// and (if enabled) no overlap
    pub fn validate_schedules(&self, schedules: &RepeatableRowSet) -> Result<(), Violation> {
        let mut seen: Vec<(LocalId, Slot)> = Vec::new();
        let mut exact: HashSet<Slot> = HashSet::new();

        for row in schedules.rows() {
            let Some(fields) = row.schedule() else { continue };
            let Some(slot) = Slot::from_fields(fields) else {
                return Err(Violation::IncompleteSchedule { row: row.local_id });
            };

            if slot.start >= slot.end {
                return Err(Violation::StartNotBeforeEnd { row: row.local_id });
            }
            if !exact.insert(slot) {
                return Err(Violation::DuplicateSchedule { row: row.local_id });
            }
            if self.overlap_policy == OverlapPolicy::Reject {
                if let Some((other, _)) = seen.iter().find(|(_, s)| intervals_overlap(s, &slot)) {
                    return Err(Violation::OverlappingSchedule {
                        row: row.local_id,
                        other: *other,
                    });
                }
            }
            seen.push((row.local_id, slot));
        }

        Ok(())
    }

    /// Labs first, then schedules; the first violation wins
    ///
    /// A failing lab set means schedules are not looked at.
    pub fn validate(
        &self,
        labs: &RepeatableRowSet,
        schedules: &RepeatableRowSet,
    ) -> Result<(), Violation> {
        self.validate_labs(labs)?;
        self.validate_schedules(schedules)
    }
}

// ============================================================================
// TESTS
// ============================================================================

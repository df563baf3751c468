// 📝 Form Session - One open course/user form and its submit boundary
//
// Owns every component of the form. Nothing here outlives the session:
// dropping it is the equivalent of navigating away.

use crate::config::FormConfig;
use crate::entity::{Entity, EntityId};
use crate::picker::{HeadlessPicker, Picker};
use crate::rows::{
    FileRef, FileRejected, LabFields, LocalId, LocalIdAllocator, RepeatableRowSet, RowEvent,
    RowFields, RowKind, ScheduleFields,
};
use crate::selection::{Association, SelectionSynchronizer};
use crate::validation::{FormValidator, Violation};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// PAYLOAD
// ============================================================================

/// Ordered name/value pairs, exactly as the browser would post them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPayload {
    pub fields: Vec<(String, String)>,
}

impl FormPayload {
    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push((name.to_string(), value.into()));
    }

    /// All values posted under one field name, in order
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// `application/x-www-form-urlencoded` body
    pub fn to_urlencoded(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Result of a submit intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation passed; this is what goes to the server
    Proceed(FormPayload),

    /// Submission cancelled; the operator stays on the form with all data intact
    Cancelled(Violation),
}

impl SubmitOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SubmitOutcome::Cancelled(_))
    }
}

// ============================================================================
// FORM SESSION
// ============================================================================

pub struct FormSession<P: Picker = HeadlessPicker> {
    /// Identity of this open form instance
    id: Uuid,

    ids: LocalIdAllocator,
    labs: RepeatableRowSet,
    schedules: RepeatableRowSet,
    enrollment: Option<SelectionSynchronizer<P>>,
    validator: FormValidator,
}

impl<P: Picker> FormSession<P> {
    /// Open an empty form
    pub fn new(config: &FormConfig) -> Self {
        FormSession {
            id: Uuid::new_v4(),
            ids: LocalIdAllocator::starting_at(config.first_local_id),
            labs: RepeatableRowSet::labs(
                config.no_file_placeholder.clone(),
                config.accepted_file_extensions.clone(),
            ),
            schedules: RepeatableRowSet::schedules(),
            enrollment: None,
            validator: FormValidator::new(config.overlap_policy),
        }
    }

    /// Attach the enrollment picker ⇄ table for this form
    pub fn with_enrollment(mut self, enrollment: SelectionSynchronizer<P>) -> Self {
        self.enrollment = Some(enrollment);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn set_for(&self, kind: RowKind) -> &RepeatableRowSet {
        match kind {
            RowKind::Lab => &self.labs,
            RowKind::Schedule => &self.schedules,
        }
    }

    /// Row set plus the shared allocator, borrowed together
    fn set_and_ids(&mut self, kind: RowKind) -> (&mut RepeatableRowSet, &mut LocalIdAllocator) {
        match kind {
            RowKind::Lab => (&mut self.labs, &mut self.ids),
            RowKind::Schedule => (&mut self.schedules, &mut self.ids),
        }
    }

    /// "Add" click for a row kind
    pub fn add_row(&mut self, kind: RowKind) -> LocalId {
        let (set, ids) = self.set_and_ids(kind);
        set.add_row(ids)
    }

    /// Wire a server-rendered row into the matching set
    pub fn register_existing(
        &mut self,
        server_id: Option<String>,
        fields: RowFields,
    ) -> Option<LocalId> {
        let (set, ids) = self.set_and_ids(fields.kind());
        set.register_existing(ids, server_id, fields)
    }

    /// Remove click; idempotent
    pub fn remove_row(&mut self, kind: RowKind, local_id: LocalId) -> bool {
        self.set_and_ids(kind).0.remove_row(local_id)
    }

    /// Forward an event delegated from a row container
    pub fn dispatch_row_event(
        &mut self,
        kind: RowKind,
        event: RowEvent,
    ) -> Result<bool, FileRejected> {
        self.set_and_ids(kind).0.dispatch(event)
    }

    pub fn rows(&self, kind: RowKind) -> &RepeatableRowSet {
        self.set_for(kind)
    }

    pub fn rows_mut(&mut self, kind: RowKind) -> &mut RepeatableRowSet {
        self.set_and_ids(kind).0
    }

    pub fn enrollment(&self) -> Option<&SelectionSynchronizer<P>> {
        self.enrollment.as_ref()
    }

    pub fn enrollment_mut(&mut self) -> Option<&mut SelectionSynchronizer<P>> {
        self.enrollment.as_mut()
    }

    pub fn validator(&self) -> &FormValidator {
        &self.validator
    }

    /// Run the validator without submitting
    pub fn validate(&self) -> Result<(), Violation> {
        self.validator.validate(&self.labs, &self.schedules)
    }

    /// Submit intent: validate, then build the payload or cancel
    pub fn submit(&self) -> SubmitOutcome {
        match self.validate() {
            Ok(()) => {
                let payload = self.payload();
                info!(session = %self.id, fields = payload.fields.len(), "form submitted");
                SubmitOutcome::Proceed(payload)
            }
            Err(violation) => {
                info!(
                    session = %self.id,
                    rule = violation.rule_name(),
                    row = %violation.row(),
                    "submission cancelled: {}",
                    violation
                );
                SubmitOutcome::Cancelled(violation)
            }
        }
    }

    /// Field pairs following the row template contract
    ///
    /// Rows not yet stored on the server post an empty id.
    pub fn payload(&self) -> FormPayload {
        let mut payload = FormPayload::default();

        for row in self.labs.rows() {
            let Some(lab) = row.lab() else { continue };
            payload.push("lab-ids[]", row.server_id.clone().unwrap_or_default());
            payload.push("labs[]", lab.name.trim());
            payload.push("lab-file-names[]", lab.file_label.clone());
            payload.push(
                "lab-files[]",
                lab.file.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
            );
        }

        for row in self.schedules.rows() {
            let Some(schedule) = row.schedule() else { continue };
            payload.push("horario-ids[]", row.server_id.clone().unwrap_or_default());
            payload.push("dias[]", schedule.weekday.map(|d| d.as_str()).unwrap_or_default());
            payload.push("horas-inicio[]", format_time(schedule.start));
            payload.push("horas-fin[]", format_time(schedule.end));
        }

        if let Some(enrollment) = &self.enrollment {
            payload.fields.extend(enrollment.form_fields());
        }

        payload
    }
}

fn format_time(time: Option<chrono::NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
}

// ============================================================================
// SNAPSHOT (serialized form state)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file: Option<FileRef>,
}

/// Schedule values as typed in the form (`"mon"`, `"09:00"`, `""` = unset)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub weekday: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentSnapshot {
    pub association: Association,
    pub candidates: Vec<Entity>,
    #[serde(default)]
    pub selected: Vec<EntityId>,
}

/// Form state as the server would render it on load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSnapshot {
    #[serde(default)]
    pub labs: Vec<LabSnapshot>,
    #[serde(default)]
    pub schedules: Vec<ScheduleSnapshot>,
    #[serde(default)]
    pub enrollment: Option<EnrollmentSnapshot>,
}

impl FormSnapshot {
    pub fn from_file<Q: AsRef<Path>>(path: Q) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read form snapshot: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse form snapshot JSON")
    }

    /// Open a session with every snapshot row registered as pre-existing
    pub fn open<P: Picker>(&self, config: &FormConfig, picker: P) -> Result<FormSession<P>> {
        let mut session = FormSession::new(config);

        for lab in &self.labs {
            session.register_existing(
                lab.id.clone(),
                RowFields::Lab(LabFields {
                    name: lab.name.clone(),
                    file: lab.file.clone(),
                    file_label: String::new(),
                }),
            );
        }

        for (position, schedule) in self.schedules.iter().enumerate() {
            let fields =
                ScheduleFields::from_form_values(&schedule.weekday, &schedule.start, &schedule.end)
                    .with_context(|| format!("Invalid schedule entry #{}", position + 1))?;
            session.register_existing(schedule.id.clone(), RowFields::Schedule(fields));
        }

        if let Some(enrollment) = &self.enrollment {
            session = session.with_enrollment(SelectionSynchronizer::new(
                enrollment.association,
                enrollment.candidates.clone(),
                &enrollment.selected,
                picker,
            ));
        }

        Ok(session)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::parse_time_of_day;
    use crate::rows::Weekday;
    use crate::validation::OverlapPolicy;

    fn create_session() -> FormSession {
        FormSession::new(&FormConfig::default())
    }

    fn students() -> Vec<Entity> {
        vec![Entity::new("1", "Zapata, Ana"), Entity::new("2", "Alvarez, Ben")]
    }

    #[test]
    fn test_ids_monotonic_across_kinds_and_removals() {
        let mut session = create_session();

        let a = session.add_row(RowKind::Lab);
        let b = session.add_row(RowKind::Schedule);
        session.remove_row(RowKind::Lab, a);
        session.remove_row(RowKind::Schedule, b);
        let c = session.add_row(RowKind::Lab);

        assert!(a < b && b < c);
    }

    #[test]
    fn test_submit_cancelled_keeps_data() {
        let mut session = create_session();
        let first = session.add_row(RowKind::Lab);
        let second = session.add_row(RowKind::Lab);
        session.rows_mut(RowKind::Lab).set_lab_name(first, "Redes");
        session.rows_mut(RowKind::Lab).set_lab_name(second, "Redes");

        let outcome = session.submit();

        assert!(outcome.is_cancelled());
        assert_eq!(
            outcome,
            SubmitOutcome::Cancelled(Violation::DuplicateLabName {
                row: second,
                name: "Redes".to_string()
            })
        );
        assert_eq!(session.rows(RowKind::Lab).len(), 2);
    }

    #[test]
    fn test_submit_payload_order_and_empty_ids() {
        let mut session = create_session();
        session.register_existing(
            Some("7".to_string()),
            RowFields::Lab(LabFields {
                name: "Redes".to_string(),
                file: None,
                file_label: String::new(),
            }),
        );
        let lab = session.add_row(RowKind::Lab);
        session.rows_mut(RowKind::Lab).set_lab_name(lab, " Bases de Datos ");
        session
            .dispatch_row_event(
                RowKind::Lab,
                RowEvent::FileSelected {
                    local_id: lab,
                    file: Some(FileRef::new("bd.pdf")),
                },
            )
            .unwrap();

        let slot = session.add_row(RowKind::Schedule);
        session.rows_mut(RowKind::Schedule).set_schedule(
            slot,
            ScheduleFields::new(
                Weekday::Mon,
                parse_time_of_day("09:00").unwrap(),
                parse_time_of_day("10:30").unwrap(),
            ),
        );

        let SubmitOutcome::Proceed(payload) = session.submit() else {
            panic!("expected submission to proceed");
        };

        assert_eq!(payload.values("lab-ids[]"), vec!["7", ""]);
        assert_eq!(payload.values("labs[]"), vec!["Redes", "Bases de Datos"]);
        assert_eq!(payload.values("lab-file-names[]"), vec!["No file selected", "bd.pdf"]);
        assert_eq!(payload.values("lab-files[]"), vec!["", "bd.pdf"]);
        assert_eq!(payload.values("horario-ids[]"), vec![""]);
        assert_eq!(payload.values("dias[]"), vec!["mon"]);
        assert_eq!(payload.values("horas-inicio[]"), vec!["09:00"]);
        assert_eq!(payload.values("horas-fin[]"), vec!["10:30"]);
    }

    #[test]
    fn test_payload_includes_enrollment() {
        let sync = SelectionSynchronizer::new(
            Association::StudentsOfCourse,
            students(),
            &[EntityId::from("2")],
            HeadlessPicker::new(),
        );
        let mut session = create_session().with_enrollment(sync);
        session.enrollment_mut().unwrap().select(&EntityId::from("1"));

        let payload = session.payload();
        assert_eq!(payload.values("alumnos-ids[]"), vec!["2", "1"]);
    }

    #[test]
    fn test_urlencoded_body() {
        let payload = FormPayload {
            fields: vec![
                ("labs[]".to_string(), "Bases de Datos".to_string()),
                ("dias[]".to_string(), "mon".to_string()),
            ],
        };

        assert_eq!(payload.to_urlencoded(), "labs%5B%5D=Bases%20de%20Datos&dias%5B%5D=mon");
    }

    #[test]
    fn test_snapshot_open_and_validate() {
        let json = r#"{
            "labs": [{"id": "3", "name": "Redes", "file": {"name": "redes.pdf"}}],
            "schedules": [
                {"id": "1", "weekday": "mon", "start": "09:00", "end": "10:00"},
                {"weekday": "mon", "start": "09:30", "end": "10:30"}
            ],
            "enrollment": {
                "association": "courses_of_student",
                "candidates": [{"id": "10", "label": "Redes"}, {"id": "11", "label": "Algoritmos"}],
                "selected": ["10"]
            }
        }"#;
        let snapshot: FormSnapshot = serde_json::from_str(json).unwrap();

        let session = snapshot.open(&FormConfig::default(), HeadlessPicker::new()).unwrap();
        assert_eq!(session.validate(), Ok(()));
        assert_eq!(session.enrollment().unwrap().pool().labels(), vec!["Algoritmos"]);

        let strict = FormConfig {
            overlap_policy: OverlapPolicy::Reject,
            ..FormConfig::default()
        };
        let session = snapshot.open(&strict, HeadlessPicker::new()).unwrap();
        assert!(matches!(session.validate(), Err(Violation::OverlappingSchedule { .. })));
    }

    #[test]
    fn test_demo_snapshot_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/course_form.json");
        let snapshot = FormSnapshot::from_file(&path).unwrap();

        let session = snapshot.open(&FormConfig::default(), HeadlessPicker::new()).unwrap();
        let SubmitOutcome::Proceed(payload) = session.submit() else {
            panic!("demo form should validate under the default config");
        };
        assert_eq!(payload.values("labs[]"), vec!["Redes", "Bases de Datos"]);
        assert_eq!(payload.values("alumnos-ids[]"), vec!["2"]);
    }

    #[test]
    fn test_snapshot_with_bad_time_is_error() {
        let snapshot = FormSnapshot {
            schedules: vec![ScheduleSnapshot {
                id: None,
                weekday: "mon".to_string(),
                start: "nine".to_string(),
                end: "10:00".to_string(),
            }],
            ..FormSnapshot::default()
        };

        assert!(snapshot.open(&FormConfig::default(), HeadlessPicker::new()).is_err());
    }

    #[test]
    fn test_row_events_only_reach_their_own_kind() {
        let mut session = create_session();
        let lab = session.add_row(RowKind::Lab);
        let slot = session.add_row(RowKind::Schedule);

        let file_on_schedule = session.dispatch_row_event(
            RowKind::Schedule,
            RowEvent::FileSelected {
                local_id: slot,
                file: Some(FileRef::new("guia.pdf")),
            },
        );
        let lab_removed_via_schedules =
            session.dispatch_row_event(RowKind::Schedule, RowEvent::Remove { local_id: lab });

        assert_eq!(file_on_schedule, Ok(false));
        assert_eq!(lab_removed_via_schedules, Ok(false));
        assert!(session.rows(RowKind::Lab).get(lab).is_some());
        assert_eq!(session.rows(RowKind::Schedule).len(), 1);
    }

    #[test]
    fn test_first_local_id_near_max_is_capped() {
        let config = FormConfig {
            first_local_id: u64::MAX,
            ..FormConfig::default()
        };
        let mut session: FormSession = FormSession::new(&config);

        let a = session.add_row(RowKind::Lab);
        let b = session.add_row(RowKind::Schedule);

        assert!(a < b);
    }
}

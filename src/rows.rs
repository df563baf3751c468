// 🧩 Repeatable Rows - Lab entries and weekly schedule slots
//
// Rows are created by "add" clicks (or discovered at load, when the server
// already rendered them) and removed by their own remove button. Each row
// gets a LocalId that is never handed out twice in the same form session.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// LOCAL IDS
// ============================================================================

/// Page-session-scoped row identifier, distinct from any server id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(u64);

impl LocalId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Highest first LocalId a session may start from
///
/// Leaves 2^63 ids of headroom, so `allocate` cannot run past `u64::MAX`.
pub const MAX_FIRST_LOCAL_ID: u64 = u64::MAX / 2;

/// Monotonic LocalId source shared by every row set of one form
#[derive(Debug, Clone)]
pub struct LocalIdAllocator {
    next: u64,
}

impl LocalIdAllocator {
    /// Start at `first`, capped at `MAX_FIRST_LOCAL_ID`
    pub fn starting_at(first: u64) -> Self {
        LocalIdAllocator {
            next: first.min(MAX_FIRST_LOCAL_ID),
        }
    }

    /// Hand out the next id; never repeats, removals do not give ids back
    pub fn allocate(&mut self) -> LocalId {
        let id = LocalId(self.next);
        self.next += 1;
        id
    }
}

impl Default for LocalIdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

// ============================================================================
// FIELD TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Day of the week, as stored by the server (`mon`..`sun`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }

    /// Label shown in the weekday select
    pub fn display_name(&self) -> &'static str {
        match self {
            Weekday::Mon => "Lunes",
            Weekday::Tue => "Martes",
            Weekday::Wed => "Miércoles",
            Weekday::Thu => "Jueves",
            Weekday::Fri => "Viernes",
            Weekday::Sat => "Sábado",
            Weekday::Sun => "Domingo",
        }
    }
}

impl FromStr for Weekday {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Weekday::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| FieldError {
                field: "weekday".to_string(),
                message: format!("unknown weekday '{}'", s),
            })
    }
}

/// Parse a time-of-day from an `<input type="time">` value
///
/// Accepts `HH:MM` and `HH:MM:SS`. Dates never take part in the comparison.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, FieldError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| FieldError {
            field: "time".to_string(),
            message: format!("invalid time '{}', expected HH:MM", value),
        })
}

/// Metadata of a chosen file; content is never read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,

    #[serde(default)]
    pub size_bytes: u64,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        FileRef {
            name: name.into(),
            size_bytes: 0,
        }
    }

    /// Lowercased extension with its leading dot, e.g. `.pdf`
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_lowercase()))
    }
}

/// The chosen file's type is not in the accept list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejected {
    pub file_name: String,
    pub accepted: Vec<String>,
}

impl fmt::Display for FileRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file '{}' not accepted (allowed: {})",
            self.file_name,
            self.accepted.join(", ")
        )
    }
}

impl std::error::Error for FileRejected {}

// ============================================================================
// ROW FIELDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabFields {
    pub name: String,

    #[serde(default)]
    pub file: Option<FileRef>,

    /// Read-only mirror of the file name, or the placeholder
    #[serde(default)]
    pub file_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFields {
    #[serde(default)]
    pub weekday: Option<Weekday>,

    #[serde(default)]
    pub start: Option<NaiveTime>,

    #[serde(default)]
    pub end: Option<NaiveTime>,
}

impl ScheduleFields {
    pub fn new(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        ScheduleFields {
            weekday: Some(weekday),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Build from raw form values; empty strings mean "not set"
    pub fn from_form_values(weekday: &str, start: &str, end: &str) -> Result<Self, FieldError> {
        fn optional<T>(
            raw: &str,
            parse: impl Fn(&str) -> Result<T, FieldError>,
        ) -> Result<Option<T>, FieldError> {
            if raw.trim().is_empty() {
                Ok(None)
            } else {
                parse(raw).map(Some)
            }
        }

        Ok(ScheduleFields {
            weekday: optional(weekday, |s| s.parse::<Weekday>())?,
            start: optional(start, parse_time_of_day)?,
            end: optional(end, parse_time_of_day)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Lab,
    Schedule,
}

impl RowKind {
    /// Prefix of the row's DOM id
    pub fn dom_prefix(&self) -> &'static str {
        match self {
            RowKind::Lab => "lab",
            RowKind::Schedule => "schedule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RowFields {
    Lab(LabFields),
    Schedule(ScheduleFields),
}

impl RowFields {
    pub fn kind(&self) -> RowKind {
        match self {
            RowFields::Lab(_) => RowKind::Lab,
            RowFields::Schedule(_) => RowKind::Schedule,
        }
    }
}

// ============================================================================
// REPEATABLE ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatableRow {
    pub local_id: LocalId,

    /// Server-assigned id; `None` until the server stores the row
    pub server_id: Option<String>,

    pub fields: RowFields,
}

impl RepeatableRow {
    /// `data-local-id`-backed DOM id, e.g. `lab-17`
    pub fn dom_id(&self) -> String {
        format!("{}-{}", self.fields.kind().dom_prefix(), self.local_id)
    }

    /// Id of the lab row's file input, e.g. `file-17`
    pub fn file_input_id(&self) -> Option<String> {
        match self.fields {
            RowFields::Lab(_) => Some(format!("file-{}", self.local_id)),
            RowFields::Schedule(_) => None,
        }
    }

    pub fn lab(&self) -> Option<&LabFields> {
        match &self.fields {
            RowFields::Lab(lab) => Some(lab),
            RowFields::Schedule(_) => None,
        }
    }

    pub fn lab_mut(&mut self) -> Option<&mut LabFields> {
        match &mut self.fields {
            RowFields::Lab(lab) => Some(lab),
            RowFields::Schedule(_) => None,
        }
    }

    pub fn schedule(&self) -> Option<&ScheduleFields> {
        match &self.fields {
            RowFields::Schedule(schedule) => Some(schedule),
            RowFields::Lab(_) => None,
        }
    }

    pub fn schedule_mut(&mut self) -> Option<&mut ScheduleFields> {
        match &mut self.fields {
            RowFields::Schedule(schedule) => Some(schedule),
            RowFields::Lab(_) => None,
        }
    }
}

/// Events delegated from a row container, keyed by `data-local-id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEvent {
    Remove { local_id: LocalId },
    FileSelected { local_id: LocalId, file: Option<FileRef> },
}

// ============================================================================
// REPEATABLE ROW SET
// ============================================================================

/// Ordered, append-only-growing rows of one kind
#[derive(Debug, Clone)]
pub struct RepeatableRowSet {
    kind: RowKind,
    rows: Vec<RepeatableRow>,

    /// Shown in the lab file label when no file is chosen
    no_file_placeholder: String,

    /// Extensions (with leading dot) accepted by the lab file input
    accepted_extensions: Vec<String>,
}

impl RepeatableRowSet {
    /// Lab rows: file label placeholder and accepted file extensions
    pub fn labs(no_file_placeholder: impl Into<String>, accepted_extensions: Vec<String>) -> Self {
        RepeatableRowSet {
            kind: RowKind::Lab,
            rows: Vec::new(),
            no_file_placeholder: no_file_placeholder.into(),
            accepted_extensions: accepted_extensions
                .into_iter()
                .map(|ext| normalize_extension(&ext))
                .collect(),
        }
    }

    /// Schedule rows carry no file, so they need no file settings
    pub fn schedules() -> Self {
        RepeatableRowSet {
            kind: RowKind::Schedule,
            rows: Vec::new(),
            no_file_placeholder: String::new(),
            accepted_extensions: Vec::new(),
        }
    }

    fn default_fields(&self) -> RowFields {
        match self.kind {
            RowKind::Lab => RowFields::Lab(LabFields {
                name: String::new(),
                file: None,
                file_label: self.no_file_placeholder.clone(),
            }),
            RowKind::Schedule => RowFields::Schedule(ScheduleFields::default()),
        }
    }

    /// Append an empty row with a fresh LocalId
    pub fn add_row(&mut self, ids: &mut LocalIdAllocator) -> LocalId {
        let fields = self.default_fields();
        self.push(ids.allocate(), None, fields)
    }

    /// Register a row the server already rendered
    ///
    /// Returns `None` when the fields belong to the other row kind.
    pub fn register_existing(
        &mut self,
        ids: &mut LocalIdAllocator,
        server_id: Option<String>,
        mut fields: RowFields,
    ) -> Option<LocalId> {
        if fields.kind() != self.kind {
            debug!(kind = ?self.kind, "ignoring row of the wrong kind");
            return None;
        }
        if let RowFields::Lab(lab) = &mut fields {
            lab.file_label = match &lab.file {
                Some(file) => file.name.clone(),
                None if lab.file_label.is_empty() => self.no_file_placeholder.clone(),
                None => lab.file_label.clone(),
            };
        }
        let server_id = server_id.filter(|id| !id.trim().is_empty());
        Some(self.push(ids.allocate(), server_id, fields))
    }

    fn push(&mut self, local_id: LocalId, server_id: Option<String>, fields: RowFields) -> LocalId {
        self.rows.push(RepeatableRow {
            local_id,
            server_id,
            fields,
        });
        local_id
    }

    /// Remove a row; `false` if it was already gone
    pub fn remove_row(&mut self, local_id: LocalId) -> bool {
        match self.rows.iter().position(|r| r.local_id == local_id) {
            Some(position) => {
                self.rows.remove(position);
                true
            }
            None => {
                debug!(%local_id, "remove ignored: row not found");
                false
            }
        }
    }

    /// Mirror a chosen file into the lab row, or reset to the placeholder
    ///
    /// Events for rows that are gone (or are not lab rows) are ignored
    /// before the file type is looked at.
    pub fn select_file(
        &mut self,
        local_id: LocalId,
        file: Option<FileRef>,
    ) -> Result<bool, FileRejected> {
        if self.get(local_id).and_then(|r| r.lab()).is_none() {
            debug!(%local_id, "file selection ignored: no lab row");
            return Ok(false);
        }

        if let Some(file) = &file {
            if !self.accepts(file) {
                return Err(FileRejected {
                    file_name: file.name.clone(),
                    accepted: self.accepted_extensions.clone(),
                });
            }
        }

        let placeholder = self.no_file_placeholder.clone();
        let Some(lab) = self.get_mut(local_id).and_then(|r| r.lab_mut()) else {
            return Ok(false);
        };

        lab.file_label = file.as_ref().map(|f| f.name.clone()).unwrap_or(placeholder);
        lab.file = file;
        Ok(true)
    }

    /// Empty accept list takes anything; otherwise the extension must be listed
    fn accepts(&self, file: &FileRef) -> bool {
        if self.accepted_extensions.is_empty() {
            return true;
        }
        file.extension()
            .map(|ext| self.accepted_extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Dispatch an event delegated from the row container
    pub fn dispatch(&mut self, event: RowEvent) -> Result<bool, FileRejected> {
        match event {
            RowEvent::Remove { local_id } => Ok(self.remove_row(local_id)),
            RowEvent::FileSelected { local_id, file } => self.select_file(local_id, file),
        }
    }

    pub fn get(&self, local_id: LocalId) -> Option<&RepeatableRow> {
        self.rows.iter().find(|r| r.local_id == local_id)
    }

    pub fn get_mut(&mut self, local_id: LocalId) -> Option<&mut RepeatableRow> {
        self.rows.iter_mut().find(|r| r.local_id == local_id)
    }

    /// Set a lab row's name; `false` if there is no such lab row
    pub fn set_lab_name(&mut self, local_id: LocalId, name: impl Into<String>) -> bool {
        match self.get_mut(local_id).and_then(|r| r.lab_mut()) {
            Some(lab) => {
                lab.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Replace a schedule row's fields; `false` if there is no such row
    pub fn set_schedule(&mut self, local_id: LocalId, fields: ScheduleFields) -> bool {
        match self.get_mut(local_id).and_then(|r| r.schedule_mut()) {
            Some(schedule) => {
                *schedule = fields;
                true
            }
            None => false,
        }
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[RepeatableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Enrollment Forms - Core Library
// Form engine for course/user editing: enrollment picker ⇄ table,
// repeatable lab and schedule rows, and pre-submission validation.

pub mod entity;
pub mod collation;
pub mod picker;
pub mod option_pool;
pub mod selection;
pub mod rows;
pub mod validation;
pub mod config;
pub mod session;
pub mod roster;

// Re-export commonly used types
pub use entity::{Entity, EntityId, load_candidates_csv, load_candidates_json};
pub use collation::compare_labels;
pub use picker::{HeadlessPicker, Picker, PickerEvent};
pub use option_pool::OptionPool;
pub use selection::{Association, SelectionRow, SelectionSynchronizer, SelectionTable, TableEvent};
pub use rows::{
    FieldError, FileRef, FileRejected, LabFields, LocalId, LocalIdAllocator, RepeatableRow,
    RepeatableRowSet, RowEvent, RowFields, RowKind, ScheduleFields, Weekday, MAX_FIRST_LOCAL_ID,
    parse_time_of_day,
};
pub use validation::{FormValidator, OverlapPolicy, Slot, Violation, intervals_overlap};
pub use config::FormConfig;
pub use session::{FormPayload, FormSession, FormSnapshot, SubmitOutcome};
pub use roster::{Role, RosterFilter, User, load_users_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

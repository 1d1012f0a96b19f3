pub mod conflicts;
pub mod drag;
pub mod placement;
pub mod schedule;
pub mod timeline;
pub mod view_state;
pub mod zoom;

pub use drag::{DragState, DropOutcome, RescheduleRequest};
pub use schedule::{Conflict, LineFilter, ScheduleEntry, ScheduleSnapshot, ScheduleState, Workcenter};
pub use timeline::{DateRange, TimelineViewport};
pub use view_state::{GanttViewState, ScheduleQuery};
pub use zoom::ViewMode;

pub mod loader;
pub mod notify;
pub mod refresh;

pub use loader::{Repaint, ScheduleService};
pub use notify::{Notification, NotificationLevel, Toasts};

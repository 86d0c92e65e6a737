pub mod actor;
pub mod dashboard;
pub mod event;
pub mod profile;
pub mod validation;

pub use actor::Actor;
pub use dashboard::{DashboardStats, StatusCounts};
pub use event::{ApprovalStatus, Event, EventDraft, NewEvent};
pub use profile::{ProfileUpdate, UserProfile};
pub use validation::{FieldError, ValidationErrors};

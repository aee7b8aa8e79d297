mod aggregate;
mod plan;
mod repository;
mod value_objects;

pub use aggregate::CheckIn;
pub use plan::{DayPlan, WorkoutPlanProvider};
pub use repository::CheckInRepository;
pub use value_objects::{CheckInStatus, CheckInType};

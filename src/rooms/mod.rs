//! Room templates, their registry, and placed instances

/// Rooms placed on the grid
pub mod instance;
/// Template registry with pre-rotated variants
pub mod registry;
/// Room template definitions and rotation
pub mod template;

pub use instance::PlacedRoomInstance;
pub use registry::{TemplateId, TemplateRegistry};
pub use template::RoomTemplate;

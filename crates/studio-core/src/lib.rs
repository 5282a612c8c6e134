pub mod attrs;
pub mod builder;
pub mod emitter;
pub mod error;
pub mod extract;
pub mod id;
pub mod layout;
pub mod model;

pub use builder::{PageImport, Project, import_project_page, load_project_page, parse_project};
pub use emitter::export_markup;
pub use error::{StudioError, StudioResult};
pub use extract::extract;
pub use id::WidgetId;
pub use layout::{LayoutImport, export_layout, export_layout_at, import_layout};
pub use model::*;

//! Row structs and create DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and a create DTO for inserts.

pub mod project;
pub mod run;
pub mod status;

pub use project::{NewProject, Project, ProjectUpdate};
pub use run::{NewRun, Run};
pub use status::{RunStatus, StatusId};

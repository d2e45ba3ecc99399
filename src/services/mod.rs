pub mod content_service;
pub mod group_service;
pub mod identity_service;
pub mod lookup_service;

pub use content_service::{ContentError, ContentService, PostFilter};
pub use group_service::{GroupError, GroupService};
pub use identity_service::{IdentityError, IdentityService};
pub use lookup_service::LookupService;

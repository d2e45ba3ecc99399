pub mod comment;
pub mod group;
pub mod lookup;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use group::Group;
pub use lookup::Lookup;
pub use post::Post;
pub use user::{Role, User};

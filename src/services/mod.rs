pub mod blog;
pub mod cache;
pub mod contact;
pub mod project;
pub mod social_link;

pub use blog::BlogService;
pub use contact::ContactService;
pub use project::ProjectService;
pub use social_link::SocialLinkService;

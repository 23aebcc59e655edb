pub mod prelude;

pub mod audit_logs;
pub mod categories;
pub mod category_subcategories;
pub mod files;
pub mod folders;
pub mod nav_links;
pub mod permissions;
pub mod publication_attachments;
pub mod publications;
pub mod role_permissions;
pub mod roles;
pub mod shares;
pub mod subcategories;
pub mod user_roles;
pub mod users;

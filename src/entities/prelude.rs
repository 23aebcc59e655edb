pub use super::audit_logs::Entity as AuditLogs;
pub use super::categories::Entity as Categories;
pub use super::category_subcategories::Entity as CategorySubcategories;
pub use super::files::Entity as Files;
pub use super::folders::Entity as Folders;
pub use super::nav_links::Entity as NavLinks;
pub use super::permissions::Entity as Permissions;
pub use super::publication_attachments::Entity as PublicationAttachments;
pub use super::publications::Entity as Publications;
pub use super::role_permissions::Entity as RolePermissions;
pub use super::roles::Entity as Roles;
pub use super::shares::Entity as Shares;
pub use super::subcategories::Entity as Subcategories;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod files;
pub mod health;
pub mod nav_links;
pub mod publications;
pub mod roles;
pub mod shares;
pub mod subcategories;
pub mod users;

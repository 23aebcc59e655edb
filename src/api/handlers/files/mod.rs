pub mod download;
pub mod list;
pub mod manage;
pub mod types;
pub mod upload;

pub use download::{download_file, get_file};
pub use list::{folder_path, folder_tree, list_files};
pub use manage::{
    bulk_delete, bulk_move, create_folder, delete_file, delete_folder, rename_file, update_folder,
};
pub use upload::upload_file;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publication_attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub publication_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_id: String,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::publications::Entity",
        from = "Column::PublicationId",
        to = "super::publications::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Publications,
    #[sea_orm(
        belongs_to = "super::files::Entity",
        from = "Column::FileId",
        to = "super::files::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Files,
}

impl Related<super::publications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publications.def()
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

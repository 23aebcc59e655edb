use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subcategories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::category_subcategories::Entity")]
    CategorySubcategories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::category_subcategories::Relation::Categories.def()
    }
    fn via() -> Option<RelationDef> {
        Some(
            super::category_subcategories::Relation::Subcategories
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_tiebreaker")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tiebreaker_id: i32,
    pub team_id: i32,
    pub new_amount: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tiebreakers::Entity",
        from = "Column::TiebreakerId",
        to = "super::tiebreakers::Column::Id"
    )]
    Tiebreaker,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id"
    )]
    Team,
}

impl Related<super::tiebreakers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tiebreaker.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

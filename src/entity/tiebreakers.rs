use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tiebreaker")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub round_id: Option<i32>,
    pub player_id: i32,
    pub original_amount: i64,
    pub resolved: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rounds::Entity",
        from = "Column::RoundId",
        to = "super::rounds::Column::Id"
    )]
    Round,
    #[sea_orm(
        belongs_to = "super::players::Entity",
        from = "Column::PlayerId",
        to = "super::players::Column::Id"
    )]
    Player,
    #[sea_orm(has_many = "super::team_tiebreakers::Entity")]
    TeamTiebreakers,
}

impl Related<super::rounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Round.def()
    }
}

impl Related<super::players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl Related<super::team_tiebreakers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamTiebreakers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

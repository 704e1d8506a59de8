use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub discounted_price: Option<i64>,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Discounted price when one is set, list price otherwise.
    pub fn unit_price(&self) -> i64 {
        self.discounted_price.unwrap_or(self.price)
    }

    /// `None` on overflow.
    pub fn line_total(&self, quantity: i32) -> Option<i64> {
        self.unit_price().checked_mul(i64::from(quantity))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

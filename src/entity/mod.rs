pub mod addresses;
pub mod cart_items;
pub mod favorite_flavors;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod users;

pub use addresses::Entity as Addresses;
pub use cart_items::Entity as CartItems;
pub use favorite_flavors::Entity as FavoriteFlavors;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;

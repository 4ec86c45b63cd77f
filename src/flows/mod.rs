//! Storefront flows, each generic over [`Driver`](crate::Driver).

mod bestsellers;
mod location;
mod menu;

pub use bestsellers::{extract_second_price, second_best_seller_price};
pub use location::{set_delivery_zip, LocationChange};
pub use menu::{CategoryPath, MenuNavigator, Transition};

pub mod category;
pub mod conversation;
pub mod message;
pub mod payment;
pub mod product;
pub mod shop;
pub mod subcategory;
pub mod user;
pub mod user_post;

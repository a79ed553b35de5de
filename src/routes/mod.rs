pub mod auth;
pub mod categories;
pub mod contact_views;
pub mod conversations;
pub mod messages;
pub mod payments;
pub mod posting;
pub mod products;
pub mod shops;
pub mod subcategories;
pub mod uploads;
pub mod users;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // auth routes first so GET /user/me wins over GET /user/{id}
    cfg.service(
        web::scope("/user")
            .configure(auth::configure)
            .configure(users::configure),
    );
    cfg.service(web::scope("/shops").configure(shops::configure));
    cfg.service(web::scope("/product").configure(products::configure));
    cfg.service(web::scope("/categories").configure(categories::configure));
    cfg.service(web::scope("/subcategories").configure(subcategories::configure));
    cfg.service(web::scope("/conversation").configure(conversations::configure));
    cfg.service(web::scope("/message").configure(messages::configure));
    cfg.service(web::scope("/contact").configure(contact_views::configure));
    cfg.service(web::scope("/payment").configure(payments::configure));
    cfg.service(web::scope("/user-posts").configure(posting::configure));
    cfg.service(web::scope("/upload").configure(uploads::configure));
    cfg.service(web::scope("/chat").configure(crate::chat::configure));
}

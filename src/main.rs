mod catalog;
mod chat;
mod config;
mod db;
mod errors;
mod lifecycle;
mod middleware;
mod models;
mod routes;
mod utils;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cfg = AppConfig::from_env();
    let host = cfg.host.clone();
    let port = cfg.port;

    let mongo = db::mongo_client(&cfg.mongodb_uri).await;
    let state = db::AppState::new(mongo, &cfg.mongodb_db);

    let rooms = web::Data::new(chat::ChatRooms::new());

    actix_web::rt::spawn(lifecycle::run_expiry_sweep(
        state.db.clone(),
        cfg.expiry_sweep_secs,
    ));

    println!("Mercadito Backend running at http://{}:{}", host, port);

    let cfg_data = cfg.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cfg_data.cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
            .allowed_header(header::ACCEPT)
            .allowed_header(header::ORIGIN)
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(cfg_data.clone()))
            .app_data(web::Data::new(state.clone()))
            .app_data(rooms.clone())
            // Health check para navegador
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Ok().json(serde_json::json!({
                        "name": "Mercadito API",
                        "status": "ok",
                        "endpoints": {
                            "register": "POST /v2/user/register",
                            "login": "POST /v2/user/login",
                            "products": "GET /v2/product",
                            "categories": "GET /v2/categories",
                            "chat": "GET /v2/chat/ws"
                        }
                    }))
                }),
            )
            .service(web::scope("/v2").configure(routes::configure))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

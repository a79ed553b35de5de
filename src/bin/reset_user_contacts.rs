//! One-off: wipe one user's contact counters. Subscription flags are left
//! alone.
//!
//! Usage: MONGODB_URI=... cargo run --bin reset_user_contacts -- <user hex id>

use bson::{doc, oid::ObjectId, Document};
use mongodb::Client;

#[actix_web::main]
async fn main() -> Result<(), mongodb::error::Error> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let Some(raw_id) = std::env::args().nth(1) else {
        eprintln!("usage: reset_user_contacts <user hex id>");
        std::process::exit(2);
    };

    let Ok(user_oid) = ObjectId::parse_str(&raw_id) else {
        eprintln!("'{}' is not a valid ObjectId", raw_id);
        std::process::exit(2);
    };

    let uri = std::env::var("MONGODB_URI").expect("MONGODB_URI is required");
    let db_name = std::env::var("MONGODB_DB").unwrap_or_else(|_| "mercadito".into());

    let client = Client::with_uri_str(&uri).await?;
    let users = client.database(&db_name).collection::<Document>("users");

    let res = users
        .update_one(
            doc! { "_id": user_oid },
            doc! { "$set": {
                "contact_views": 0i64,
                "viewed_contacts": [],
                "contact_credits": 0i64,
            } },
            None,
        )
        .await?;

    if res.matched_count == 0 {
        eprintln!("no user with id {}", raw_id);
        std::process::exit(1);
    }

    println!("contact fields reset for {}", raw_id);
    Ok(())
}

//! One-off: backfill the numeric `user_id` on accounts created before the
//! field existed. Oldest accounts get the lowest ids.
//!
//! Usage: MONGODB_URI=... MONGODB_DB=... cargo run --bin fix_user_ids

use bson::{doc, Document};
use futures::StreamExt;
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::Client;

#[actix_web::main]
async fn main() -> Result<(), mongodb::error::Error> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let uri = std::env::var("MONGODB_URI").expect("MONGODB_URI is required");
    let db_name = std::env::var("MONGODB_DB").unwrap_or_else(|_| "mercadito".into());

    let client = Client::with_uri_str(&uri).await?;
    let users = client.database(&db_name).collection::<Document>("users");

    let last = users
        .find_one(
            doc! { "user_id": { "$exists": true } },
            FindOneOptions::builder().sort(doc! { "user_id": -1 }).build(),
        )
        .await?;

    let mut next_id = last
        .and_then(|u| u.get_i64("user_id").ok())
        .unwrap_or(0)
        + 1;

    println!("starting at user_id {}", next_id);

    let mut cursor = users
        .find(
            doc! { "user_id": { "$exists": false } },
            FindOptions::builder().sort(doc! { "created_at": 1 }).build(),
        )
        .await?;

    let mut fixed = 0u64;
    while let Some(user) = cursor.next().await {
        let user = user?;
        let Ok(id) = user.get_object_id("_id") else {
            continue;
        };

        users
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "user_id": next_id } },
                None,
            )
            .await?;

        println!("  {} -> user_id {}", id.to_hex(), next_id);
        next_id += 1;
        fixed += 1;
    }

    println!("done, {} user(s) updated", fixed);
    Ok(())
}

//! One-off: backfill the numeric `subcategory_id` on subcategories that were
//! inserted without one.
//!
//! Usage: MONGODB_URI=... MONGODB_DB=... cargo run --bin fix_subcategory_ids

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
    let subcategories = client
        .database(&db_name)
        .collection::<Document>("subcategories");

    let last = subcategories
        .find_one(
            doc! { "subcategory_id": { "$exists": true } },
            FindOneOptions::builder()
                .sort(doc! { "subcategory_id": -1 })
                .build(),
        )
        .await?;

    let mut next_id = last
        .and_then(|s| s.get_i64("subcategory_id").ok())
        .unwrap_or(0)
        + 1;

    let mut cursor = subcategories
        .find(
            doc! { "subcategory_id": { "$exists": false } },
            FindOptions::builder().sort(doc! { "created_at": 1 }).build(),
        )
        .await?;

    let mut fixed = 0u64;
    while let Some(sub) = cursor.next().await {
        let sub = sub?;
        let Ok(id) = sub.get_object_id("_id") else {
            continue;
        };
        let name = sub.get_str("name").unwrap_or("?");

        subcategories
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "subcategory_id": next_id } },
                None,
            )
            .await?;

        println!("  {} ({}) -> subcategory_id {}", id.to_hex(), name, next_id);
        next_id += 1;
        fixed += 1;
    }

    println!("done, {} subcategory(ies) updated", fixed);
    Ok(())
}

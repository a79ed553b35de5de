//! One-off migration: add the contact-credit fields to accounts that predate
//! the feature. Only missing fields are touched.
//!
//! Usage: MONGODB_URI=... cargo run --bin add_contact_fields

use bson::{doc, Document};
use mongodb::Client;

#[actix_web::main]
async fn main() -> Result<(), mongodb::error::Error> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let uri = std::env::var("MONGODB_URI").expect("MONGODB_URI is required");
    let db_name = std::env::var("MONGODB_DB").unwrap_or_else(|_| "mercadito".into());
    let credits = std::env::var("FREE_CONTACT_CREDITS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(7);

    let client = Client::with_uri_str(&uri).await?;
    let users = client.database(&db_name).collection::<Document>("users");

    let fields: [(&str, bson::Bson); 5] = [
        ("contact_views", bson::Bson::Int64(0)),
        ("viewed_contacts", bson::Bson::Array(vec![])),
        ("has_unlimited_contacts", bson::Bson::Boolean(false)),
        ("subscription_expiry", bson::Bson::Null),
        ("contact_credits", bson::Bson::Int64(credits)),
    ];

    for (field, default) in fields {
        let mut filter = Document::new();
        filter.insert(field, doc! { "$exists": false });

        let mut set = Document::new();
        set.insert(field, default);

        let res = users
            .update_many(filter, doc! { "$set": set }, None)
            .await?;

        println!("{}: {} user(s) backfilled", field, res.modified_count);
    }

    println!("done");
    Ok(())
}

//! One-off: rename a category in place.
//!
//! Usage: cargo run --bin fix_category_name -- --from "Frutas" --to "Fruits"

use bson::{doc, Document};
use mongodb::Client;

fn parse_args() -> Option<(String, String)> {
    let args: Vec<String> = std::env::args().collect();
    let mut from = None;
    let mut to = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--from" => {
                from = args.get(i + 1).cloned();
                i += 2;
            }
            "--to" => {
                to = args.get(i + 1).cloned();
                i += 2;
            }
            _ => i += 1,
        }
    }

    Some((from?, to?))
}

#[actix_web::main]
async fn main() -> Result<(), mongodb::error::Error> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let Some((from, to)) = parse_args() else {
        eprintln!("usage: fix_category_name --from <old name> --to <new name>");
        std::process::exit(2);
    };

    let uri = std::env::var("MONGODB_URI").expect("MONGODB_URI is required");
    let db_name = std::env::var("MONGODB_DB").unwrap_or_else(|_| "mercadito".into());

    let client = Client::with_uri_str(&uri).await?;
    let db = client.database(&db_name);

    let res = db
        .collection::<Document>("categories")
        .update_one(
            doc! { "name": &from },
            doc! { "$set": { "name": &to } },
            None,
        )
        .await?;

    if res.matched_count == 0 {
        eprintln!("no category named '{}'", from);
        std::process::exit(1);
    }

    // payments store the display name, keep the history readable
    let payments = db
        .collection::<Document>("payments")
        .update_many(
            doc! { "category": &from },
            doc! { "$set": { "category": &to } },
            None,
        )
        .await?;

    println!(
        "renamed '{}' -> '{}' ({} payment(s) touched)",
        from, to, payments.modified_count
    );
    Ok(())
}

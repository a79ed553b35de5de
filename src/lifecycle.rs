//! Background sweep that expires stale listings.

use std::time::Duration;

use bson::doc;
use chrono::Utc;
use mongodb::Database;

use crate::models::product::Product;

/// Flip every active listing past its `expires_at` to `expired`. Returns the
/// number of listings touched.
pub async fn sweep_once(db: &Database) -> Result<u64, mongodb::error::Error> {
    let products = db.collection::<Product>("products");

    let res = products
        .update_many(
            doc! {
                "status": "active",
                "expires_at": { "$lt": Utc::now() },
            },
            doc! { "$set": { "status": "expired" } },
            None,
        )
        .await?;

    Ok(res.modified_count)
}

pub async fn run_expiry_sweep(db: Database, interval_secs: u64) {
    let mut interval = actix_web::rt::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_once(&db).await {
            Ok(0) => {}
            Ok(n) => log::info!("expiry sweep: {n} listing(s) expired"),
            Err(e) => log::error!("expiry sweep failed: {:?}", e),
        }
    }
}

use std::{env, time::Duration};

use log::*;
use nursery_common::{GeoPoint, Rupees};
use nursery_order_engine::db_types::DEPOT_LOCATION;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/nursery.db";
const DEFAULT_DELIVERY_FEE: i64 = 30;
const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(90);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// Where every delivery starts: the nursery itself.
    pub depot: GeoPoint,
    /// Flat surcharge added to the cart subtotal at checkout.
    pub delivery_fee: Rupees,
    /// How often the courier's position is pushed to the order record.
    pub publish_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            depot: DEPOT_LOCATION,
            delivery_fee: Rupees::from(DEFAULT_DELIVERY_FEE),
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}

impl AppConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = AppConfig::default();
        let database_url = env::var("NURSERY_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ NURSERY_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url.clone()
        });
        let depot = GeoPoint::new(
            env_f64("NURSERY_DEPOT_LAT", defaults.depot.latitude),
            env_f64("NURSERY_DEPOT_LNG", defaults.depot.longitude),
        );
        let delivery_fee = env::var("NURSERY_DELIVERY_FEE")
            .ok()
            .map(|s| {
                s.parse::<i64>().map(Rupees::from).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid amount for NURSERY_DELIVERY_FEE. {e} Using the default, \
                         {DEFAULT_DELIVERY_FEE}, instead."
                    );
                    defaults.delivery_fee
                })
            })
            .unwrap_or(defaults.delivery_fee);
        let publish_interval = env::var("NURSERY_PUBLISH_INTERVAL_SECS")
            .ok()
            .map(|s| {
                s.parse::<u64>().map(Duration::from_secs).unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid period for NURSERY_PUBLISH_INTERVAL_SECS. {e} Using the \
                         default instead."
                    );
                    defaults.publish_interval
                })
            })
            .unwrap_or(defaults.publish_interval);
        Self { database_url, depot, delivery_fee, publish_interval }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(s) => s.parse::<f64>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid coordinate for {key}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_the_nursery() {
        let config = AppConfig::default();
        assert_eq!(config.depot, GeoPoint::new(15.590386, 73.810582));
        assert_eq!(config.delivery_fee, Rupees::from(30));
        assert_eq!(config.publish_interval, Duration::from_secs(90));
    }
}

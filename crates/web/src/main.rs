use std::sync::Arc;

use database::{DatabaseConnectionInfo, PgDatabase};
use discovery::{
    client::Client,
    database::Database,
    geocoding::{DisabledGeocoder, Geocoder},
    memory::MemoryDatabase,
};
use geocoding::{GeocoderConfig, NominatimGeocoder};
use log::{info, warn};
use web::{config::WebConfig, middleware::auth::Sessions, start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = WebConfig::from_env().expect("invalid web server configuration");

    // geocoder
    let geocoder: Arc<dyn Geocoder> = match GeocoderConfig::from_env() {
        Some(geocoder_config) => {
            info!("Geocoding addresses with {}", geocoder_config.base_url);
            Arc::new(
                NominatimGeocoder::new(geocoder_config).expect("could not build geocoder."),
            )
        }
        None => {
            warn!("Geocoding is disabled, new addresses will have no location");
            Arc::new(DisabledGeocoder)
        }
    };

    // database
    match DatabaseConnectionInfo::from_env() {
        Some(database_connection_info) => {
            let database = PgDatabase::connect(database_connection_info)
                .await
                .expect("could not connect to database.");
            serve(database, geocoder, &config).await;
        }
        None => {
            warn!("No database configured, keeping everything in memory");
            serve(MemoryDatabase::new(), geocoder, &config).await;
        }
    }
}

async fn serve<D: Database>(database: D, geocoder: Arc<dyn Geocoder>, config: &WebConfig) {
    let client = Client::new(database, geocoder, config.credentials);
    let sessions = Sessions::new(config.jwt_secret.as_bytes(), config.token_ttl);

    start_web_server(WebState::new(client, sessions), config)
        .await
        .expect("web server failed.");
}

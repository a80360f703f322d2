use actix_files::Files;
use actix_web::web::{self, ServiceConfig};

use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::SecretStore;

use config::AppConfig;
use endpoints::concat::{configure as concat_configure, json_config};
use services::storage::PUBLIC_PREFIX;

mod app_state;
mod audio;
mod config;
mod endpoints;
mod error;
mod services;
#[cfg(test)]
mod test_support;

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut ServiceConfig) + Send + Clone + 'static> {
    let config = AppConfig::from_secrets(&secrets);
    tracing::info!(
        "Starting with max_segments={}, storage_root={}",
        config.max_segments,
        config.storage_root.display()
    );

    // Create the storage root so that Actix won't throw an error.
    // If it already exists, `create_dir_all` does nothing.
    if let Err(e) = std::fs::create_dir_all(&config.storage_root) {
        tracing::error!(
            "Failed to create storage root {}: {:?}",
            config.storage_root.display(),
            e
        );
    }

    let storage_root = config.storage_root.clone();
    let max_body_bytes = config.max_body_bytes;
    let state = web::Data::new(
        app_state::AppState::new(config).map_err(|e| shuttle_runtime::Error::Custom(e.into()))?,
    );

    let app_config = move |cfg: &mut ServiceConfig| {
        cfg.service(
            Files::new(PUBLIC_PREFIX, storage_root)
                .prefer_utf8(true)
                .use_last_modified(true),
        );

        cfg.service(
            web::scope("/api")
                .app_data(json_config(max_body_bytes))
                .configure(concat_configure),
        )
        .app_data(state);
    };

    Ok(app_config.into())
}

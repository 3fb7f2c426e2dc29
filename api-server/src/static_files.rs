// api-server/src/static_files.rs
use std::path::PathBuf;

use actix_files::{Files, NamedFile};
use actix_web::{web, Error, HttpRequest, HttpResponse, Result};
use common::StaticFilesConfig;

/// Fallback for unmatched routes: serve the shell index so client-side
/// navigation deep-links work. API routes are never shadowed.
async fn shell_index(
    req: HttpRequest,
    config: web::Data<StaticFilesConfig>,
) -> Result<HttpResponse, Error> {
    let path = req.path();
    if path.starts_with("/api/") {
        return Ok(HttpResponse::NotFound().finish());
    }

    let index_path = PathBuf::from(&config.path).join(&config.index);
    let file = NamedFile::open(index_path)?;
    Ok(file.into_response(&req))
}

/// Serve the shell page and the view bundles (`pages/<view>/...`)
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    let config_data = web::Data::new(config.clone());

    cfg.app_data(config_data)
        .service(
            Files::new("/", &config.path)
                .index_file(&config.index)
                .prefer_utf8(true)
                .use_etag(true)
                .use_last_modified(true),
        )
        .default_service(web::route().to(shell_index));
}

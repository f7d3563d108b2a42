use actix_cors::Cors;
use actix_web::http::header::{self, ContentDisposition};
use actix_web::middleware::Compress;
use actix_web::{web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod composer;
pub mod config;
pub mod document;
pub mod state;
pub mod template;

pub use crate::state::AppState;

use crate::config::AppConfig;
use crate::document::RenderedDocument;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Send a generated document as a download.
pub fn document_response(document: RenderedDocument) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(document.content_type)
        .insert_header(ContentDisposition::attachment(document.filename))
        .body(document.data)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::template::routes::list_templates,
        crate::template::routes::upload_template,
        crate::template::routes::list_variables,
        crate::template::routes::get_active_template,
        crate::template::routes::render_active_template,
        crate::template::routes::get_template,
        crate::template::routes::delete_template,
        crate::template::routes::activate_template,
        crate::template::routes::download_template,
        crate::template::routes::preview_template,
        crate::template::routes::render_template,
        crate::composer::routes::surat_pengajuan,
        crate::composer::routes::surat_tugas,
        crate::composer::routes::sertifikat,
        crate::composer::routes::laporan,
        crate::composer::routes::list_presets,
        crate::composer::routes::preset_laporan
    ),
    components(
        schemas(
            template::model::TemplateMeta,
            template::model::TemplateSummary,
            template::model::TemplateVariable,
            template::routes::UploadTemplateRequest,
            document::RenderContext,
            document::StudentRow,
            document::pdf::SuratPengajuanRequest,
            document::pdf::SuratTugasRequest,
            document::pdf::SertifikatRequest,
            document::pdf::LaporanRequest,
            document::pdf::ReportPreset,
            composer::routes::PresetReportRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Template", description = "Word template upload, preview and rendering."),
        (name = "Document", description = "Fixed-layout PDF letters, certificates and reports.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost")
    )
)]
pub struct ApiDoc;

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .max_age(3600)
}

/// Register every API route under the current scope.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(template::routes::config)
        .configure(composer::routes::config);
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let bind = (config.host.clone(), config.port);
    let origins = config.cors_allowed_origins.clone();

    let app_state = match AppState::new(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to open template store. Check TEMPLATE_DIR in .env. Error: {}", e);
            return Err(e.into());
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("pkl_document_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors(&origins))
            .app_data(app_state.clone())
            .app_data(web::JsonConfig::default().limit(4 * 1024 * 1024))
            .service(web::scope("/api").configure(api_config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

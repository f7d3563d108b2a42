use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::document::pdf::laporan::ReportRow;
use crate::document::pdf::{
    LaporanRequest, ReportPreset, SertifikatRequest, SuratPengajuanRequest, SuratTugasRequest,
};
use crate::document::{Composer, Generator, Validator};
use crate::{document_response, AppState, ErrorResponse};

/// Rows for a preset report.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PresetReportRequest {
    /// Category name, required by `rekap-kategori`.
    #[serde(default)]
    #[schema(example = "Sudah PKL")]
    pub kategori: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub tanggal: Option<String>,
}

/// Validate, then draw the document on the blocking pool.
async fn compose<Req>(state: &web::Data<AppState>, request: Req) -> HttpResponse
where
    Req: Validator + Send + 'static,
    Composer: Generator<Req>,
{
    if let Err(message) = request.validate() {
        warn!("Rejected document request: {}", message);
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message));
    }

    let composer = state.composer.clone();
    match web::block(move || composer.generate(&request)).await {
        Ok(Ok(document)) => document_response(document),
        Ok(Err(e)) => {
            error!("PDF composition failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Gagal membuat dokumen PDF"))
        }
        Err(e) => {
            error!("Document worker failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Gagal memproses dokumen"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document",
    post,
    path = "/documents/surat-pengajuan",
    request_body = SuratPengajuanRequest,
    responses(
        (status = 200, description = "Surat pengajuan PKL as PDF"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn surat_pengajuan(
    state: web::Data<AppState>,
    request: web::Json<SuratPengajuanRequest>,
) -> impl Responder {
    compose(&state, request.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document",
    post,
    path = "/documents/surat-tugas",
    request_body = SuratTugasRequest,
    responses(
        (status = 200, description = "Surat tugas as PDF"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn surat_tugas(
    state: web::Data<AppState>,
    request: web::Json<SuratTugasRequest>,
) -> impl Responder {
    compose(&state, request.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document",
    post,
    path = "/documents/sertifikat",
    request_body = SertifikatRequest,
    responses(
        (status = 200, description = "Sertifikat PKL as PDF"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn sertifikat(
    state: web::Data<AppState>,
    request: web::Json<SertifikatRequest>,
) -> impl Responder {
    compose(&state, request.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document",
    post,
    path = "/documents/laporan",
    request_body = LaporanRequest,
    responses(
        (status = 200, description = "Tabular report as PDF"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn laporan(state: web::Data<AppState>, request: web::Json<LaporanRequest>) -> impl Responder {
    compose(&state, request.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document",
    get,
    path = "/documents/laporan/presets",
    responses(
        (status = 200, description = "Standard report layouts", body = Vec<ReportPreset>)
    )
)]
pub async fn list_presets() -> impl Responder {
    HttpResponse::Ok().json(ReportPreset::all())
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document",
    post,
    path = "/documents/laporan/presets/{key}",
    params(("key" = String, Path, description = "Preset key, e.g. `monitoring`")),
    request_body = PresetReportRequest,
    responses(
        (status = 200, description = "Preset report as PDF"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Unknown preset", body = ErrorResponse)
    )
)]
pub async fn preset_laporan(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PresetReportRequest>,
) -> impl Responder {
    let key = path.into_inner();
    let preset = match ReportPreset::find(&key) {
        Some(preset) => preset,
        None => {
            return HttpResponse::NotFound()
                .json(ErrorResponse::not_found(&format!("Preset laporan '{}' tidak dikenal", key)))
        }
    };

    let body = body.into_inner();
    info!("Preset report '{}' requested with {} row(s)", preset.key, body.rows.len());
    match preset.request(body.kategori.as_deref(), body.rows, body.tanggal) {
        Ok(request) => compose(&state, request).await,
        Err(message) => HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documents/surat-pengajuan").route(web::post().to(surat_pengajuan)))
        .service(web::resource("/documents/surat-tugas").route(web::post().to(surat_tugas)))
        .service(web::resource("/documents/sertifikat").route(web::post().to(sertifikat)))
        .service(web::resource("/documents/laporan").route(web::post().to(laporan)))
        .service(web::resource("/documents/laporan/presets").route(web::get().to(list_presets)))
        .service(
            web::resource("/documents/laporan/presets/{key}")
                .route(web::post().to(preset_laporan)),
        );
}

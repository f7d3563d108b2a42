use actix_multipart::Multipart;
use actix_web::http::header::ContentDisposition;
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::document::validation::{validate_template_file, ValidationErrors};
use crate::document::{extract_variables, preview_html, RenderContext, TemplateRenderError, DOCX_MIME};
use crate::template::model::{available_variables, Template, TemplateMeta, TemplateSummary, TemplateVariable};
use crate::template::store::StoreError;
use crate::{document_response, AppState, ErrorResponse};

/// Multipart form of a template upload.
#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct UploadTemplateRequest {
    /// The `.docx` file.
    #[allow(unused)]
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Display name; the file name when absent.
    #[allow(unused)]
    pub name: Option<String>,
}

struct Upload {
    filename: String,
    content_type: Option<String>,
    data: Vec<u8>,
    name: Option<String>,
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Read the `file` and `name` fields. Reading stops one byte past `max_bytes`
/// so oversized uploads are rejected without buffering them whole.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Upload, String> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut name: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| e.to_string())? {
        let content_disposition = field
            .content_disposition()
            .ok_or("Content-Disposition not set")?;
        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| "No field name".to_string())?
            .to_string();

        match field_name.as_str() {
            "file" => {
                let filename = content_disposition
                    .get_filename()
                    .map(sanitize_filename::sanitize)
                    .ok_or_else(|| "No filename".to_string())?;
                let content_type = field.content_type().map(|mime| mime.to_string());

                let mut data = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
                    data.extend_from_slice(&chunk);
                    if data.len() > max_bytes {
                        warn!("Upload of '{}' exceeds {} bytes, discarding", filename, max_bytes);
                        break;
                    }
                }
                file = Some((filename, content_type, data));
            }
            "name" => name = Some(read_text_field(&mut field).await?),
            _ => continue,
        }
    }

    match file {
        Some((filename, content_type, data)) => Ok(Upload {
            filename,
            content_type,
            data,
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        }),
        None => Err("No file was uploaded".to_string()),
    }
}

/// Cache a preview, then confirm the template still exists. A delete that
/// lands while the preview was being built must not leave an entry behind.
async fn remember_preview(state: &AppState, id: Uuid, html: String) -> Result<(), StoreError> {
    state.preview_cache.insert(id, html).await;
    if let Err(e) = state.templates.get(id).await {
        state.preview_cache.invalidate(&id).await;
        return Err(e);
    }
    Ok(())
}

fn store_failure(e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(id) => HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("Template {} tidak ditemukan", id))),
        other => {
            error!("Template store failure: {}", other);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Gagal mengakses penyimpanan template"))
        }
    }
}

fn render_failure(e: TemplateRenderError) -> HttpResponse {
    error!("Template rendering failed: {}", e);
    match e {
        TemplateRenderError::Read(read) => HttpResponse::BadRequest().json(
            ErrorResponse::bad_request(&format!("Gagal membaca template Word: {}", read)),
        ),
        other => HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
            &format!("Gagal memproses template Word: {}", other),
        )),
    }
}

fn worker_failure(e: actix_web::error::BlockingError) -> HttpResponse {
    error!("Document worker failed: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Gagal memproses dokumen"))
}

async fn render_with(state: &web::Data<AppState>, template: Template, context: RenderContext) -> HttpResponse {
    info!(
        "Rendering template {} ({}) for {}",
        template.meta.id,
        template.meta.name,
        context.nama_perusahaan.as_deref().unwrap_or("-")
    );
    let renderer = state.renderer.clone();
    match web::block(move || renderer.render(&template, &context)).await {
        Ok(Ok(document)) => document_response(document),
        Ok(Err(e)) => render_failure(e),
        Err(e) => worker_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    get,
    path = "/templates",
    responses(
        (status = 200, description = "Uploaded templates", body = Vec<TemplateSummary>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn list_templates(state: web::Data<AppState>) -> impl Responder {
    match state.templates.list().await {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    post,
    path = "/templates",
    request_body(content = inline(UploadTemplateRequest), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Template stored", body = TemplateMeta),
        (status = 400, description = "Not a readable Word document", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn upload_template(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let max_bytes = state.config.max_template_bytes;
    let upload = match read_upload(payload, max_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Rejected template upload: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e));
        }
    };

    let mut errors = ValidationErrors::new();
    validate_template_file(
        &upload.filename,
        upload.content_type.as_deref(),
        upload.data.len(),
        max_bytes,
        &mut errors,
    );
    if let Err(message) = errors.into_result() {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message));
    }

    let data = upload.data;
    let (variables, data) = match web::block(move || (extract_variables(&data), data)).await {
        Ok((Ok(variables), data)) => (variables, data),
        Ok((Err(e), _)) => {
            warn!("Uploaded file '{}' is not a readable template: {}", upload.filename, e);
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request("Gagal membaca template Word"));
        }
        Err(e) => return worker_failure(e),
    };
    debug!("Template '{}' exposes {:?}", upload.filename, variables);

    let name = upload.name.unwrap_or(upload.filename);
    let meta = TemplateMeta::new(name, data.len(), variables);
    match state.templates.save(meta, data).await {
        Ok(meta) => HttpResponse::Created().json(meta),
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    get,
    path = "/templates/variables",
    responses(
        (status = 200, description = "Variables templates can use", body = Vec<TemplateVariable>)
    )
)]
pub async fn list_variables() -> impl Responder {
    HttpResponse::Ok().json(available_variables())
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    get,
    path = "/templates/active",
    responses(
        (status = 200, description = "The active template", body = TemplateMeta),
        (status = 404, description = "No template is active", body = ErrorResponse)
    )
)]
pub async fn get_active_template(state: web::Data<AppState>) -> impl Responder {
    match state.templates.active().await {
        Ok(Some(meta)) => HttpResponse::Ok().json(meta),
        Ok(None) => HttpResponse::NotFound()
            .json(ErrorResponse::not_found("Belum ada template yang aktif")),
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    post,
    path = "/templates/active/render",
    request_body = RenderContext,
    responses(
        (status = 200, description = "Filled Word document"),
        (status = 404, description = "No template is active", body = ErrorResponse),
        (status = 500, description = "Template could not be filled", body = ErrorResponse)
    )
)]
pub async fn render_active_template(
    state: web::Data<AppState>,
    context: web::Json<RenderContext>,
) -> impl Responder {
    let meta = match state.templates.active().await {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(ErrorResponse::not_found("Belum ada template yang aktif"))
        }
        Err(e) => return store_failure(e),
    };
    match state.templates.content(meta.id).await {
        Ok(template) => render_with(&state, template, context.into_inner()).await,
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    get,
    path = "/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template metadata", body = TemplateMeta),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn get_template(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.templates.get(path.into_inner()).await {
        Ok(meta) => HttpResponse::Ok().json(meta),
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    delete,
    path = "/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn delete_template(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    match state.templates.delete(id).await {
        Ok(()) => {
            state.preview_cache.invalidate(&id).await;
            HttpResponse::NoContent().finish()
        }
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    put,
    path = "/templates/{id}/activate",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template is now active", body = TemplateMeta),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn activate_template(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.templates.activate(path.into_inner()).await {
        Ok(meta) => HttpResponse::Ok().json(meta),
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    get,
    path = "/templates/{id}/download",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Original template file"),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn download_template(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.templates.content(path.into_inner()).await {
        Ok(template) => HttpResponse::Ok()
            .content_type(DOCX_MIME)
            .insert_header(ContentDisposition::attachment(sanitize_filename::sanitize(
                &template.meta.name,
            )))
            .body(template.content),
        Err(e) => store_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    get,
    path = "/templates/{id}/preview",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "HTML rendering of the template body", body = String, content_type = "text/html"),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn preview_template(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    if let Some(html) = state.preview_cache.get(&id).await {
        debug!("Preview cache hit for template {}", id);
        return HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html);
    }

    let template = match state.templates.content(id).await {
        Ok(template) => template,
        Err(e) => return store_failure(e),
    };
    match web::block(move || preview_html(&template.content)).await {
        Ok(Ok(html)) => match remember_preview(&state, id, html.clone()).await {
            Ok(()) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html),
            Err(e) => store_failure(e),
        },
        Ok(Err(e)) => {
            error!("Failed to preview template {}: {}", id, e);
            HttpResponse::BadRequest().json(ErrorResponse::bad_request("Gagal membaca template Word"))
        }
        Err(e) => worker_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template",
    post,
    path = "/templates/{id}/render",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = RenderContext,
    responses(
        (status = 200, description = "Filled Word document"),
        (status = 404, description = "Template not found", body = ErrorResponse),
        (status = 500, description = "Template could not be filled", body = ErrorResponse)
    )
)]
pub async fn render_template(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    context: web::Json<RenderContext>,
) -> impl Responder {
    match state.templates.content(path.into_inner()).await {
        Ok(template) => render_with(&state, template, context.into_inner()).await,
        Err(e) => store_failure(e),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/templates")
            .route(web::get().to(list_templates))
            .route(web::post().to(upload_template)),
    )
    .service(web::resource("/templates/variables").route(web::get().to(list_variables)))
    .service(web::resource("/templates/active").route(web::get().to(get_active_template)))
    .service(
        web::resource("/templates/active/render").route(web::post().to(render_active_template)),
    )
    .service(
        web::resource("/templates/{id}")
            .route(web::get().to(get_template))
            .route(web::delete().to(delete_template)),
    )
    .service(web::resource("/templates/{id}/activate").route(web::put().to(activate_template)))
    .service(web::resource("/templates/{id}/download").route(web::get().to(download_template)))
    .service(web::resource("/templates/{id}/preview").route(web::get().to(preview_template)))
    .service(web::resource("/templates/{id}/render").route(web::post().to(render_template)));
}

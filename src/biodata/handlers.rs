use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{debug, error, info, warn};

use super::models::{
    generation_name, CropRequest, CropResponse, ExportRequest, FieldInfo, RecordBody,
    ResolvedField, TemplateInfo, TemplateQuery,
};
use crate::export::{
    print, BrowserPrint, DeclarativeExporter, ExportError, ExportStrategy, ExportedDocument,
    Exporter, PhotoAsset, RasterExporter, UploadedSurface,
};
use crate::export::filename::FALLBACK_STEM;
use crate::photo::{self, CropArea, PORTRAIT};
use crate::record::Record;
use crate::resolve::{resolve, resolve_source, LogicalField};
use crate::template::{render, TemplateStyle};
use crate::{AppState, ErrorResponse};

const HTML: &str = "text/html; charset=utf-8";

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    get,
    path = "/templates",
    responses(
        (status = 200, description = "Available layouts", body = Vec<TemplateInfo>)
    )
)]
pub async fn list_templates() -> impl Responder {
    let templates: Vec<TemplateInfo> = TemplateStyle::ALL.into_iter().map(Into::into).collect();
    HttpResponse::Ok().json(templates)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    get,
    path = "/fields",
    responses(
        (status = 200, description = "Every logical field in display order", body = Vec<FieldInfo>)
    )
)]
pub async fn list_fields() -> impl Responder {
    let fields: Vec<FieldInfo> = LogicalField::all().map(Into::into).collect();
    HttpResponse::Ok().json(fields)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    post,
    path = "/preview",
    params(TemplateQuery),
    request_body(content = RecordBody, content_type = "application/json"),
    responses(
        (status = 200, description = "HTML fragment rooted at #biodata-preview", content_type = "text/html")
    )
)]
pub async fn preview(query: web::Query<TemplateQuery>, body: web::Json<RecordBody>) -> impl Responder {
    let record = body.into_inner().0;
    let style = query.style_for(&record);
    debug!("Rendering preview with {}", style.id());
    HttpResponse::Ok().content_type(HTML).body(render(&record, style))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Templates",
    post,
    path = "/resolve/{field}",
    request_body(content = RecordBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Resolved display value", body = ResolvedField),
        (status = 400, description = "Unknown field", body = ErrorResponse)
    ),
    params(
        ("field" = String, Path, description = "Logical field key, e.g. `fatherName`")
    )
)]
pub async fn resolve_field(path: web::Path<String>, body: web::Json<RecordBody>) -> impl Responder {
    let key = path.into_inner();
    let field: LogicalField = match key.parse() {
        Ok(field) => field,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e)),
    };

    let record = body.into_inner().0;
    let value = resolve(&record, field);
    let generation = resolve_source(&record, field)
        .map(|(source, _)| generation_name(source.generation()));

    HttpResponse::Ok().json(ResolvedField {
        field: field.key(),
        label: field.label(),
        placeholder: value.as_ref().is_some_and(|v| v.placeholder),
        text: value.map(|v| v.text),
        generation,
    })
}

/// `attachment` with an ASCII fallback and the UTF-8 name in `filename*`.
fn attachment(filename: &str) -> ContentDisposition {
    let fallback = if filename.is_ascii() {
        filename.to_string()
    } else {
        format!("{FALLBACK_STEM}.pdf")
    };
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![
            DispositionParam::Filename(fallback),
            DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: filename.as_bytes().to_vec(),
            }),
        ],
    }
}

fn pdf_response(document: ExportedDocument) -> HttpResponse {
    info!(
        "Exported {} ({} bytes)",
        document.filename,
        document.pdf.len()
    );
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(attachment(&document.filename))
        .body(document.pdf)
}

fn export_failed(strategy: ExportStrategy, e: ExportError) -> HttpResponse {
    match e {
        ExportError::Capture(e) => {
            warn!("Rejected {:?} export: {}", strategy, e);
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()))
        }
        e => {
            error!("{:?} export failed: {}", strategy, e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

/// Typst runs as a child process; keep it off the async workers.
async fn run_exporter<E>(strategy: ExportStrategy, exporter: E, record: Record) -> HttpResponse
where
    E: Exporter + Send + 'static,
{
    match web::block(move || exporter.export(&record)).await {
        Ok(Ok(document)) => pdf_response(document),
        Ok(Err(e)) => export_failed(strategy, e),
        Err(e) => {
            error!("Export worker failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Export worker failed"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Export",
    post,
    path = "/export",
    request_body(content = ExportRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "PDF for `raster`/`declarative`, self-printing HTML page for `print`"),
        (status = 400, description = "Missing or unusable capture", body = ErrorResponse),
        (status = 500, description = "Typst failed", body = ErrorResponse)
    )
)]
pub async fn export(state: web::Data<AppState>, body: web::Json<ExportRequest>) -> impl Responder {
    let ExportRequest {
        strategy,
        template,
        record,
        captures,
    } = body.into_inner();
    info!("Export requested with {:?} strategy", strategy);

    match strategy {
        ExportStrategy::Print => {
            let style = template.unwrap_or_else(|| TemplateStyle::for_record(&record));
            let mut dialog = BrowserPrint::new();
            if let Err(e) = print::print(&record, style, &mut dialog) {
                return export_failed(strategy, e);
            }
            match dialog.take_page() {
                Some(page) => HttpResponse::Ok().content_type(HTML).body(page.html),
                None => export_failed(
                    strategy,
                    ExportError::Print("no page was handed to the dialog".into()),
                ),
            }
        }
        ExportStrategy::Raster => {
            let mut surface = UploadedSurface::new();
            for capture in &captures {
                if let Err(e) =
                    surface.insert_data_uri(capture.region.clone(), &capture.data_uri, capture.scale)
                {
                    return export_failed(strategy, e.into());
                }
            }
            let exporter = RasterExporter::new(state.engine.clone(), surface);
            run_exporter(strategy, exporter, record).await
        }
        ExportStrategy::Declarative => {
            let photo = match record.photo_url.as_deref() {
                Some(url) => state
                    .service
                    .fetch_photo(url)
                    .await
                    .and_then(PhotoAsset::from_bytes),
                None => None,
            };
            let exporter = DeclarativeExporter::new(state.engine.clone()).with_photo(photo);
            run_exporter(strategy, exporter, record).await
        }
    }
}

fn crop_request(request: CropRequest) -> Result<CropResponse, photo::PhotoError> {
    let (_, source) = photo::decode_data_uri(&request.data_uri)?;
    let (width, height) = photo::dimensions(&source)?;

    let area = match (request.area, request.preview) {
        (Some(area), _) => area,
        (None, Some(selection)) => CropArea::from_preview(
            selection.rect,
            (selection.display_width, selection.display_height),
            (width, height),
        ),
        (None, None) => CropArea::centered(width, height, PORTRAIT),
    };

    let cropped = photo::crop(&source, area)?;
    Ok(CropResponse {
        data_uri: photo::encode_data_uri("image/jpeg", &cropped),
        area,
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Photo",
    post,
    path = "/photo/crop",
    request_body(content = CropRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Cropped JPEG as a data URI", body = CropResponse),
        (status = 400, description = "Undecodable image or crop outside the image", body = ErrorResponse)
    )
)]
pub async fn crop_photo(body: web::Json<CropRequest>) -> impl Responder {
    let request = body.into_inner();
    match web::block(move || crop_request(request)).await {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(e)) => {
            warn!("Rejected photo crop: {}", e);
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()))
        }
        Err(e) => {
            error!("Crop worker failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Crop worker failed"))
        }
    }
}

/// Photos kept in the local image directory.
pub async fn serve_image(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let filename: String = req.match_info().query("filename").into();
    let Some(path) = state.local_images.resolve(&filename) else {
        return HttpResponse::NotFound().json(ErrorResponse::not_found("Image not found"));
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            HttpResponse::Ok().content_type(mime.as_ref()).body(bytes)
        }
        Err(e) => {
            debug!("Image {} not served: {}", filename, e);
            HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Image '{}' not found",
                filename
            )))
        }
    }
}

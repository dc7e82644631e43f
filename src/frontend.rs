use actix_web::{web, HttpResponse};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "public/"]
struct Assets;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/assets/{path:.*}", web::get().to(asset));
}

fn content_type(path: &str) -> mime::Mime {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("html") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("png") => mime::IMAGE_PNG,
        Some("svg") => mime::IMAGE_SVG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn serve(path: &str) -> HttpResponse {
    match Assets::get(path) {
        Some(file) => HttpResponse::Ok()
            .content_type(content_type(path))
            .body(file.data.into_owned()),
        None => {
            log::debug!("embedded asset '{path}' not found");
            HttpResponse::NotFound().finish()
        }
    }
}

pub async fn index() -> HttpResponse { serve("index.html") }

pub async fn asset(path: web::Path<String>) -> HttpResponse { serve(&path) }

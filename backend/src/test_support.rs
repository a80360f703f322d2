use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};

struct Files {
    bodies: HashMap<String, Vec<u8>>,
    hits: Arc<AtomicUsize>,
}

/// Local HTTP server handing out fixed segment bodies by name.
///
/// Unknown names answer 404. The name `flaky` answers 503 on its first
/// request and its body afterwards.
pub struct SegmentServer {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl SegmentServer {
    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base, name)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve(files: web::Data<Files>, name: web::Path<String>) -> HttpResponse {
    let hit = files.hits.fetch_add(1, Ordering::SeqCst);
    let name = name.into_inner();

    if name == "flaky" && hit == 0 {
        return HttpResponse::ServiceUnavailable().finish();
    }

    match files.bodies.get(&name) {
        Some(body) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(body.clone()),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Must be called from inside an actix runtime (e.g. `#[actix_web::test]`).
pub fn spawn_segment_server(bodies: Vec<(&str, Vec<u8>)>) -> SegmentServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let files = web::Data::new(Files {
        bodies: bodies
            .into_iter()
            .map(|(name, body)| (name.to_string(), body))
            .collect(),
        hits: hits.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(files.clone())
            .route("/{name}", web::get().to(serve))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("bind test segment server");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    SegmentServer {
        base: format!("http://{addr}"),
        hits,
    }
}

/// Fresh, empty directory under the system temp dir.
pub fn temp_storage(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "audio-concat-worker-{}-{}",
        std::process::id(),
        name
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp storage dir");
    dir
}

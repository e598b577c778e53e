//! Routes du serveur web
//!
//! Chaque écran est rendu côté serveur; les interactions (repli de l'arbre,
//! pause, export...) sont des liens ou formulaires qui modifient l'état de
//! session puis redirigent vers la page d'origine.

use actix_multipart::Multipart;
use actix_web::http::{header, StatusCode};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use edna_core::explore::{explore_sequence, families};
use edna_core::report::quick_export;
use edna_core::{
    filter_and_sort, log_error, related_sequences, render_svg, validate_sequence, AnalysisResults,
    Demo, DetailedView, ExploreQuery, ExportFormat, RelatedSequence, TreeWidget, UploadError,
    UploadForm, UploadedFile,
};
use futures::StreamExt;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::models::{
    AppState, ErrorResponse, FormatQuery, Screen, SessionKey, ValidateRequest, ValidationResponse,
};

/// Préfixe des liens posés sur les nœuds de l'arbre
pub const TREE_TOGGLE_PREFIX: &str = "/tree/toggle/";

/// Enregistre toutes les routes de l'application
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(upload_page)
        .service(upload_submit)
        .service(api_validate)
        .service(processing_page)
        .service(processing_status)
        .service(processing_cancel)
        .service(analysis_page)
        .service(analysis_status)
        .service(analysis_pause)
        .service(analysis_restart)
        .service(results_page)
        .service(results_export)
        .service(tree_svg)
        .service(tree_state)
        .service(tree_toggle)
        .service(tree_hover)
        .service(tree_unhover)
        .service(tree_zoom)
        .service(detailed_view)
        .service(detailed_select)
        .service(detailed_zoom)
        .service(explore_page)
        .service(explore_record)
        .service(download_page)
        .service(download_section)
        .service(download_start)
        .service(download_status)
        .service(new_analysis)
        .service(demo_page)
        .service(health_check);
}

/// Rend un template; une erreur de rendu devient une 500 JSON
fn render(
    data: &AppState,
    key: &SessionKey,
    template: &str,
    ctx: &tera::Context,
    status: StatusCode,
) -> HttpResponse {
    match data.tera.render(template, ctx) {
        Ok(rendered) => {
            let mut builder = HttpResponse::build(status);
            key.attach(&mut builder);
            builder.content_type("text/html; charset=utf-8").body(rendered)
        }
        Err(e) => {
            let e = log_error!(e);
            HttpResponse::InternalServerError().json(
                ErrorResponse::new("Erreur de rendu".to_string(), 500).with_details(e.to_string()),
            )
        }
    }
}

fn page_context(title: &str) -> tera::Context {
    let mut ctx = tera::Context::new();
    ctx.insert("title", title);
    ctx.insert("version", env!("CARGO_PKG_VERSION"));
    ctx
}

fn see_other(key: &SessionKey, location: &str) -> HttpResponse {
    let mut builder = HttpResponse::SeeOther();
    key.attach(&mut builder);
    builder
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// Chemin local du Referer; l'hôte est ignoré
///
/// Un chemin commençant par `//` ou `/\` serait lu comme un autre hôte par le
/// navigateur : il est refusé.
fn referer_path(referer: &str) -> Option<&str> {
    let rest = referer.split_once("://").map_or(referer, |(_, rest)| rest);
    rest.find('/')
        .map(|i| &rest[i..])
        .filter(|path| !path.starts_with("//") && !path.starts_with("/\\"))
}

/// Redirige vers la page d'origine, ou `fallback`
fn back(req: &HttpRequest, key: &SessionKey, fallback: &str) -> HttpResponse {
    let location = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(referer_path)
        .unwrap_or(fallback);
    see_other(key, location)
}

fn not_found(what: &str, details: String) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(what.to_string(), 404).with_details(details))
}

#[derive(Serialize)]
struct SpeciesLink {
    id: String,
    name: String,
}

/// Variables communes des écrans qui embarquent l'arbre
fn insert_tree(ctx: &mut tera::Context, tree: &TreeWidget, now: Instant) {
    let species: Vec<SpeciesLink> = tree
        .visible_ids()
        .into_iter()
        .filter_map(|id| {
            let name = tree.get(&id)?.display_name()?.to_string();
            Some(SpeciesLink { id, name })
        })
        .collect();

    ctx.insert("tree_loading", &tree.is_loading(now));
    ctx.insert("tree_svg", &render_svg(tree, Some(TREE_TOGGLE_PREFIX)));
    ctx.insert("tree_zoom", &format!("{:.0}", tree.zoom() * 100.0));
    ctx.insert("tree_selected", &tree.selected());
    ctx.insert("tree_species", &species);
}

/// Fiche d'exploration avec la classe de son badge de conservation
#[derive(Serialize)]
struct ExploreCard<'a> {
    #[serde(flatten)]
    record: &'a RelatedSequence,
    badge: &'static str,
}

fn insert_results(ctx: &mut tera::Context, results: &AnalysisResults) {
    ctx.insert("results", results);
    ctx.insert("ranks", &results.taxonomy.ranks());
}

/// Page d'accueil
#[get("/")]
#[instrument(skip(data))]
pub async fn index(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    data.session(&key).await.enter_screen(Screen::Home, Instant::now());
    let ctx = page_context("eDNA Analysis");
    render(&data, &key, "index.html", &ctx, StatusCode::OK)
}

/// Formulaire d'upload
#[get("/upload")]
#[instrument(skip(data))]
pub async fn upload_page(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    data.session(&key).await.enter_screen(Screen::Upload, Instant::now());
    let mut ctx = page_context("Upload DNA Sequence");
    ctx.insert("demos", &Demo::ALL);
    ctx.insert("error", &None::<String>);
    ctx.insert("sequence", "");
    render(&data, &key, "upload.html", &ctx, StatusCode::OK)
}

/// Soumission du formulaire d'upload
///
/// Le contenu du fichier est drainé sans être lu : seuls son nom, sa taille
/// et son type comptent. Les champs sont appliqués dans l'ordre de réception.
/// Un fichier refusé est écarté; son erreur n'est montrée que si rien d'autre
/// n'a été fourni.
#[post("/upload")]
#[instrument(skip_all)]
pub async fn upload_submit(
    data: web::Data<AppState>,
    key: SessionKey,
    mut payload: Multipart,
) -> impl Responder {
    let limit = data.config.server.upload_limit;
    let mut form = UploadForm::new();
    let mut rejected = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => {
                warn!("Formulaire multipart invalide: {}", e);
                return HttpResponse::BadRequest().json(
                    ErrorResponse::new("Formulaire invalide".to_string(), 400)
                        .with_details(e.to_string()),
                );
            }
        };

        let (field_name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        let mime = field.content_type().map(|m| m.essence_str().to_string());
        let is_text = field_name.as_deref() == Some("sequence");

        let mut size = 0u64;
        let mut text = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => {
                    size += bytes.len() as u64;
                    if is_text {
                        if text.len() + bytes.len() > limit {
                            warn!(limit, "Séquence collée trop longue");
                            return HttpResponse::PayloadTooLarge().json(
                                ErrorResponse::new("Séquence trop longue".to_string(), 413)
                                    .with_details(format!("limite de {} octets", limit)),
                            );
                        }
                        text.extend_from_slice(&bytes);
                    }
                }
                Err(e) => {
                    warn!("Erreur de lecture du champ: {}", e);
                    return HttpResponse::BadRequest().json(
                        ErrorResponse::new("Formulaire invalide".to_string(), 400)
                            .with_details(e.to_string()),
                    );
                }
            }
        }

        match (field_name.as_deref(), file_name) {
            (Some("file"), Some(name)) if !name.is_empty() => {
                if let Err(e) = form.set_file(UploadedFile { name, size, mime }) {
                    info!(error = %e, "Fichier écarté");
                    rejected = Some(e);
                }
            }
            (Some("sequence"), _) => {
                form.set_sequence(String::from_utf8_lossy(&text).into_owned());
            }
            _ => {}
        }
    }

    let submitted = form.submit().map_err(|e| match (e, rejected) {
        (UploadError::NothingProvided, Some(file_error)) => file_error,
        (e, _) => e,
    });

    match submitted {
        Ok(session) => {
            info!(input = %session.describe(), "Séquence soumise");
            let mut state = data.session(&key).await;
            state.analysis.store(session);
            state.start_processing(Instant::now());
            see_other(&key, "/processing")
        }
        Err(e) => {
            warn!(error = %e, "Upload refusé");
            let mut ctx = page_context("Upload DNA Sequence");
            ctx.insert("demos", &Demo::ALL);
            ctx.insert("error", &e.to_string());
            ctx.insert("sequence", form.sequence());
            render(&data, &key, "upload.html", &ctx, StatusCode::UNPROCESSABLE_ENTITY)
        }
    }
}

/// Validation d'une séquence collée, sans toucher à la session
#[post("/api/validate")]
#[instrument(skip_all)]
pub async fn api_validate(body: web::Json<ValidateRequest>) -> impl Responder {
    let response = match validate_sequence(&body.sequence) {
        Ok(()) => ValidationResponse {
            valid: true,
            error: None,
        },
        Err(e) => ValidationResponse {
            valid: false,
            error: Some(e.to_string()),
        },
    };
    HttpResponse::Ok().json(response)
}

/// Écran de traitement
#[get("/processing")]
#[instrument(skip(data))]
pub async fn processing_page(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let now = Instant::now();
    let mut state = data.session(&key).await;
    state.enter_screen(Screen::Processing, now);
    let input = state.analysis.describe();
    let snapshot = state.processing_run(now).snapshot();
    drop(state);

    let mut ctx = page_context("Processing Sequence");
    ctx.insert("input", &input);
    ctx.insert("run", &snapshot);
    render(&data, &key, "processing.html", &ctx, StatusCode::OK)
}

#[get("/api/processing/status")]
#[instrument(skip(data))]
pub async fn processing_status(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let mut state = data.session(&key).await;
    let snapshot = state.processing_run(Instant::now()).snapshot();
    let mut builder = HttpResponse::Ok();
    key.attach(&mut builder);
    builder.json(snapshot)
}

/// Annule le traitement et revient à l'upload
#[post("/processing/cancel")]
#[instrument(skip(data))]
pub async fn processing_cancel(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let mut state = data.session(&key).await;
    if let Some(run) = state.processing.as_mut() {
        run.cancel();
        info!("Traitement annulé");
    }
    see_other(&key, "/upload")
}

/// Écran d'analyse
#[get("/analysis")]
#[instrument(skip(data))]
pub async fn analysis_page(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let now = Instant::now();
    let mut state = data.session(&key).await;
    state.enter_screen(Screen::Analysis, now);
    let snapshot = state.analysis_run(now).snapshot();
    drop(state);

    let mut ctx = page_context("Sequence Analysis");
    ctx.insert("run", &snapshot);
    render(&data, &key, "analysis.html", &ctx, StatusCode::OK)
}

#[get("/api/analysis/status")]
#[instrument(skip(data))]
pub async fn analysis_status(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let mut state = data.session(&key).await;
    let snapshot = state.analysis_run(Instant::now()).snapshot();
    let mut builder = HttpResponse::Ok();
    key.attach(&mut builder);
    builder.json(snapshot)
}

/// Pause ou reprise de l'analyse
#[post("/analysis/pause")]
#[instrument(skip(data))]
pub async fn analysis_pause(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let now = Instant::now();
    let mut state = data.session(&key).await;
    let run = state.analysis_run(now);
    run.toggle_pause(now);
    info!(paused = run.is_paused(), "Analyse basculée");
    see_other(&key, "/analysis")
}

#[post("/analysis/restart")]
#[instrument(skip(data))]
pub async fn analysis_restart(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let now = Instant::now();
    let mut state = data.session(&key).await;
    state.analysis_run(now).restart(Some(now));
    info!("Analyse relancée");
    see_other(&key, "/analysis")
}

/// Écran de résultats
#[get("/results")]
#[instrument(skip(data))]
pub async fn results_page(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let now = Instant::now();
    let mut ctx = page_context("Analysis Results");
    insert_results(&mut ctx, &AnalysisResults::brown_trout());
    {
        let mut state = data.session(&key).await;
        state.enter_screen(Screen::Results, now);
        insert_tree(&mut ctx, &state.tree, now);
    }
    render(&data, &key, "results.html", &ctx, StatusCode::OK)
}

/// Export rapide : trace la demande et revient à la page
#[post("/results/export")]
#[instrument(skip(req))]
pub async fn results_export(
    req: HttpRequest,
    key: SessionKey,
    query: web::Query<FormatQuery>,
) -> impl Responder {
    match query.format.parse::<ExportFormat>() {
        Ok(format) => {
            quick_export(format);
            back(&req, &key, "/results")
        }
        Err(e) => HttpResponse::BadRequest()
            .json(ErrorResponse::new("Format invalide".to_string(), 400).with_details(e.to_string())),
    }
}

/// L'arbre seul, en SVG
#[get("/tree.svg")]
#[instrument(skip(data))]
pub async fn tree_svg(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let state = data.session(&key).await;
    let svg = render_svg(&state.tree, Some(TREE_TOGGLE_PREFIX));
    let mut builder = HttpResponse::Ok();
    key.attach(&mut builder);
    builder.content_type("image/svg+xml").body(svg)
}

/// État de l'arbre en JSON
#[get("/api/tree")]
#[instrument(skip(data))]
pub async fn tree_state(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let state = data.session(&key).await;
    let tree = &state.tree;
    let mut builder = HttpResponse::Ok();
    key.attach(&mut builder);
    builder.json(serde_json::json!({
        "zoom": tree.zoom(),
        "selected": tree.selected().map(|n| n.id.as_str()),
        "hovered": tree.hovered().map(|n| n.id.as_str()),
        "visible": tree.visible_ids(),
        "collapsed": tree.collapsed_ids(),
        "root": tree.root(),
    }))
}

#[get("/tree/toggle/{id}")]
#[instrument(skip(data, req))]
pub async fn tree_toggle(
    data: web::Data<AppState>,
    req: HttpRequest,
    key: SessionKey,
    id: web::Path<String>,
) -> impl Responder {
    let mut state = data.session(&key).await;
    state.tree.toggle(&id);
    back(&req, &key, "/results")
}

#[get("/tree/hover/{id}")]
#[instrument(skip(data, req))]
pub async fn tree_hover(
    data: web::Data<AppState>,
    req: HttpRequest,
    key: SessionKey,
    id: web::Path<String>,
) -> impl Responder {
    let mut state = data.session(&key).await;
    state.tree.hover(Some(id.as_str()));
    back(&req, &key, "/results")
}

#[get("/tree/unhover")]
#[instrument(skip(data, req))]
pub async fn tree_unhover(
    data: web::Data<AppState>,
    req: HttpRequest,
    key: SessionKey,
) -> impl Responder {
    let mut state = data.session(&key).await;
    state.tree.hover(None);
    back(&req, &key, "/results")
}

#[get("/tree/zoom/{action}")]
#[instrument(skip(data, req))]
pub async fn tree_zoom(
    data: web::Data<AppState>,
    req: HttpRequest,
    key: SessionKey,
    action: web::Path<String>,
) -> impl Responder {
    let mut state = data.session(&key).await;
    match action.as_str() {
        "in" => state.tree.zoom_in(),
        "out" => state.tree.zoom_out(),
        "reset" => state.tree.reset_zoom(),
        other => return not_found("Action de zoom inconnue", other.to_string()),
    }
    back(&req, &key, "/results")
}

/// Vue détaillée : lignée, annotations, alignement
#[get("/detailed-view")]
#[instrument(skip(data))]
pub async fn detailed_view(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let view = {
        let mut state = data.session(&key).await;
        state.enter_screen(Screen::DetailedView, Instant::now());
        state.detail.clone()
    };

    let mut ctx = page_context("Detailed Analysis");
    ctx.insert("zoom_percent", &view.zoom_percent());
    ctx.insert("zoom_scale", &(f64::from(view.zoom_percent()) / 100.0));
    ctx.insert("selected", &view.selected());
    ctx.insert(
        "caption",
        &view
            .caption()
            .map(|(title, text)| serde_json::json!({ "title": title, "text": text })),
    );
    ctx.insert("lineage", &DetailedView::lineage());
    ctx.insert("lineage_paths", DetailedView::lineage_paths());
    ctx.insert("annotations", &DetailedView::annotations());
    ctx.insert("alignment", &DetailedView::alignment());
    ctx.insert("alignment_window", DetailedView::alignment_window());
    render(&data, &key, "detailed_view.html", &ctx, StatusCode::OK)
}

#[get("/detailed-view/select/{id}")]
#[instrument(skip(data))]
pub async fn detailed_select(
    data: web::Data<AppState>,
    key: SessionKey,
    id: web::Path<String>,
) -> impl Responder {
    data.session(&key).await.detail.select(&id);
    see_other(&key, "/detailed-view")
}

#[post("/detailed-view/zoom/{action}")]
#[instrument(skip(data))]
pub async fn detailed_zoom(
    data: web::Data<AppState>,
    key: SessionKey,
    action: web::Path<String>,
) -> impl Responder {
    let mut state = data.session(&key).await;
    match action.as_str() {
        "in" => state.detail.zoom_in(),
        "out" => state.detail.zoom_out(),
        "reset" => state.detail.reset_zoom(),
        other => return not_found("Action de zoom inconnue", other.to_string()),
    }
    see_other(&key, "/detailed-view")
}

/// Exploration des séquences apparentées
#[get("/explore")]
#[instrument(skip(data))]
pub async fn explore_page(
    data: web::Data<AppState>,
    key: SessionKey,
    query: web::Query<ExploreQuery>,
) -> impl Responder {
    data.session(&key).await.enter_screen(Screen::Explore, Instant::now());
    let records = related_sequences();
    let found = filter_and_sort(&records, &query);
    let cards: Vec<ExploreCard<'_>> = found
        .iter()
        .map(|record| ExploreCard {
            record,
            badge: record.conservation_badge(),
        })
        .collect();

    let mut ctx = page_context("Explore Related Sequences");
    ctx.insert("query", &query.into_inner());
    ctx.insert("families", &families(&records));
    ctx.insert("records", &cards);
    ctx.insert("total", &records.len());
    render(&data, &key, "explore.html", &ctx, StatusCode::OK)
}

#[post("/explore/{id}")]
#[instrument(skip(req))]
pub async fn explore_record(
    req: HttpRequest,
    key: SessionKey,
    id: web::Path<String>,
) -> impl Responder {
    match explore_sequence(&related_sequences(), &id) {
        Some(_) => back(&req, &key, "/explore"),
        None => not_found("Séquence non trouvée", id.into_inner()),
    }
}

/// Écran d'export du rapport
#[get("/download")]
#[instrument(skip(data))]
pub async fn download_page(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let now = Instant::now();
    let mut ctx = page_context("Download Report");
    {
        let mut state = data.session(&key).await;
        state.enter_screen(Screen::Download, now);
        ctx.insert("sections", state.download.sections());
        ctx.insert("format", &state.download.format());
        ctx.insert("status", &state.download.status(now));
    }
    render(&data, &key, "download.html", &ctx, StatusCode::OK)
}

#[post("/download/sections/{id}")]
#[instrument(skip(data))]
pub async fn download_section(
    data: web::Data<AppState>,
    key: SessionKey,
    id: web::Path<String>,
) -> impl Responder {
    data.session(&key).await.download.toggle_section(&id);
    see_other(&key, "/download")
}

#[post("/download/start")]
#[instrument(skip(data))]
pub async fn download_start(
    data: web::Data<AppState>,
    key: SessionKey,
    query: web::Query<FormatQuery>,
) -> impl Responder {
    let format = match query.format.parse::<ExportFormat>() {
        Ok(format) => format,
        Err(e) => {
            return HttpResponse::BadRequest().json(
                ErrorResponse::new("Format invalide".to_string(), 400).with_details(e.to_string()),
            )
        }
    };
    let mut state = data.session(&key).await;
    state.download.start(format, Instant::now());
    see_other(&key, "/download")
}

#[get("/api/download/status")]
#[instrument(skip(data))]
pub async fn download_status(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    let state = data.session(&key).await;
    let mut builder = HttpResponse::Ok();
    key.attach(&mut builder);
    builder.json(serde_json::json!({
        "status": state.download.status(Instant::now()),
        "format": state.download.format(),
        "sections": edna_core::report::included_ids(state.download.sections()),
    }))
}

/// Nouvelle analyse : efface la session et revient à l'accueil
#[post("/new-analysis")]
#[instrument(skip(data))]
pub async fn new_analysis(data: web::Data<AppState>, key: SessionKey) -> impl Responder {
    data.session(&key).await.reset();
    info!("Nouvelle analyse");
    see_other(&key, "/")
}

/// Tableaux de bord de démonstration
#[get("/demo/{slug}")]
#[instrument(skip(data))]
pub async fn demo_page(
    data: web::Data<AppState>,
    key: SessionKey,
    slug: web::Path<String>,
) -> impl Responder {
    let demo = match slug.parse::<Demo>() {
        Ok(demo) => demo,
        Err(e) => return not_found("Démo non trouvée", e.to_string()),
    };
    let results = demo.results();

    let now = Instant::now();
    let mut ctx = page_context(&format!("{} Demo", results.taxonomy.common_name));
    ctx.insert("demo", &demo);
    insert_results(&mut ctx, &results);
    {
        let mut state = data.session(&key).await;
        state.enter_screen(Screen::Demo(demo), now);
        ctx.insert("loading", &state.demo_loading(demo, now));
        insert_tree(&mut ctx, &state.tree, now);
    }
    render(&data, &key, "demo.html", &ctx, StatusCode::OK)
}

/// Route pour la santé de l'API
#[get("/health")]
#[instrument]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::SESSION_COOKIE;
    use actix_web::cookie::Cookie;
    use actix_web::dev::ServiceResponse;
    use actix_web::{test, App};
    use std::time::Duration;

    const BOUNDARY: &str = "edna-test-boundary";

    fn state_with(config: AppConfig) -> web::Data<AppState> {
        let tera = tera::Tera::new("templates/*").expect("templates de test");
        web::Data::new(AppState::new(tera, config))
    }

    fn state(fast_forward: f64) -> web::Data<AppState> {
        let mut config = AppConfig::default();
        config.simulation.fast_forward = fast_forward;
        state_with(config)
    }

    /// Corps multipart : (champ, nom de fichier éventuel, contenu)
    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(file) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body.into_bytes()
    }

    fn upload_request(parts: &[(&str, Option<&str>, &str)]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart(parts))
    }

    fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
        resp.response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.into_owned())
            .expect("cookie de session")
    }

    async fn body_text<B: actix_web::body::MessageBody>(resp: ServiceResponse<B>) -> String {
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn test_index_and_health() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Upload &amp; Analyze"));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_pasted_sequence_is_stored_verbatim() {
        let data = state(1.0);
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = upload_request(&[("sequence", None, ">Seq1\nATCGATCG")]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/processing");
        let cookie = session_cookie(&resp);

        {
            let sessions = data.sessions.read().await;
            let session = &sessions[cookie.value()];
            assert_eq!(session.analysis.pasted_sequence.as_deref(), Some(">Seq1\nATCGATCG"));
            assert!(session.processing.is_some());
        }

        let req = test::TestRequest::get()
            .uri("/api/processing/status")
            .cookie(cookie)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["steps"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_upload_errors_are_shown_inline() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let cases = [
            (vec![("sequence", None, "ATCGX")], "Invalid DNA sequence"),
            (vec![("sequence", None, "   ")], "Please upload a file or paste a DNA sequence"),
            (vec![("file", Some("photo.png"), "...")], "Please upload a valid FASTA or CSV file"),
        ];
        for (parts, message) in cases {
            let resp = test::call_service(&app, upload_request(&parts).to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body_text(resp).await.contains(message), "{}", message);
        }
    }

    #[actix_web::test]
    async fn test_file_accepted_on_extension() {
        let data = state(1.0);
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = upload_request(&[
            ("file", Some("sample.FASTA"), "not even dna"),
            ("sequence", None, ""),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let cookie = session_cookie(&resp);
        let sessions = data.sessions.read().await;
        assert_eq!(
            sessions[cookie.value()].analysis.uploaded_file.as_deref(),
            Some("sample.FASTA")
        );
    }

    #[actix_web::test]
    async fn test_tree_toggle_hides_subtree() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/tree.svg").to_request()).await;
        let cookie = session_cookie(&resp);
        assert!(body_text(resp).await.contains("Atlantic salmon"));

        let req = test::TestRequest::get()
            .uri("/tree/toggle/branch7")
            .cookie(cookie.clone())
            .insert_header((header::REFERER, "http://localhost:8080/demo/trout"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/demo/trout");

        let req = test::TestRequest::get().uri("/tree.svg").cookie(cookie).to_request();
        let svg = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
        assert!(!svg.contains("Atlantic salmon"));
    }

    #[actix_web::test]
    async fn test_unknown_tree_node_is_ignored() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/tree/toggle/nope").to_request(),
        )
        .await;
        let cookie = session_cookie(&resp);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/results");

        let req = test::TestRequest::get().uri("/api/tree").cookie(cookie).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["selected"].is_null());
        assert_eq!(body["collapsed"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_explore_filters_by_name() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/explore?text=salmo&sort=name")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Salmo salar"));
        assert!(!body.contains("Hucho hucho"));
    }

    #[actix_web::test]
    async fn test_demo_pages() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/demo/salmon").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Loading"));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/demo/whitefish").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_analysis_pause_freezes_run() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::post().uri("/analysis/pause").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&resp);

        let req = test::TestRequest::get()
            .uri("/api/analysis/status")
            .cookie(cookie.clone())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "paused");

        let req = test::TestRequest::post()
            .uri("/analysis/restart")
            .cookie(cookie.clone())
            .to_request();
        test::call_service(&app, req).await;
        let req = test::TestRequest::get()
            .uri("/api/analysis/status")
            .cookie(cookie)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_ne!(body["status"], "paused");
    }

    #[actix_web::test]
    async fn test_download_flow() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/download/sections/alignment").to_request(),
        )
        .await;
        let cookie = session_cookie(&resp);

        let req = test::TestRequest::post()
            .uri("/download/start?format=csv")
            .cookie(cookie.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get()
            .uri("/api/download/status")
            .cookie(cookie.clone())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "downloading");
        assert_eq!(body["format"], "csv");
        assert_eq!(body["sections"].as_array().unwrap().len(), 6);

        let req = test::TestRequest::post()
            .uri("/download/start?format=docx")
            .cookie(cookie)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_new_analysis_clears_session() {
        let data = state(1.0);
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let resp = test::call_service(&app, upload_request(&[("sequence", None, "ACGT")]).to_request()).await;
        let cookie = session_cookie(&resp);

        let req = test::TestRequest::post()
            .uri("/new-analysis")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

        let sessions = data.sessions.read().await;
        assert!(sessions[cookie.value()].analysis.is_empty());
    }

    #[::core::prelude::v1::test]
    fn test_referer_path() {
        assert_eq!(referer_path("http://localhost:8080/results"), Some("/results"));
        assert_eq!(referer_path("https://example.org/demo/salmon?x=1"), Some("/demo/salmon?x=1"));
        assert_eq!(referer_path("http://localhost"), None);
        assert_eq!(referer_path("http://x//evil.com/p"), None);
        assert_eq!(referer_path("http://x/\\evil.com"), None);
    }

    #[actix_web::test]
    async fn test_foreign_referer_falls_back() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/tree/zoom/in")
            .insert_header((header::REFERER, "http://x//evil.com/p"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/results");
    }

    #[actix_web::test]
    async fn test_results_entry_shows_tree_loading() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/upload").to_request()).await;
        let cookie = session_cookie(&resp);

        // Le chargement initial de la session est écoulé
        tokio::time::sleep(Duration::from_millis(2100)).await;

        let req = test::TestRequest::get().uri("/results").cookie(cookie.clone()).to_request();
        let body = body_text(test::call_service(&app, req).await).await;
        assert!(body.contains("Loading phylogenetic tree"));

        // Une interaction sur l'arbre revient sur le même écran sans recharger
        let req = test::TestRequest::get()
            .uri("/tree/toggle/branch7")
            .cookie(cookie.clone())
            .insert_header((header::REFERER, "http://localhost:8080/results"))
            .to_request();
        test::call_service(&app, req).await;
        tokio::time::sleep(Duration::from_millis(2100)).await;
        let req = test::TestRequest::get().uri("/results").cookie(cookie).to_request();
        let body = body_text(test::call_service(&app, req).await).await;
        assert!(!body.contains("Loading phylogenetic tree"));
    }

    #[actix_web::test]
    async fn test_rejected_file_does_not_block_pasted_sequence() {
        let data = state(1.0);
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let orders = [
            vec![("file", Some("photo.png"), "..."), ("sequence", None, ">Seq1\nACGT")],
            vec![("sequence", None, ">Seq1\nACGT"), ("file", Some("photo.png"), "...")],
        ];
        for parts in orders {
            let resp = test::call_service(&app, upload_request(&parts).to_request()).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/processing");

            let cookie = session_cookie(&resp);
            let sessions = data.sessions.read().await;
            let analysis = &sessions[cookie.value()].analysis;
            assert_eq!(analysis.uploaded_file, None);
            assert_eq!(analysis.pasted_sequence.as_deref(), Some(">Seq1\nACGT"));
        }
    }

    #[actix_web::test]
    async fn test_new_submission_replaces_previous_input() {
        let app = test::init_service(App::new().app_data(state(1.0)).configure(configure)).await;

        let resp = test::call_service(
            &app,
            upload_request(&[("file", Some("a.fasta"), "...")]).to_request(),
        )
        .await;
        let cookie = session_cookie(&resp);

        let req = upload_request(&[("sequence", None, "ACGT")])
            .cookie(cookie.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get().uri("/processing").cookie(cookie).to_request();
        let body = body_text(test::call_service(&app, req).await).await;
        assert!(body.contains("Input: Pasted sequence (4 characters)"));
        assert!(!body.contains("a.fasta"));
    }

    #[actix_web::test]
    async fn test_pasted_text_over_limit_is_refused() {
        let mut config = AppConfig::default();
        config.server.upload_limit = 8;
        let data = state_with(config);
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = upload_request(&[("sequence", None, "ACGTACGTACGT")]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(data.sessions.read().await.is_empty());

        let req = upload_request(&[("sequence", None, "ACGT")]).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);
    }

    #[actix_web::test]
    async fn test_cancel_returns_to_upload_and_restarts() {
        let data = state(1.0);
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let resp = test::call_service(&app, upload_request(&[("sequence", None, "ACGT")]).to_request()).await;
        let cookie = session_cookie(&resp);

        let req = test::TestRequest::post()
            .uri("/processing/cancel")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/upload");
        {
            let sessions = data.sessions.read().await;
            let run = sessions[cookie.value()].processing.as_ref().unwrap();
            assert!(run.is_cancelled());
        }

        let req = test::TestRequest::get()
            .uri("/api/processing/status")
            .cookie(cookie)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_ne!(body["status"], "cancelled");
        assert_eq!(body["percent"], 0.0);
    }
}

//! Modèles de données pour le serveur web

use actix_web::cookie::Cookie;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponseBuilder};
use edna_core::{
    AnalysisSession, Demo, DetailedView, DownloadJob, Pipeline, ProgressRun, TreeWidget,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::{ready, Ready};
use std::time::{Duration, Instant};
use tokio::sync::{RwLockMappedWriteGuard, RwLock, RwLockWriteGuard};
use uuid::Uuid;

use crate::config::{AppConfig, SimulationConfig};

/// Nom du cookie portant l'identifiant de session
pub const SESSION_COOKIE: &str = "edna_session";

/// État global de l'application
#[derive(Debug)]
pub struct AppState {
    pub tera: tera::Tera,
    pub sessions: RwLock<HashMap<String, SessionState>>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(tera: tera::Tera, config: AppConfig) -> Self {
        Self {
            tera,
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Session du navigateur, créée à la première visite
    ///
    /// Chaque accès rafraîchit la session demandée et oublie celles restées
    /// inactives plus de `server.session_ttl_secs`.
    pub async fn session(&self, key: &SessionKey) -> RwLockMappedWriteGuard<'_, SessionState> {
        let mut sessions = self.sessions.write().await;
        let ttl = Duration::from_secs(self.config.server.session_ttl_secs);
        let now = chrono::Utc::now();

        let before = sessions.len();
        sessions.retain(|id, state| *id == key.id || state.idle_for(now) < ttl);
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "Sessions inactives oubliées");
        }

        let simulation = &self.config.simulation;
        RwLockWriteGuard::map(sessions, |map| {
            let state = map.entry(key.id.clone()).or_insert_with(|| {
                tracing::debug!(session = %key.id, "Nouvelle session");
                SessionState::new(simulation)
            });
            state.touch();
            state
        })
    }
}

/// Écrans de l'application, pour savoir quand on en change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Upload,
    Processing,
    Analysis,
    Results,
    DetailedView,
    Explore,
    Download,
    Demo(Demo),
}

impl Screen {
    /// Écrans qui embarquent l'arbre phylogénétique
    pub fn shows_tree(self) -> bool {
        matches!(self, Screen::Results | Screen::Demo(_))
    }
}

/// Tout l'état d'un navigateur, d'un écran à l'autre
#[derive(Debug)]
pub struct SessionState {
    /// Les deux chaînes conservées entre l'upload et le traitement
    pub analysis: AnalysisSession,
    pub processing: Option<ProgressRun>,
    pub analysis_run: Option<ProgressRun>,
    pub tree: TreeWidget,
    pub detail: DetailedView,
    pub download: DownloadJob,
    pub demo_opened: Option<(Demo, Instant)>,
    /// Dernier écran affiché
    pub screen: Option<Screen>,
    fast_forward: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SessionState {
    pub fn new(simulation: &SimulationConfig) -> Self {
        let now = chrono::Utc::now();
        let factor = simulation.fast_forward;
        Self {
            analysis: AnalysisSession::default(),
            processing: None,
            analysis_run: None,
            tree: TreeWidget::fish(Instant::now()),
            detail: DetailedView::new(),
            download: DownloadJob::new().with_delay(scaled(edna_core::report::DOWNLOAD_DELAY, factor)),
            demo_opened: None,
            screen: None,
            fast_forward: factor,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }

    /// Inactivité depuis le dernier accès
    pub fn idle_for(&self, now: chrono::DateTime<chrono::Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or_default()
    }

    /// Affichage de `screen`; arriver d'un autre écran sur l'arbre relance
    /// son chargement
    pub fn enter_screen(&mut self, screen: Screen, now: Instant) {
        if self.screen == Some(screen) {
            return;
        }
        self.screen = Some(screen);
        if screen.shows_tree() {
            let delay = scaled(edna_core::tree::LOADING_DELAY, self.fast_forward);
            self.tree.restart_loading(now, delay);
        }
    }

    /// Démarre (ou redémarre) le traitement à `now`
    pub fn start_processing(&mut self, now: Instant) {
        let pipeline = Pipeline::processing().fast_forward(self.fast_forward);
        self.processing = Some(ProgressRun::started_at(pipeline, now));
        self.analysis_run = None;
    }

    /// Traitement courant, démarré s'il n'existe pas ou a été annulé
    pub fn processing_run(&mut self, now: Instant) -> &mut ProgressRun {
        if self.processing.as_ref().map_or(true, ProgressRun::is_cancelled) {
            self.processing = None;
            self.analysis_run = None;
        }
        let factor = self.fast_forward;
        let run = self.processing.get_or_insert_with(|| {
            ProgressRun::started_at(Pipeline::processing().fast_forward(factor), now)
        });
        run.sync(now);
        run
    }

    /// Analyse courante, démarrée à la première visite
    pub fn analysis_run(&mut self, now: Instant) -> &mut ProgressRun {
        let factor = self.fast_forward;
        let run = self.analysis_run.get_or_insert_with(|| {
            ProgressRun::started_at(Pipeline::analysis().fast_forward(factor), now)
        });
        run.sync(now);
        run
    }

    /// Écran de démo : vrai tant que le chargement simulé n'est pas écoulé
    pub fn demo_loading(&mut self, demo: Demo, now: Instant) -> bool {
        let opened = match self.demo_opened {
            Some((current, at)) if current == demo => at,
            _ => {
                self.demo_opened = Some((demo, now));
                now
            }
        };
        now.saturating_duration_since(opened)
            < scaled(edna_core::results::DEMO_LOADING_DELAY, self.fast_forward)
    }

    /// Nouvelle analyse : efface l'entrée et remet tous les écrans à zéro
    pub fn reset(&mut self) {
        self.analysis.clear();
        self.processing = None;
        self.analysis_run = None;
        self.tree = TreeWidget::fish(Instant::now());
        self.detail = DetailedView::new();
        self.download.reset();
        self.demo_opened = None;
        self.screen = None;
        self.touch();
    }
}

fn scaled(delay: Duration, factor: f64) -> Duration {
    if factor > 0.0 && factor.is_finite() {
        delay.div_f64(factor)
    } else {
        delay
    }
}

/// Identifiant de session lu dans le cookie, ou fraîchement tiré
#[derive(Debug, Clone)]
pub struct SessionKey {
    pub id: String,
    fresh: bool,
}

impl SessionKey {
    /// Pose le cookie sur la réponse si la session vient d'être créée
    pub fn attach(&self, builder: &mut HttpResponseBuilder) {
        if self.fresh {
            let mut cookie = Cookie::new(SESSION_COOKIE, self.id.clone());
            cookie.set_path("/");
            cookie.set_http_only(true);
            builder.cookie(cookie);
        }
    }
}

impl FromRequest for SessionKey {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let key = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => SessionKey {
                id: cookie.value().to_string(),
                fresh: false,
            },
            None => SessionKey {
                id: Uuid::new_v4().to_string(),
                fresh: true,
            },
        };
        ready(Ok(key))
    }
}

/// Réponse d'erreur standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: String, code: u16) -> Self {
        Self {
            error,
            details: None,
            code,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// Réponse de validation de l'API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Requête de validation d'une séquence collée
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    pub sequence: String,
}

/// Paramètre de format des exports
#[derive(Debug, Clone, Deserialize)]
pub struct FormatQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "pdf".to_string()
}

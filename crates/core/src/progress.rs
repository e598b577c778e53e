//! Simulation de progression des écrans de traitement et d'analyse
//!
//! Aucun calcul ne se cache derrière les étapes : c'est une animation scriptée.
//! La machine à états ne dépend d'aucun ordonnanceur. Elle accumule du temps
//! simulé via [`ProgressRun::advance`], ou du temps réel via
//! [`ProgressRun::sync`], et la phase courante se déduit du temps écoulé.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Étape nommée avec sa durée scriptée
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub id: String,
    pub label: String,
    pub description: String,
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl StepSpec {
    pub fn new(id: &str, label: &str, description: &str, duration_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            duration: Duration::from_millis(duration_ms),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Liste ordonnée d'étapes avec le délai initial et la pause entre étapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub steps: Vec<StepSpec>,
    #[serde(with = "millis")]
    pub start_delay: Duration,
    #[serde(with = "millis")]
    pub settle_pause: Duration,
}

impl Pipeline {
    /// Écran de traitement : validation, préparation, initialisation
    pub fn processing() -> Self {
        Self {
            steps: vec![
                StepSpec::new(
                    "validate",
                    "Validating Sequence",
                    "Checking file format and sequence integrity",
                    2000,
                ),
                StepSpec::new(
                    "prepare",
                    "Preparing Data",
                    "Formatting sequences for analysis pipeline",
                    3000,
                ),
                StepSpec::new(
                    "ready",
                    "Ready for Analysis",
                    "Initializing bioinformatics algorithms",
                    1500,
                ),
            ],
            start_delay: Duration::from_millis(1000),
            settle_pause: Duration::from_millis(500),
        }
    }

    /// Écran d'analyse : BLAST, Clustal Omega, taxonomie, données biologiques
    pub fn analysis() -> Self {
        Self {
            steps: vec![
                StepSpec::new(
                    "blast",
                    "BLAST Sequence Alignment",
                    "Comparing against NCBI database for sequence matches",
                    4000,
                ),
                StepSpec::new(
                    "clustal",
                    "Clustal Omega Analysis",
                    "Multiple sequence alignment and phylogenetic analysis",
                    5000,
                ),
                StepSpec::new(
                    "taxonomy",
                    "Taxonomic Classification",
                    "Identifying species and building family relationships",
                    3000,
                ),
                StepSpec::new(
                    "images",
                    "Biological Data Retrieval",
                    "Fetching organism images and ecological information",
                    2000,
                ),
            ],
            start_delay: Duration::from_millis(1000),
            settle_pause: Duration::from_millis(800),
        }
    }

    /// Divise toutes les durées par `factor` (> 1 accélère)
    pub fn fast_forward(mut self, factor: f64) -> Self {
        if factor > 0.0 && factor.is_finite() {
            let scale = |d: Duration| Duration::from_nanos((d.as_nanos() as f64 / factor).round() as u64);
            for step in &mut self.steps {
                step.duration = scale(step.duration);
            }
            self.start_delay = scale(self.start_delay);
            self.settle_pause = scale(self.settle_pause);
        }
        self
    }

    /// Temps simulé au bout duquel la progression est complète
    pub fn total_duration(&self) -> Duration {
        let steps: Duration = self.steps.iter().map(|s| s.duration + self.settle_pause).sum();
        self.start_delay + steps
    }
}

/// Phase dérivée du temps écoulé
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Délai initial avant la première étape
    Idle,
    /// Étape `step` en cours, `fraction` dans [0, 1)
    Running { step: usize, fraction: f64 },
    /// Pause fixe après la fin de l'étape `step`
    Settling { step: usize },
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Cancelled,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Current,
    Pending,
}

/// Une exécution de la simulation
#[derive(Debug, Clone)]
pub struct ProgressRun {
    pipeline: Pipeline,
    elapsed: Duration,
    paused: bool,
    cancelled: bool,
    anchor: Option<Instant>,
}

impl ProgressRun {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            elapsed: Duration::ZERO,
            paused: false,
            cancelled: false,
            anchor: None,
        }
    }

    /// Démarre une exécution pilotée par l'horloge, ancrée à `now`
    pub fn started_at(pipeline: Pipeline, now: Instant) -> Self {
        let mut run = Self::new(pipeline);
        run.anchor = Some(now);
        run
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == Phase::Complete
    }

    /// Le temps ne s'accumule ni en pause, ni après annulation ou fin
    fn accepts_time(&self) -> bool {
        !self.paused && !self.cancelled && !self.is_complete()
    }

    /// Avance le temps simulé de `dt`
    pub fn advance(&mut self, dt: Duration) {
        if !self.accepts_time() {
            return;
        }
        let total = self.pipeline.total_duration();
        self.elapsed = (self.elapsed + dt).min(total);
        if self.is_complete() {
            tracing::debug!(elapsed_ms = self.elapsed.as_millis() as u64, "Simulation terminée");
        }
    }

    /// Avance du temps réel écoulé depuis le dernier ancrage, puis ré-ancre à `now`
    pub fn sync(&mut self, now: Instant) {
        if let Some(anchor) = self.anchor {
            self.advance(now.saturating_duration_since(anchor));
        }
        self.anchor = if self.accepts_time() { Some(now) } else { None };
    }

    /// Fige le pourcentage courant
    pub fn pause(&mut self) {
        if self.cancelled || self.is_complete() {
            return;
        }
        self.paused = true;
        self.anchor = None;
    }

    /// Reprend exactement au pourcentage figé, avec une nouvelle base de temps
    pub fn resume(&mut self, now: Instant) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.anchor = Some(now);
    }

    /// Pause/reprise selon l'état courant
    pub fn toggle_pause(&mut self, now: Instant) {
        if self.paused {
            self.resume(now);
        } else {
            self.sync(now);
            self.pause();
        }
    }

    pub fn cancel(&mut self) {
        if self.is_complete() {
            return;
        }
        self.cancelled = true;
        self.anchor = None;
    }

    /// Repart de zéro, non pausé; l'ancrage éventuel est fixé à `now`
    pub fn restart(&mut self, now: Option<Instant>) {
        self.elapsed = Duration::ZERO;
        self.paused = false;
        self.cancelled = false;
        self.anchor = now;
    }

    pub fn phase(&self) -> Phase {
        let pipeline = &self.pipeline;
        if self.elapsed < pipeline.start_delay {
            return Phase::Idle;
        }

        let mut t = self.elapsed - pipeline.start_delay;
        for (i, step) in pipeline.steps.iter().enumerate() {
            if t < step.duration {
                let fraction = t.as_secs_f64() / step.duration.as_secs_f64();
                return Phase::Running { step: i, fraction };
            }
            t -= step.duration;
            if t < pipeline.settle_pause {
                return Phase::Settling { step: i };
            }
            t -= pipeline.settle_pause;
        }
        Phase::Complete
    }

    pub fn status(&self) -> RunStatus {
        if self.cancelled {
            RunStatus::Cancelled
        } else if self.is_complete() {
            RunStatus::Complete
        } else if self.paused {
            RunStatus::Paused
        } else if self.phase() == Phase::Idle {
            RunStatus::Idle
        } else {
            RunStatus::Running
        }
    }

    /// Index de l'étape affichée comme courante
    pub fn current_step(&self) -> usize {
        match self.phase() {
            Phase::Idle => 0,
            Phase::Running { step, .. } | Phase::Settling { step } => step,
            Phase::Complete => self.pipeline.steps.len().saturating_sub(1),
        }
    }

    /// Pourcentage global dans [0, 100]
    pub fn percent(&self) -> f64 {
        let n = self.pipeline.steps.len().max(1) as f64;
        match self.phase() {
            Phase::Idle => 0.0,
            Phase::Running { step, fraction } => (step as f64 + fraction) / n * 100.0,
            Phase::Settling { step } => (step as f64 + 1.0) / n * 100.0,
            Phase::Complete => 100.0,
        }
    }

    pub fn step_status(&self, index: usize) -> StepStatus {
        if self.is_complete() {
            return StepStatus::Completed;
        }
        let current = self.current_step();
        match index.cmp(&current) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal if !self.cancelled => StepStatus::Current,
            _ => StepStatus::Pending,
        }
    }

    /// Message d'état affiché sous la barre
    pub fn message(&self) -> String {
        match self.status() {
            RunStatus::Complete => "Your sequence has been successfully processed.".to_string(),
            RunStatus::Cancelled => "Processing cancelled.".to_string(),
            RunStatus::Paused => "Analysis paused".to_string(),
            RunStatus::Idle | RunStatus::Running => match self.pipeline.steps.get(self.current_step()) {
                Some(step) => format!("Currently {}...", step.label.to_lowercase()),
                None => String::new(),
            },
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let steps = self
            .pipeline
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepView {
                id: step.id.clone(),
                label: step.label.clone(),
                description: step.description.clone(),
                status: self.step_status(i),
            })
            .collect();

        ProgressSnapshot {
            status: self.status(),
            current_step: self.current_step(),
            current_label: self
                .pipeline
                .steps
                .get(self.current_step())
                .map(|s| s.label.clone())
                .unwrap_or_default(),
            percent: self.percent(),
            message: self.message(),
            steps,
        }
    }
}

/// Vue sérialisable d'une étape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepView {
    pub id: String,
    pub label: String,
    pub description: String,
    pub status: StepStatus,
}

/// Vue sérialisable de l'exécution, pour les templates et l'API JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: RunStatus,
    pub current_step: usize,
    pub current_label: String,
    pub percent: f64,
    pub message: String,
    pub steps: Vec<StepView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_processing_total_duration() {
        // 1000 + (2000 + 3000 + 1500) + 3 * 500
        assert_eq!(Pipeline::processing().total_duration(), ms(9000));
        assert_eq!(Pipeline::analysis().total_duration(), ms(1000 + 14000 + 4 * 800));
    }

    #[test]
    fn test_idle_before_start_delay() {
        let mut run = ProgressRun::new(Pipeline::processing());
        run.advance(ms(999));
        assert_eq!(run.phase(), Phase::Idle);
        assert_eq!(run.status(), RunStatus::Idle);
        assert_eq!(run.percent(), 0.0);
    }

    #[test]
    fn test_percent_is_continuous_within_step() {
        let mut run = ProgressRun::new(Pipeline::processing());
        run.advance(ms(1000 + 1000));
        assert_eq!(run.phase(), Phase::Running { step: 0, fraction: 0.5 });
        assert!((run.percent() - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_settling_holds_step_end() {
        let mut run = ProgressRun::new(Pipeline::processing());
        run.advance(ms(1000 + 2000 + 200));
        assert_eq!(run.phase(), Phase::Settling { step: 0 });
        assert!((run.percent() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(run.current_step(), 0);

        run.advance(ms(300));
        assert_eq!(run.phase(), Phase::Running { step: 1, fraction: 0.0 });
        assert_eq!(run.step_status(0), StepStatus::Completed);
        assert_eq!(run.step_status(1), StepStatus::Current);
        assert_eq!(run.step_status(2), StepStatus::Pending);
    }

    #[test]
    fn test_completes_exactly_at_total() {
        let mut run = ProgressRun::new(Pipeline::processing());
        run.advance(ms(8999));
        assert!(!run.is_complete());
        run.advance(ms(1));
        assert!(run.is_complete());
        assert_eq!(run.percent(), 100.0);
        assert_eq!(run.snapshot().status, RunStatus::Complete);
    }

    #[test]
    fn test_pause_freezes_percentage() {
        let mut run = ProgressRun::new(Pipeline::analysis());
        run.advance(ms(3000));
        run.pause();
        let frozen = run.percent();
        run.advance(ms(5000));
        assert_eq!(run.percent(), frozen);
        assert_eq!(run.status(), RunStatus::Paused);
    }

    #[test]
    fn test_resume_uses_fresh_baseline() {
        let t0 = Instant::now();
        let mut run = ProgressRun::started_at(Pipeline::analysis(), t0);
        run.sync(t0 + ms(3000));
        run.toggle_pause(t0 + ms(3000));
        let frozen = run.percent();

        // Long pause, the bar must not jump on resume
        let t_resume = t0 + ms(60_000);
        run.toggle_pause(t_resume);
        run.sync(t_resume);
        assert_eq!(run.percent(), frozen);

        run.sync(t_resume + ms(1000));
        assert_eq!(run.elapsed(), ms(4000));
    }

    #[test]
    fn test_cancel_stops_time() {
        let mut run = ProgressRun::new(Pipeline::processing());
        run.advance(ms(2500));
        run.cancel();
        run.advance(ms(10_000));
        assert_eq!(run.status(), RunStatus::Cancelled);
        assert_eq!(run.elapsed(), ms(2500));
        assert_eq!(run.step_status(0), StepStatus::Pending);
    }

    #[test]
    fn test_restart_returns_to_idle() {
        let mut run = ProgressRun::new(Pipeline::analysis());
        run.advance(ms(20_000));
        assert!(run.is_complete());
        run.restart(None);
        assert_eq!(run.status(), RunStatus::Idle);
        assert_eq!(run.percent(), 0.0);
    }

    #[test]
    fn test_message_names_current_step() {
        let mut run = ProgressRun::new(Pipeline::processing());
        run.advance(ms(4000));
        assert_eq!(run.message(), "Currently preparing data...");
    }

    #[test]
    fn test_fast_forward_scales_durations() {
        let pipeline = Pipeline::processing().fast_forward(10.0);
        assert_eq!(pipeline.total_duration(), ms(900));
    }
}

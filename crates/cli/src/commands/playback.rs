//! Lecture des simulations de traitement et d'analyse dans le terminal

use crate::commands::validate;
use crate::{create_progress_bar, InputArgs};
use anyhow::{bail, Result};
use console::style;
use edna_core::{Pipeline, ProgressRun, StepStatus};
use std::time::{Duration, Instant};

/// Période de rafraîchissement de la barre
const TICK: Duration = Duration::from_millis(50);

pub fn process(input: &InputArgs, speed: f64) -> Result<()> {
    let session = validate::submit(input)?;
    println!("🧬 Traitement de: {}", session.describe());

    let run = play(Pipeline::processing(), speed)?;
    println!("{}", style(run.message()).green());
    Ok(())
}

pub fn analyze(speed: f64) -> Result<()> {
    println!("🔬 Analyse de la séquence");

    play(Pipeline::analysis(), speed)?;
    println!("{}", style("Analysis complete.").green());
    Ok(())
}

fn check_speed(speed: f64) -> Result<f64> {
    if speed > 0.0 && speed.is_finite() {
        Ok(speed)
    } else {
        bail!("Facteur de vitesse invalide: {}", speed)
    }
}

/// Joue le pipeline sur l'horloge murale, accélérée de `speed`
fn play(pipeline: Pipeline, speed: f64) -> Result<ProgressRun> {
    let pipeline = pipeline.fast_forward(check_speed(speed)?);
    let labels: Vec<String> = pipeline.steps.iter().map(|s| s.label.clone()).collect();
    tracing::info!(
        steps = labels.len(),
        total_ms = pipeline.total_duration().as_millis() as u64,
        "Lecture de la simulation"
    );

    let pb = create_progress_bar(100, "Starting...");
    let mut run = ProgressRun::started_at(pipeline, Instant::now());
    let mut announced = 0;

    while !run.is_complete() {
        std::thread::sleep(TICK);
        run.sync(Instant::now());

        pb.set_position(run.percent().floor() as u64);
        pb.set_message(run.message());
        while announced < labels.len() && run.step_status(announced) == StepStatus::Completed {
            pb.println(format!("{} {}", style("✓").green().bold(), labels[announced]));
            announced += 1;
        }
    }

    pb.finish_with_message("Done");
    Ok(run)
}

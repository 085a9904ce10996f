use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tokio::sync::mpsc;

use flowstate::{
    models::CreativeOutputSignal, CoherenceVariables, ConfigStore, GctCoherenceSource,
    ProcessState, SampleInput, SamplerController, SessionRegistry,
};

const SAMPLES: i64 = 60;
const HORIZON_MINUTES: u32 = 30;
const JITTER: f64 = 0.03;

/// Replays a synthetic session: activation climbs towards a flow plateau,
/// then consistency collapses. Usage: `flowstate-replay [config.json]`.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ConfigStore::new(PathBuf::from(path))?.config(),
        None => Default::default(),
    };

    let registry = SessionRegistry::new();
    let (session_id, session) = registry.create(config).await?;
    log::info!("replaying {SAMPLES} samples into session {session_id}");

    let (tx, rx) = mpsc::channel(16);
    let mut sampler = SamplerController::new();
    sampler.start(session.clone(), GctCoherenceSource::default(), rx)?;

    let mut rng = StdRng::seed_from_u64(7);
    let start = Utc::now();
    for minute in 0..SAMPLES {
        tx.send(synthetic_sample(&mut rng, start + Duration::minutes(minute), minute))
            .await
            .context("sampler stopped early")?;
    }
    drop(tx);
    let report = sampler.finish().await?;

    let session = session.lock().await;
    for record in session.history() {
        println!("{}", serde_json::to_string(record)?);
    }

    if let Some(latest) = session.latest() {
        for rec in &latest.recommendations {
            log::info!("[{}] {}: {}", rec.urgency.as_str(), rec.category, rec.rationale);
        }
    }

    let forecast = session.predict(HORIZON_MINUTES);
    match forecast.as_ready() {
        Some(forecast) => {
            for intervention in &forecast.interventions {
                log::info!(
                    "+{}m {}: {}",
                    intervention.offset_minutes,
                    intervention.kind.as_str(),
                    intervention.rationale
                );
            }
        }
        None => log::warn!("not enough history for a {HORIZON_MINUTES}m forecast"),
    }

    let summary = json!({
        "report": report,
        "summary": session.summary(),
        "forecast": forecast,
        "environment": session.environment_for(ProcessState::Flow),
        "breakthroughs": session.breakthroughs().iter().map(|r| r.sample_index).collect::<Vec<_>>(),
        "flowEpisodes": session.flow_episodes(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn synthetic_sample(rng: &mut StdRng, at: chrono::DateTime<Utc>, minute: i64) -> SampleInput {
    let progress = minute as f64 / SAMPLES as f64;
    let (consistency, depth, activation, connection) = if progress < 0.7 {
        (
            0.3 + 0.6 * progress,
            0.2 + 0.8 * progress,
            0.1 + 0.6 * progress,
            0.4 + 0.5 * progress,
        )
    } else {
        let fall = (progress - 0.7) / 0.3;
        (0.72 - 0.6 * fall, 0.76 - 0.4 * fall, 0.52 + 0.4 * fall, 0.75 - 0.5 * fall)
    };

    let mut jitter = |v: f64| (v + rng.gen_range(-JITTER..JITTER)).clamp(0.0, 1.0);
    SampleInput::new(CoherenceVariables::at(
        jitter(consistency),
        jitter(depth),
        jitter(activation),
        jitter(connection),
        at,
    ))
    .with_output(CreativeOutputSignal::new(0.4 + 0.5 * progress))
}

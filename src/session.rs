/// Per-session context tying ingest, smoothing, history and scoring together
use log::{debug, info};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::config::StreamConfig;
use crate::diagnostics::{self, SensorHealthReport, TrendForecast};
use crate::history::History;
use crate::ingest::{Delivery, Ingest, ReadingSource};
use crate::models::{Calibration, Reading, RiskAssessment, StreamStatus};
use crate::risk;
use crate::smoothing::Smoother;
use crate::utils::format_datetime;

/// What the display layer sees after each tick
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: StreamStatus,
    pub latest: Option<Reading>,
    pub assessment: Option<RiskAssessment>,
    pub history: Vec<Reading>,
    pub health: SensorHealthReport,
    pub trends: TrendForecast,
    /// `None` until the first poll completes
    pub trust_score: Option<f64>,
}

pub struct TelemetrySession<S> {
    ingest: Ingest<S>,
    smoother: Smoother,
    calibration: Calibration,
    history: History,
    poll_interval: Duration,
    status: StreamStatus,
    latest: Option<Reading>,
    assessment: Option<RiskAssessment>,
    trust_score: Option<f64>,
}

impl<S: ReadingSource> TelemetrySession<S> {
    pub fn new(config: &StreamConfig, source: S) -> Self {
        TelemetrySession {
            ingest: Ingest::new(source, config.disconnect_after),
            smoother: Smoother::new(config.smoothing_weight),
            calibration: config.calibration,
            history: History::new(config.history_capacity),
            poll_interval: config.poll_interval,
            status: StreamStatus::Connecting,
            latest: None,
            assessment: None,
            trust_score: None,
        }
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        self.assessment.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            latest: self.latest.clone(),
            assessment: self.assessment.clone(),
            history: self.history.to_vec(),
            health: diagnostics::check_health(&self.history),
            trends: diagnostics::predict_trends(&self.history),
            trust_score: self.trust_score,
        }
    }

    /// Run one ingest, smooth and score cycle
    pub async fn tick(&mut self) -> SessionSnapshot {
        let delivery = self.ingest.next_reading().await;
        self.apply(delivery);
        self.snapshot()
    }

    fn apply(&mut self, delivery: Delivery) {
        self.status = delivery.status;
        self.trust_score = Some(diagnostics::trust_score(delivery.fresh));

        if delivery.fresh {
            let calibrated = self.calibration.apply(&delivery.reading);
            let smoothed = self.smoother.apply(&calibrated);
            self.history.push(smoothed.clone());
            self.latest = Some(smoothed);
        } else if self.latest.is_none() {
            // Placeholder stands in until real data arrives; it never enters history
            self.latest = Some(delivery.reading);
        }

        if let Some(latest) = &self.latest {
            let assessment = risk::score(latest);
            debug!(
                "Scored reading at {}: {:.1} ({} factors)",
                latest.timestamp,
                assessment.score,
                assessment.factors.len()
            );
            self.assessment = Some(assessment);
        }
    }

    /// Poll on a fixed interval until `shutdown` fires or its sender is dropped
    ///
    /// A request still in flight at shutdown is dropped with its future, so a
    /// late response never touches session state. Ticks never overlap: the
    /// next one waits for the previous poll to finish.
    pub async fn run<F>(&mut self, mut shutdown: oneshot::Receiver<()>, mut on_tick: F)
    where
        F: FnMut(&SessionSnapshot),
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling telemetry every {} ms",
            self.poll_interval.as_millis()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let snapshot = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                snapshot = self.tick() => snapshot,
            };

            on_tick(&snapshot);
        }

        info!(
            "Telemetry session stopped at {}",
            format_datetime(&OffsetDateTime::now_utc())
        );
    }
}

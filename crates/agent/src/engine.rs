//! One snow-detection cycle, end to end.
//!
//! Acquire -> greyscale -> mask -> classify -> decide -> report. Each
//! cycle starts from scratch; nothing but configuration survives between
//! cycles. [`DetectionEngine::run_cycle`] never fails: errors are logged
//! and the cycle simply produces no outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use snowcheck_core::classify::classify;
use snowcheck_core::codec;
use snowcheck_core::detection::{decide, DetectionOutcome, DetectionThresholds};
use snowcheck_core::geometry::Polygon;
use snowcheck_core::mask::build_mask;
use tracing::Instrument;

use crate::artifacts::{ArtifactKind, ArtifactStore, DirectoryStore, NoopStore};
use crate::camera::{DigestCamera, SnapshotSource};
use crate::config::AgentConfig;
use crate::error::CycleError;
use crate::hub::{HomeAssistant, ReportSink};

/// Orchestrates detection cycles against injected collaborators.
pub struct DetectionEngine {
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn ReportSink>,
    artifacts: Arc<dyn ArtifactStore>,
    polygon: Polygon,
    thresholds: DetectionThresholds,
    dry_run: bool,
}

impl DetectionEngine {
    /// Engine with artifact persistence disabled and reporting enabled.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn ReportSink>,
        polygon: Polygon,
        thresholds: DetectionThresholds,
    ) -> Self {
        Self {
            source,
            sink,
            artifacts: Arc::new(NoopStore),
            polygon,
            thresholds,
            dry_run: false,
        }
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// When set, the report step is skipped.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Wire the production collaborators described by `config`.
    ///
    /// Creates the artifact directory when snapshot logging is enabled; a
    /// failure there is logged and later writes simply fail too.
    pub async fn from_config(config: &AgentConfig) -> Result<Self, reqwest::Error> {
        let camera = DigestCamera::new(config.camera.clone(), config.http_timeout)?;
        let hub = HomeAssistant::new(config.hub.clone(), config.http_timeout)?;

        let artifacts: Arc<dyn ArtifactStore> = match &config.snapshot_dir {
            Some(dir) if config.snapshot_logging => {
                let store = DirectoryStore::new(dir);
                match store.ensure_directory().await {
                    Ok(()) => tracing::info!(
                        dir = %store.dir().display(),
                        "Retrieved snapshots will be stored here"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Snapshot directory unavailable"),
                }
                Arc::new(store)
            }
            _ => Arc::new(NoopStore),
        };

        Ok(Self::new(
            Arc::new(camera),
            Arc::new(hub),
            config.polygon.clone(),
            config.thresholds,
        )
        .with_artifacts(artifacts)
        .with_dry_run(config.dry_run))
    }

    /// Run one full cycle.
    ///
    /// Returns `None` when acquisition or analysis failed, in which case
    /// nothing was reported. A failed report still returns the outcome.
    pub async fn run_cycle(&self) -> Option<DetectionOutcome> {
        let timestamp = cycle_timestamp(Utc::now());
        let span = tracing::info_span!("cycle", %timestamp);

        async {
            tracing::info!("Snow detection begin");

            let outcome = match self.detect(&timestamp).await {
                Ok(outcome) => {
                    self.report(outcome.snow_detected).await;
                    Some(outcome)
                }
                Err(e) => {
                    let status = match &e {
                        CycleError::Transport(t) => t.status(),
                        CycleError::Core(_) => None,
                    };
                    tracing::error!(error = %e, ?status, "Snow detection failed");
                    None
                }
            };

            tracing::info!("Snow detection complete");
            outcome
        }
        .instrument(span)
        .await
    }

    /// Steps up to and including the decision.
    async fn detect(&self, timestamp: &str) -> Result<DetectionOutcome, CycleError> {
        tracing::info!(source = %self.source.describe(), "Fetching snapshot");
        let bytes = self.source.fetch().await?;

        let snapshot = codec::decode(&bytes)?;
        self.persist(timestamp, ArtifactKind::Snapshot, &snapshot).await;

        // Mask is sized to what the camera actually returned.
        let (width, height) = (snapshot.width(), snapshot.height());
        let gray = codec::to_grayscale(&snapshot);
        drop(snapshot);

        tracing::debug!(width, height, "Building region mask");
        let mask = build_mask(width, height, &self.polygon);

        let classification = classify(&gray, &mask, self.thresholds.brightness);

        // Persisted even when classification failed, to help diagnose it.
        self.persist(timestamp, ArtifactKind::Greyscale, &DynamicImage::ImageLuma8(gray))
            .await;
        self.persist(timestamp, ArtifactKind::Mask, &DynamicImage::ImageLuma8(mask))
            .await;

        let classification = classification?;
        self.persist(
            timestamp,
            ArtifactKind::Bright,
            &DynamicImage::ImageRgb8(classification.visualization),
        )
        .await;

        let counts = classification.result;
        let outcome = decide(counts, self.thresholds.snow_ratio);

        tracing::info!(
            grand_total = counts.grand_total,
            total_within_mask = counts.total_within_mask,
            bright_within_mask = counts.bright_within_mask,
            ratio = %format!("{:.4}", outcome.ratio),
            "Pixel counts"
        );
        tracing::info!(
            snow_ratio_threshold = self.thresholds.snow_ratio,
            snow_detected = outcome.snow_detected,
            "Snow decision"
        );

        Ok(outcome)
    }

    /// Push the decision to the hub unless running dry. Failures are logged
    /// and not retried.
    async fn report(&self, snow_detected: bool) {
        if self.dry_run {
            tracing::info!(snow_detected, "Dry run, skipping hub update");
            return;
        }

        if let Err(e) = self.sink.report(snow_detected).await {
            tracing::error!(error = %e, status = ?e.status(), "Hub update failed");
        }
    }

    async fn persist(&self, timestamp: &str, kind: ArtifactKind, image: &DynamicImage) {
        if let Err(e) = self.artifacts.save(timestamp, kind, image).await {
            tracing::warn!(kind = kind.label(), error = %e, "Failed to save debug image");
        }
    }
}

/// ISO-8601 UTC timestamp made filesystem-safe (`:` and `.` become `-`).
pub fn cycle_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

//! Shared in-memory collaborators for agent integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat};
use snowcheck_agent::artifacts::{ArtifactKind, ArtifactStore};
use snowcheck_agent::camera::SnapshotSource;
use snowcheck_agent::engine::DetectionEngine;
use snowcheck_agent::error::{ArtifactError, TransportError};
use snowcheck_agent::hub::ReportSink;
use snowcheck_core::detection::DetectionThresholds;
use snowcheck_core::geometry::{Point, Polygon};

pub const CAMERA_URL: &str = "http://camera.test/snapshot.jpg";

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// PNG-encode a greyscale raster (lossless, so pixel values survive decode).
pub fn png(gray: GrayImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("PNG encoding should succeed");
    buf.into_inner()
}

pub fn polygon(points: &[(i32, i32)]) -> Polygon {
    points.iter().copied().map(Point::from).collect()
}

pub fn thresholds(brightness: u8, snow_ratio: f64) -> DetectionThresholds {
    DetectionThresholds {
        brightness,
        snow_ratio,
    }
}

// ---------------------------------------------------------------------------
// Snapshot source
// ---------------------------------------------------------------------------

/// Camera returning a fixed response and counting fetches.
pub struct FakeCamera {
    response: Result<Vec<u8>, u16>,
    calls: AtomicUsize,
}

impl FakeCamera {
    pub fn serving(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(bytes),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            response: Err(status),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for FakeCamera {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(bytes) => Ok(bytes.clone()),
            Err(status) => Err(TransportError::Status {
                url: CAMERA_URL.to_string(),
                status: *status,
                body: "camera error".to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        CAMERA_URL.to_string()
    }
}

// ---------------------------------------------------------------------------
// Report sink
// ---------------------------------------------------------------------------

/// Hub recording every reported state.
#[derive(Default)]
pub struct RecordingHub {
    reports: Mutex<Vec<bool>>,
    fail_with: Option<u16>,
}

impl RecordingHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reports: Mutex::new(Vec::new()),
            fail_with: Some(status),
        })
    }

    pub fn reports(&self) -> Vec<bool> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingHub {
    async fn report(&self, snow_detected: bool) -> Result<(), TransportError> {
        self.reports.lock().unwrap().push(snow_detected);
        match self.fail_with {
            Some(status) => Err(TransportError::Status {
                url: "http://hub.test/api/states/binary_sensor.snow".to_string(),
                status,
                body: "hub error".to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

/// Store remembering which artifacts were offered, optionally failing.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<(String, ArtifactKind, (u32, u32))>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn kinds(&self) -> Vec<ArtifactKind> {
        self.saved.lock().unwrap().iter().map(|(_, k, _)| *k).collect()
    }

    pub fn saved(&self) -> Vec<(String, ArtifactKind, (u32, u32))> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn save(
        &self,
        timestamp: &str,
        kind: ArtifactKind,
        image: &DynamicImage,
    ) -> Result<(), ArtifactError> {
        self.saved
            .lock()
            .unwrap()
            .push((timestamp.to_string(), kind, (image.width(), image.height())));
        if self.fail {
            return Err(ArtifactError::Write {
                path: format!("/nonexistent/{timestamp}-{}.jpg", kind.label()).into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub fn engine(
    camera: &Arc<FakeCamera>,
    hub: &Arc<RecordingHub>,
    polygon: Polygon,
    thresholds: DetectionThresholds,
) -> DetectionEngine {
    DetectionEngine::new(camera.clone(), hub.clone(), polygon, thresholds)
}

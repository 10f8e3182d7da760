//! Multi-slot (grid) rendering.
//!
//! Each slot tracks the fingerprint of its current source and of the
//! source and settings its processed image was made from. A result is
//! only stored if the slot still holds the source the job was planned
//! for; a slot whose image was replaced mid-flight ignores the late
//! result and gets planned again on the next refresh.

use std::fmt;
use std::sync::Arc;

use ditherkit_core::{AccentOptions, ImageBuffer, PaletteOptions, RenderOptions};
use futures_util::future::join_all;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::dispatcher::{DispatchError, Dispatcher, JobRequest, JobResponse};

/// Hex SHA-256 digest identifying an image or an options snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_image(image: &ImageBuffer) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((image.width() as u64).to_le_bytes());
        hasher.update((image.height() as u64).to_le_bytes());
        hasher.update(image.data());
        Self(hex::encode(hasher.finalize()))
    }

    /// Digest of every field that influences the output.
    ///
    /// Fields are destructured without `..` so a new option cannot be
    /// left out of the identity silently.
    pub fn of_options(options: &RenderOptions) -> Self {
        let RenderOptions {
            algorithm,
            threshold,
            brightness,
            contrast,
            gamma,
            point_size,
            color_pipeline,
            invert,
            color_mode,
            palette,
            accent,
        } = options;
        let PaletteOptions {
            swatches,
            strict_swatches,
            steps,
        } = palette;
        let AccentOptions {
            enabled,
            detect,
            hue_tolerance,
            min_saturation,
            min_value,
            edge_boost,
            edge_threshold,
            color,
            strength,
        } = accent;

        let mut hasher = Sha256::new();
        let mut field = |name: &str, value: &[u8]| {
            hasher.update((name.len() as u32).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update((value.len() as u32).to_le_bytes());
            hasher.update(value);
        };
        field("algorithm", algorithm.to_string().as_bytes());
        field("threshold", &[*threshold]);
        field("brightness", &brightness.to_le_bytes());
        field("contrast", &contrast.to_le_bytes());
        field("gamma", &gamma.to_bits().to_le_bytes());
        field("point_size", &(*point_size as u64).to_le_bytes());
        field("color_pipeline", color_pipeline.to_string().as_bytes());
        field("invert", &[*invert as u8]);
        field("color_mode", color_mode.to_string().as_bytes());
        field("swatches", &swatches.iter().flat_map(|c| c.to_array()).collect::<Vec<_>>());
        field("strict_swatches", &[*strict_swatches as u8]);
        field("steps", &[*steps]);
        field("accent.enabled", &[*enabled as u8]);
        field("accent.detect", &detect.to_array());
        field("accent.hue_tolerance", &hue_tolerance.to_bits().to_le_bytes());
        field("accent.min_saturation", &min_saturation.to_bits().to_le_bytes());
        field("accent.min_value", &min_value.to_bits().to_le_bytes());
        field("accent.edge_boost", &[*edge_boost as u8]);
        field("accent.edge_threshold", &edge_threshold.to_bits().to_le_bytes());
        field("accent.color", &color.to_array());
        field("accent.strength", &strength.to_bits().to_le_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Slot {
    id: String,
    source: Option<Arc<ImageBuffer>>,
    source_fingerprint: Option<Fingerprint>,
    processed: Option<Arc<ImageBuffer>>,
    processed_from: Option<Fingerprint>,
    settings_fingerprint: Option<Fingerprint>,
    /// Source and settings of the last attempt, successful or not
    attempted: Option<(Fingerprint, Fingerprint)>,
    error: Option<String>,
}

impl Slot {
    fn new(id: String) -> Self {
        Self {
            id,
            source: None,
            source_fingerprint: None,
            processed: None,
            processed_from: None,
            settings_fingerprint: None,
            attempted: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> Option<&Arc<ImageBuffer>> {
        self.source.as_ref()
    }

    pub fn source_fingerprint(&self) -> Option<&Fingerprint> {
        self.source_fingerprint.as_ref()
    }

    /// Last good render. Survives later failures and source changes.
    pub fn processed(&self) -> Option<&Arc<ImageBuffer>> {
        self.processed.as_ref()
    }

    pub fn processed_from(&self) -> Option<&Fingerprint> {
        self.processed_from.as_ref()
    }

    pub fn settings_fingerprint(&self) -> Option<&Fingerprint> {
        self.settings_fingerprint.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The processed image matches the current source and `settings`.
    pub fn is_fresh(&self, settings: &Fingerprint) -> bool {
        self.source_fingerprint.is_some()
            && self.processed_from == self.source_fingerprint
            && self.settings_fingerprint.as_ref() == Some(settings)
    }

    fn needs_render(&self, settings: &Fingerprint) -> bool {
        let Some(source) = &self.source_fingerprint else {
            return false;
        };
        if self.is_fresh(settings) {
            return false;
        }
        // Do not retry an identical failed attempt.
        !matches!(&self.attempted, Some((s, o)) if s == source && o == settings)
    }
}

/// Identity of a planned job: which slot, from which source, with which settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKey {
    pub slot_id: String,
    pub source_fingerprint: Fingerprint,
    pub settings_fingerprint: Fingerprint,
}

#[derive(Debug, Clone)]
pub struct SlotJob {
    pub key: SlotKey,
    pub request: JobRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Stored,
    Failed,
    /// The slot's source changed while the job ran
    Stale,
    UnknownSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    pub rendered: usize,
    pub failed: usize,
    pub stale: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SlotBatch {
    slots: Vec<Slot>,
}

impl SlotBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batch = Self::new();
        for id in ids {
            batch.add_slot(id);
        }
        batch
    }

    /// Add an empty slot, or return the existing one with that id.
    pub fn add_slot(&mut self, id: impl Into<String>) -> &mut Slot {
        let id = id.into();
        let index = match self.slots.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => {
                self.slots.push(Slot::new(id));
                self.slots.len() - 1
            }
        };
        &mut self.slots[index]
    }

    pub fn remove_slot(&mut self, id: &str) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        self.slots.len() != before
    }

    /// Replace a slot's source, creating the slot if needed.
    ///
    /// Returns `true` when the source actually changed.
    pub fn set_source(&mut self, id: impl Into<String>, image: ImageBuffer) -> bool {
        let fingerprint = Fingerprint::of_image(&image);
        let slot = self.add_slot(id);
        if slot.source_fingerprint.as_ref() == Some(&fingerprint) {
            return false;
        }
        tracing::debug!(slot = %slot.id, source = fingerprint.short(), "Slot source replaced");
        slot.source = Some(Arc::new(image));
        slot.source_fingerprint = Some(fingerprint);
        slot.error = None;
        true
    }

    pub fn clear_source(&mut self, id: &str) {
        if let Some(slot) = self.slot_mut(id) {
            slot.source = None;
            slot.source_fingerprint = None;
            slot.processed = None;
            slot.processed_from = None;
            slot.settings_fingerprint = None;
            slot.attempted = None;
            slot.error = None;
        }
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    fn slot_mut(&mut self, id: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Jobs for every slot whose processed image is missing or out of date
    /// with respect to its source or `options`.
    pub fn plan(&self, options: &RenderOptions) -> Vec<SlotJob> {
        let settings = Fingerprint::of_options(options);
        self.slots
            .iter()
            .filter(|slot| slot.needs_render(&settings))
            .filter_map(|slot| {
                let source = slot.source.as_ref()?;
                let source_fingerprint = slot.source_fingerprint.clone()?;
                Some(SlotJob {
                    key: SlotKey {
                        slot_id: slot.id.clone(),
                        source_fingerprint,
                        settings_fingerprint: settings.clone(),
                    },
                    request: JobRequest::new(source.as_ref().clone(), options.clone()),
                })
            })
            .collect()
    }

    /// Store a job's outcome if the slot still holds the planned source.
    pub fn merge(&mut self, key: &SlotKey, response: JobResponse) -> MergeOutcome {
        let Some(slot) = self.slot_mut(&key.slot_id) else {
            return MergeOutcome::UnknownSlot;
        };
        if slot.source_fingerprint.as_ref() != Some(&key.source_fingerprint) {
            tracing::debug!(
                slot = %key.slot_id,
                job_id = %response.job_id(),
                planned = key.source_fingerprint.short(),
                "Discarding result for replaced slot source"
            );
            return MergeOutcome::Stale;
        }

        slot.attempted = Some((
            key.source_fingerprint.clone(),
            key.settings_fingerprint.clone(),
        ));
        match response {
            JobResponse::Completed { image, .. } => {
                slot.processed = Some(image);
                slot.processed_from = Some(key.source_fingerprint.clone());
                slot.settings_fingerprint = Some(key.settings_fingerprint.clone());
                slot.error = None;
                MergeOutcome::Stored
            }
            JobResponse::Failed { job_id, error } => {
                tracing::warn!(slot = %key.slot_id, job_id = %job_id, %error, "Slot render failed");
                slot.error = Some(error);
                MergeOutcome::Failed
            }
        }
    }
}

/// Render every out-of-date slot through `dispatcher`.
///
/// The batch lock is released while jobs run, so sources may be replaced
/// concurrently; such slots come back as stale.
pub async fn refresh(
    batch: &Mutex<SlotBatch>,
    dispatcher: &Dispatcher,
    options: &RenderOptions,
) -> RefreshSummary {
    let jobs = batch.lock().await.plan(options);
    if jobs.is_empty() {
        return RefreshSummary::default();
    }

    let (keys, requests): (Vec<_>, Vec<_>) =
        jobs.into_iter().map(|job| (job.key, job.request)).unzip();
    let ids: Vec<_> = requests.iter().map(|r| r.job_id.clone()).collect();
    let results = join_all(requests.into_iter().map(|request| dispatcher.run(request))).await;

    let mut summary = RefreshSummary::default();
    let mut batch = batch.lock().await;
    for ((key, job_id), result) in keys.iter().zip(ids).zip(results) {
        let response = match result {
            Ok(image) => JobResponse::Completed { job_id, image },
            Err(DispatchError::Failed { job_id, message }) => JobResponse::Failed {
                job_id,
                error: message,
            },
            Err(e) => JobResponse::Failed {
                job_id,
                error: e.to_string(),
            },
        };
        match batch.merge(key, response) {
            MergeOutcome::Stored => summary.rendered += 1,
            MergeOutcome::Failed => summary.failed += 1,
            MergeOutcome::Stale | MergeOutcome::UnknownSlot => summary.stale += 1,
        }
    }

    tracing::info!(
        rendered = summary.rendered,
        failed = summary.failed,
        stale = summary.stale,
        "Batch refreshed"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(value: u8) -> ImageBuffer {
        ImageBuffer::filled(4, 4, [value, value, value, 255]).unwrap()
    }

    fn completed(job: &SlotJob) -> JobResponse {
        JobResponse::Completed {
            job_id: job.request.job_id.clone(),
            image: Arc::new(image(0)),
        }
    }

    #[test]
    fn test_fingerprint_depends_on_pixels_and_size() {
        let a = Fingerprint::of_image(&image(10));
        assert_eq!(a, Fingerprint::of_image(&image(10)));
        assert_ne!(a, Fingerprint::of_image(&image(11)));

        let wide = ImageBuffer::filled(8, 2, [10, 10, 10, 255]).unwrap();
        assert_ne!(a, Fingerprint::of_image(&wide));
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn test_options_fingerprint() {
        let a = RenderOptions::default();
        let b = RenderOptions::default().threshold(100);
        assert_eq!(Fingerprint::of_options(&a), Fingerprint::of_options(&a.clone()));
        assert_ne!(Fingerprint::of_options(&a), Fingerprint::of_options(&b));
    }

    #[test]
    fn test_every_option_changes_fingerprint() {
        use ditherkit_core::{AccentOptions, ColorMode, ColorPipeline, DitherAlgorithm, Rgb};

        let base = RenderOptions::default();
        let variants = [
            base.clone().algorithm(DitherAlgorithm::Stucki),
            base.clone().threshold(127),
            base.clone().brightness(1),
            base.clone().contrast(-1),
            base.clone().gamma(1.5),
            base.clone().point_size(3),
            base.clone().color_pipeline(ColorPipeline::Linear),
            base.clone().invert(true),
            base.clone().color_mode(ColorMode::Tritone),
            base.clone().palette(PaletteOptions::new(vec![Rgb::BLACK, Rgb::WHITE])),
            base.clone().palette(base.palette.clone().strict_swatches(false)),
            base.clone().palette(base.palette.clone().steps(7)),
            base.clone().accent(AccentOptions::new().enabled(true)),
            base.clone().accent(AccentOptions::new().detect(Rgb::new(0, 255, 0))),
            base.clone().accent(AccentOptions::new().hue_tolerance(10.0)),
            base.clone().accent(AccentOptions::new().min_saturation(0.5)),
            base.clone().accent(AccentOptions::new().min_value(0.5)),
            base.clone().accent(AccentOptions::new().edge_boost(false)),
            base.clone().accent(AccentOptions::new().edge_threshold(5.0)),
            base.clone().accent(AccentOptions::new().color(Rgb::new(1, 2, 3))),
            base.clone().accent(AccentOptions::new().strength(0.25)),
        ];

        let mut seen = vec![Fingerprint::of_options(&base)];
        for (i, options) in variants.iter().enumerate() {
            let fingerprint = Fingerprint::of_options(options);
            assert!(!seen.contains(&fingerprint), "variant {i} collides");
            assert_eq!(fingerprint, Fingerprint::of_options(&options.clone()));
            seen.push(fingerprint);
        }
    }

    #[test]
    fn test_plan_skips_empty_and_fresh_slots() {
        let mut batch = SlotBatch::with_slots(["1", "2"]);
        batch.set_source("1", image(50));
        let options = RenderOptions::default();

        let jobs = batch.plan(&options);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].key.slot_id, "1");

        assert_eq!(batch.merge(&jobs[0].key, completed(&jobs[0])), MergeOutcome::Stored);
        assert!(batch.plan(&options).is_empty());
        assert!(batch.slot("1").unwrap().is_fresh(&Fingerprint::of_options(&options)));
    }

    #[test]
    fn test_settings_change_replans() {
        let mut batch = SlotBatch::new();
        batch.set_source("a", image(50));
        let options = RenderOptions::default();
        let jobs = batch.plan(&options);
        batch.merge(&jobs[0].key, completed(&jobs[0]));

        let replanned = batch.plan(&options.clone().invert(true));
        assert_eq!(replanned.len(), 1);
    }

    #[test]
    fn test_merge_discards_result_for_replaced_source() {
        let mut batch = SlotBatch::new();
        batch.set_source("a", image(50));
        let jobs = batch.plan(&RenderOptions::default());

        // The user drops a new picture into the slot while the job runs.
        assert!(batch.set_source("a", image(200)));

        assert_eq!(batch.merge(&jobs[0].key, completed(&jobs[0])), MergeOutcome::Stale);
        let slot = batch.slot("a").unwrap();
        assert!(slot.processed().is_none());
        assert_eq!(batch.plan(&RenderOptions::default()).len(), 1);
    }

    #[test]
    fn test_same_source_is_not_a_change() {
        let mut batch = SlotBatch::new();
        assert!(batch.set_source("a", image(50)));
        assert!(!batch.set_source("a", image(50)));
    }

    #[test]
    fn test_failure_keeps_last_good_image_and_is_not_retried() {
        let mut batch = SlotBatch::new();
        batch.set_source("a", image(50));
        let good = RenderOptions::default();
        let jobs = batch.plan(&good);
        batch.merge(&jobs[0].key, completed(&jobs[0]));

        let bad = good.clone().gamma(0.0);
        let jobs = batch.plan(&bad);
        let outcome = batch.merge(
            &jobs[0].key,
            JobResponse::Failed {
                job_id: jobs[0].request.job_id.clone(),
                error: "gamma".to_string(),
            },
        );
        assert_eq!(outcome, MergeOutcome::Failed);

        let slot = batch.slot("a").unwrap();
        assert!(slot.processed().is_some());
        assert_eq!(slot.error(), Some("gamma"));
        assert!(batch.plan(&bad).is_empty());
    }

    #[test]
    fn test_unknown_slot() {
        let mut batch = SlotBatch::new();
        batch.set_source("a", image(1));
        let jobs = batch.plan(&RenderOptions::default());
        assert!(batch.remove_slot("a"));
        assert_eq!(
            batch.merge(&jobs[0].key, completed(&jobs[0])),
            MergeOutcome::UnknownSlot
        );
    }

    #[test]
    fn test_clear_source() {
        let mut batch = SlotBatch::new();
        batch.set_source("a", image(1));
        batch.clear_source("a");
        let slot = batch.slot("a").unwrap();
        assert!(slot.source().is_none());
        assert!(batch.plan(&RenderOptions::default()).is_empty());
    }
}

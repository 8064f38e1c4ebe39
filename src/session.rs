//! # Run Orchestration
//!
//! One session runs the whole pipeline as a single logical sequence:
//! palette -> overlay -> board snapshot -> index -> classify -> levels ->
//! schedule -> dispatch. Suspension happens only at I/O boundaries; the
//! diff and scheduling steps work on fully materialized in-memory lists.
//!
//! The session is generic over [`CanvasService`] so tests can drive it
//! with an in-memory fake, and the palette cache and pacer are injectable
//! for the same reason. A fatal error from any stage (remote rejection,
//! short level query) aborts the remaining pipeline; there is no retry and
//! nothing already submitted is rolled back.

use std::fs;

use rand::Rng;

use crate::canvas::{CanvasCell, CanvasIndex, Pixel};
use crate::config::{FixParams, ProtectParams, RunMode, SessionConfig};
use crate::engine::diff::classify;
use crate::engine::dispatch::{JitterPacer, Pacer, dispatch};
use crate::engine::schedule::{
    CorrectionParams, MutationIntent, ReinforceParams, schedule_correction, schedule_reinforce,
};
use crate::error::{WardenError, WardenResult};
use crate::overlay::{DecodeOptions, decode_bytes, shuffle_pixels};
use crate::palette::{FilePaletteCache, PaletteCache, Quantizer};
use crate::remote::CanvasService;

/// Accounting for one completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Pixels decoded from the overlay.
    pub target_pixels: usize,
    /// Target pixels whose canvas color already matches.
    pub correct: usize,
    /// Target pixels whose canvas color differs.
    pub incorrect: usize,
    /// Mutations admitted by the scheduler.
    pub planned: usize,
    /// Credits the admitted plan costs.
    pub running_cost: u64,
    /// Correction mode only: cost of fixing every candidate.
    pub total_cost: Option<u64>,
    /// Batches actually submitted.
    pub batches: usize,
}

/// One reconciliation run against the canvas service.
pub struct Session<S: CanvasService> {
    service: S,
    config: SessionConfig,
    cache: Box<dyn PaletteCache>,
    pacer: Box<dyn Pacer>,
}

impl<S: CanvasService> Session<S> {
    pub fn new(service: S, config: SessionConfig) -> Self {
        let cache = Box::new(FilePaletteCache::new(config.palette_cache.clone()));
        Self {
            service,
            config,
            cache,
            pacer: Box::new(JitterPacer),
        }
    }

    /// Replace the palette cache (tests use an in-memory one).
    pub fn with_cache(mut self, cache: Box<dyn PaletteCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the inter-batch pacer (tests use a no-op one).
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Run the pipeline to completion or first fatal error.
    pub async fn run(mut self) -> WardenResult<RunReport> {
        let quantizer = self.load_quantizer().await?;
        let target = self.load_overlay(&quantizer)?;
        let index = self.load_board(&quantizer).await?;

        let diff = classify(&target, &index);
        println!(
            "Classified {} target pixels: {} correct, {} incorrect, {} unknown",
            target.len(),
            diff.correct.len(),
            diff.incorrect.len(),
            target.len() - diff.matched()
        );

        let mut report = RunReport {
            target_pixels: target.len(),
            correct: diff.correct.len(),
            incorrect: diff.incorrect.len(),
            ..Default::default()
        };

        let intents = match self.config.mode {
            RunMode::Protect(params) => {
                let (running, intents) = self.plan_protect(&diff.correct, &params).await?;
                report.running_cost = running;
                intents
            }
            RunMode::Fix(params) => {
                let (running, total, intents) = self.plan_fix(&diff.incorrect, &params).await?;
                report.running_cost = running;
                report.total_cost = Some(total);
                intents
            }
        };
        report.planned = intents.len();

        let summary = dispatch(
            &intents,
            self.config.mode.batch_size(),
            &mut self.service,
            &mut *self.pacer,
        )
        .await?;
        report.batches = summary.batches;
        Ok(report)
    }

    /// Load-if-present, else fetch-and-persist the palette, then build the
    /// quantizer from it.
    async fn load_quantizer(&self) -> WardenResult<Quantizer> {
        let palette = match self.cache.load()? {
            Some(colors) => colors,
            None => {
                let colors = self.service.fetch_palette().await?;
                self.cache.store(&colors)?;
                colors
            }
        };
        Quantizer::new(&palette)
    }

    fn load_overlay(&self, quantizer: &Quantizer) -> WardenResult<Vec<Pixel>> {
        let overlay = &self.config.overlay;
        let bytes = fs::read(&overlay.file)
            .map_err(|e| WardenError::io(overlay.file.display().to_string(), e))?;
        let options = DecodeOptions {
            offset: overlay.origin,
            stride: overlay.stride,
            transparent_color: overlay.transparent_color,
        };
        let mut pixels = decode_bytes(&bytes, &options, quantizer)?;
        if overlay.shuffle {
            let seed = overlay.seed.unwrap_or_else(|| rand::rng().random());
            shuffle_pixels(&mut pixels, seed);
        }
        Ok(pixels)
    }

    async fn load_board(&self, quantizer: &Quantizer) -> WardenResult<CanvasIndex> {
        let bytes = self.service.fetch_board().await?;
        if let Some(path) = &self.config.save_map {
            fs::write(path, &bytes).map_err(|e| WardenError::io(path.display().to_string(), e))?;
        }
        let cells = decode_bytes(&bytes, &DecodeOptions::default(), quantizer)?
            .into_iter()
            .map(|p| CanvasCell::observed(p.x, p.y, p.color));
        Ok(CanvasIndex::build(cells))
    }

    async fn plan_protect(
        &self,
        candidates: &[Pixel],
        params: &ProtectParams,
    ) -> WardenResult<(u64, Vec<MutationIntent>)> {
        println!("Total pixels to protect: {}", candidates.len());
        if candidates.is_empty() {
            return Ok((0, Vec::new()));
        }

        let levels = self.query_levels(candidates).await?;
        let plan = schedule_reinforce(
            candidates,
            &levels,
            &ReinforceParams {
                min_level: params.min_level,
                max_credit: params.max_credit,
            },
        )?;
        println!(
            "Pixels to protect (min level {}): {} (cost: {})",
            params.min_level,
            plan.intents.len(),
            plan.running_cost
        );
        Ok((plan.running_cost, plan.intents))
    }

    async fn plan_fix(
        &self,
        candidates: &[Pixel],
        params: &FixParams,
    ) -> WardenResult<(u64, u64, Vec<MutationIntent>)> {
        println!("Total pixels to fix: {}", candidates.len());
        if candidates.is_empty() {
            return Ok((0, 0, Vec::new()));
        }

        let levels = self.query_levels(candidates).await?;
        let plan = schedule_correction(
            candidates,
            &levels,
            &CorrectionParams {
                max_level: params.max_level,
                max_credit: params.max_credit,
                upgrade: params.upgrade,
            },
        )?;
        println!("Total cost: {} credits", plan.total_cost);
        println!(
            "Pixels to fix (max level {}): {} (cost: {} credits)",
            params.max_level,
            plan.intents.len(),
            plan.running_cost
        );
        Ok((plan.running_cost, plan.total_cost, plan.intents))
    }

    async fn query_levels(
        &self,
        candidates: &[Pixel],
    ) -> WardenResult<Vec<crate::canvas::PixelLevel>> {
        let coords: Vec<(i32, i32)> = candidates.iter().map(|p| (p.x, p.y)).collect();
        let levels = self.service.pixel_levels(&coords).await?;
        if levels.len() != coords.len() {
            return Err(WardenError::level_query(coords.len(), levels.len()));
        }
        Ok(levels)
    }
}

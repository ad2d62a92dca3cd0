//! Variation batch orchestration: validate, source images, create jobs,
//! dispatch.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use vgen_models::{
    extract_keywords, generate_combinations, AxisSelection, BatchId, ColorGrade, EffectPreset,
    JobStatus, KeywordCaps, SeedGeneration, SeedStatus, TextStyle, VariationJob, Vibe,
};
use vgen_render::{create_jobs, dispatch_all, SharedAssets};
use vgen_search::SearchOptions;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::variations::CreateVariationsRequest;
use crate::metrics::record_batch_created;
use crate::state::AppState;

/// Result of starting one variation batch.
pub struct BatchOutcome {
    pub batch_id: BatchId,
    pub search_tags: Vec<String>,
    pub jobs: Vec<VariationJob>,
}

/// Validate the request, source the shared image set, create the job rows,
/// and fire the dispatch tasks.
///
/// Validation and access checks reject synchronously before any job row
/// exists. Everything after job creation is per-job: a failed dispatch or a
/// degraded image search surfaces as failed jobs, never as a batch-level
/// error.
pub async fn start_variation_batch(
    state: &AppState,
    user: &AuthUser,
    seed_id: &str,
    request: &CreateVariationsRequest,
) -> ApiResult<BatchOutcome> {
    let seed = state
        .seeds
        .get(seed_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Seed {seed_id} not found")))?;

    user.ensure_label_access(&seed.label_id)?;

    if seed.status != SeedStatus::Completed {
        return Err(ApiError::bad_request(format!(
            "Seed {seed_id} is not completed (status: {})",
            seed.status
        )));
    }

    let axes = parse_axes(request)?;
    let cap = effective_cap(request.variation_count, state.config.max_variations);
    let combinations = generate_combinations(&axes, cap);

    let caps = KeywordCaps {
        metadata: state.config.metadata_keyword_cap,
        ..KeywordCaps::default()
    };
    let search_tags = extract_keywords(seed.metadata.as_ref(), &seed.prompt, None, caps);

    let image_urls = source_images(state, &seed, &search_tags).await;

    let (batch_id, jobs) = create_jobs(
        state.jobs.as_ref(),
        &seed,
        &combinations,
        &user.id,
        request.auto_publish.clone(),
    )
    .await?;

    record_batch_created(jobs.len());
    info!(
        batch_id = %batch_id,
        seed_id = %seed.id,
        count = jobs.len(),
        tags = ?search_tags,
        "Starting variation batch"
    );

    let shared = Arc::new(SharedAssets {
        image_urls,
        script_lines: seed.metadata.as_ref().and_then(|m| m.script_lines()).map(<[_]>::to_vec),
        audio: seed.audio.clone(),
    });

    let pending: Vec<VariationJob> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Pending)
        .cloned()
        .collect();
    dispatch_all(
        Arc::clone(&state.render),
        Arc::clone(&state.jobs),
        Arc::clone(&state.compose),
        pending,
        shared,
    );

    Ok(BatchOutcome {
        batch_id,
        search_tags,
        jobs,
    })
}

/// Resolve the shared image set: reuse the seed's own image list when the
/// metadata carries one, otherwise run a cached search over the extracted
/// tags. A failed search degrades to an empty set; the per-job dispatch
/// surfaces the missing images on each job.
async fn source_images(state: &AppState, seed: &SeedGeneration, tags: &[String]) -> Vec<String> {
    if let Some(urls) = seed.metadata.as_ref().and_then(|m| m.image_urls()) {
        info!(seed_id = %seed.id, count = urls.len(), "Reusing seed image set");
        return urls.to_vec();
    }

    let options = SearchOptions {
        per_keyword_limit: state.config.images_per_keyword,
        ..SearchOptions::default()
    };
    match state.search.search_each_cached(tags, &options).await {
        Ok(outcome) => {
            info!(
                seed_id = %seed.id,
                candidates = outcome.candidates.len(),
                from_cache = outcome.from_cache,
                upstream_calls = outcome.stats.upstream_calls,
                "Sourced image candidates"
            );
            outcome
                .candidates
                .into_iter()
                .map(|c| c.source_url)
                .collect()
        }
        Err(e) => {
            warn!(seed_id = %seed.id, error = %e, "Image search failed, continuing without images");
            Vec::new()
        }
    }
}

fn effective_cap(requested: Option<usize>, max: usize) -> usize {
    requested.unwrap_or(max).clamp(1, max)
}

fn parse_axes(request: &CreateVariationsRequest) -> ApiResult<AxisSelection> {
    fn parse_axis<T: FromStr>(values: &[String], axis: &str) -> ApiResult<Vec<T>>
    where
        T::Err: std::fmt::Display,
    {
        values
            .iter()
            .map(|v| {
                v.parse::<T>()
                    .map_err(|e| ApiError::bad_request(format!("Invalid {axis}: {e}")))
            })
            .collect()
    }

    Ok(AxisSelection {
        effects: parse_axis::<EffectPreset>(&request.effect_presets, "effect preset")?,
        colors: parse_axis::<ColorGrade>(&request.color_grades, "color grade")?,
        texts: parse_axis::<TextStyle>(&request.text_styles, "text style")?,
        vibes: parse_axis::<Vibe>(&request.vibe_variations, "vibe")?,
    })
}

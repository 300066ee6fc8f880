//! Drives one backend over a project's shots.
//!
//! A generation is split in three phases so callers sharing a project behind
//! a lock can release it while the backend works:
//!
//! 1. [`Orchestrator::prepare`] resolves the prompt, snapshots what the
//!    backend needs and marks the shot `generating` (under the lock).
//! 2. [`Orchestrator::execute`] calls the backend with a bounded wait and
//!    writes the image (no lock).
//! 3. [`Orchestrator::apply`] records the outcome on the shot (under the lock).
//!
//! A second request for a shot that is already generating is refused. If a
//! generation is dropped between `prepare` and `apply` (client disconnect,
//! request timeout, aborted task) the shot goes back to the state it had
//! before `prepare`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use storyboard_core::consistency::{collect_references, primary_character_reference, SeedPolicy};
use storyboard_core::model::{ShotStatus, StoryboardProject};
use storyboard_core::prompt::{consistency_prefix, negative_prompt, refresh_shot};
use storyboard_core::text::sanitize_file_stem;
use tokio::sync::Mutex;

use crate::backend::{
    BackendError, ErrorKind, GenerationRequest, ImageBackend, ImageToImageRequest, TextToImageRequest,
};
use crate::progress::{report_batch, BatchProgressFn, StepHook};

/// Ceiling on one backend call, including its own network timeouts.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(480);

/// Request-level failures. Backend failures are not errors here; they come
/// back inside a [`ShotGenerationResult`].
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No shot with this number in the project.
    #[error("Shot {0} not found")]
    ShotNotFound(u32),

    /// The shot has a generation in flight.
    #[error("Shot {0} is already generating")]
    AlreadyGenerating(u32),

    /// Batch generation on a project without shots.
    #[error("Project has no shots to generate")]
    NoShots,
}

/// Outcome of one shot generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotGenerationResult {
    pub shot_number: u32,
    pub success: bool,
    /// Where the image was written. Present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Backend or write error text. Present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Classification of `error`, used to pick the HTTP status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Backend-reported consistency estimate, `0.0` on failure.
    pub consistency_score: f64,
    /// Wall-clock seconds spent in the backend and on the write.
    pub generation_time: f64,
}

/// Outcome of [`Orchestrator::generate_all`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub success_count: usize,
    /// Every shot in the project, skipped ones included.
    pub total: usize,
    /// `"{success_count}/{total}"`.
    pub message: String,
    /// Attempted shots only; shots that already had output are in `skipped`.
    pub results: Vec<ShotGenerationResult>,
    pub skipped: Vec<u32>,
}

/// Everything the backend phase needs, detached from the project.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub shot_number: u32,
    /// Names the output subdirectory.
    pub project_name: String,
    /// Fully resolved backend request.
    pub request: GenerationRequest,
    prior: PriorState,
}

/// Shot state from before [`Orchestrator::prepare`] marked it generating.
#[derive(Debug, Clone)]
struct PriorState {
    status: ShotStatus,
    last_error: Option<String>,
}

/// Put an interrupted shot back the way `prepare` found it.
fn restore_interrupted(project: &mut StoryboardProject, shot_number: u32, prior: &PriorState) {
    let Some(shot) = project.shot_mut(shot_number) else {
        return;
    };
    if shot.status != ShotStatus::Generating {
        return;
    }
    shot.status = prior.status;
    shot.last_error = prior.last_error.clone();
    tracing::warn!(
        shot_number,
        status = prior.status.as_str(),
        "Generation interrupted, shot restored"
    );
}

/// Armed between `prepare` and `apply`. Dropping it while armed restores the
/// shot.
struct InFlight {
    project: Arc<Mutex<StoryboardProject>>,
    shot_number: u32,
    prior: Option<PriorState>,
}

impl InFlight {
    fn new(project: &Arc<Mutex<StoryboardProject>>, job: &GenerationJob) -> Self {
        Self {
            project: Arc::clone(project),
            shot_number: job.shot_number,
            prior: Some(job.prior.clone()),
        }
    }

    fn disarm(&mut self) {
        self.prior = None;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        let shot_number = self.shot_number;
        if let Ok(mut project) = self.project.try_lock() {
            restore_interrupted(&mut project, shot_number, &prior);
            return;
        }
        // Someone else holds the lock; finish the restore on the runtime.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let project = Arc::clone(&self.project);
                handle.spawn(async move {
                    restore_interrupted(&mut *project.lock().await, shot_number, &prior);
                });
            }
            Err(_) => tracing::error!(shot_number, "Generation dropped outside a runtime, shot left generating"),
        }
    }
}

/// Runs generations against one backend, writing images under `output_dir`.
///
/// Holds the session seed cache, so one instance should serve the whole
/// process.
pub struct Orchestrator {
    backend: Arc<dyn ImageBackend>,
    output_dir: PathBuf,
    seeds: SeedPolicy,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn ImageBackend>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
            seeds: SeedPolicy::new(),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Override [`DEFAULT_GENERATION_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &Arc<dyn ImageBackend> {
        &self.backend
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn seed_policy(&self) -> &SeedPolicy {
        &self.seeds
    }

    // ---- phases ----

    /// Resolve the prompt and build the backend request for `shot_number`.
    ///
    /// A non-blank `custom_prompt` wins. Otherwise the stored prompt is used,
    /// compiling and storing one first if it is empty.
    pub fn prepare(
        &self,
        project: &mut StoryboardProject,
        shot_number: u32,
        custom_prompt: Option<&str>,
        on_step: StepHook,
    ) -> Result<GenerationJob, OrchestratorError> {
        let idx = project
            .shots
            .iter()
            .position(|s| s.shot_number == shot_number)
            .ok_or(OrchestratorError::ShotNotFound(shot_number))?;
        if project.shots[idx].status == ShotStatus::Generating {
            return Err(OrchestratorError::AlreadyGenerating(shot_number));
        }

        let custom = custom_prompt.map(str::trim).filter(|p| !p.is_empty());
        if custom.is_none() && project.shots[idx].generated_prompt.is_empty() {
            let mut shot = project.shots[idx].clone();
            refresh_shot(&mut shot, project);
            project.shots[idx] = shot;
        }

        let shot = &project.shots[idx];
        let mut prompt = custom.map(str::to_string).unwrap_or_else(|| shot.generated_prompt.clone());
        if self.backend.wants_consistency_prefix() {
            let prefix = consistency_prefix(project);
            if !prefix.is_empty() {
                prompt = format!("{prefix} {prompt}");
            }
        }

        let (width, height) = project.aspect_ratio.dimensions();
        let defaults = self.backend.sampler_defaults();
        let mut base = TextToImageRequest::new(prompt, width, height, &defaults);
        base.shot_number = shot_number;
        base.negative_prompt = negative_prompt(shot.template);
        base.seed = self.seeds.select(project).as_backend_value();
        base.references = collect_references(shot, project);
        base.on_step = on_step;

        let reference = if self.backend.takes_reference_images() {
            primary_character_reference(shot, project)
        } else {
            None
        };
        let request = match reference {
            Some(reference_path) => GenerationRequest::ImageToImage(ImageToImageRequest {
                base,
                reference_path,
                denoise: defaults.reference_denoise,
            }),
            None => GenerationRequest::TextToImage(base),
        };

        let job = GenerationJob {
            shot_number,
            project_name: project.name.clone(),
            request,
            prior: PriorState {
                status: project.shots[idx].status,
                last_error: project.shots[idx].last_error.clone(),
            },
        };
        project.shots[idx].mark_generating();
        tracing::info!(
            project = %job.project_name,
            shot_number,
            backend = %self.backend.kind(),
            seed = job.request.base().seed,
            "Shot generation started",
        );
        Ok(job)
    }

    /// Call the backend and persist the image. Never touches the project.
    pub async fn execute(&self, job: GenerationJob) -> ShotGenerationResult {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.backend.generate(&job.request)).await {
            Ok(Ok(image)) => self
                .write_image(&job, &image.bytes)
                .await
                .map(|path| (path, image.consistency_score)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        };
        let generation_time = started.elapsed().as_secs_f64();

        match outcome {
            Ok((path, score)) => {
                tracing::info!(shot_number = job.shot_number, path = %path, generation_time, "Shot generated");
                ShotGenerationResult {
                    shot_number: job.shot_number,
                    success: true,
                    image_path: Some(path),
                    error: None,
                    error_kind: None,
                    consistency_score: score,
                    generation_time,
                }
            }
            Err(e) => {
                tracing::warn!(shot_number = job.shot_number, error = %e, kind = ?e.kind(), "Shot generation failed");
                ShotGenerationResult {
                    shot_number: job.shot_number,
                    success: false,
                    image_path: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                    consistency_score: 0.0,
                    generation_time,
                }
            }
        }
    }

    /// Record `result` on its shot. A shot deleted in the meantime is ignored.
    pub fn apply(project: &mut StoryboardProject, result: &ShotGenerationResult) {
        let Some(shot) = project.shot_mut(result.shot_number) else {
            tracing::debug!(shot_number = result.shot_number, "Shot gone before result arrived");
            return;
        };
        match (&result.image_path, result.success) {
            (Some(path), true) => shot.mark_completed(path.clone(), result.consistency_score),
            _ => shot.mark_failed(
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "generation failed".to_string()),
            ),
        }
        project.touch();
    }

    /// `{output_dir}/{project}/shot_{nnn}_{timestamp}.png`, written via a
    /// temporary file so a failed write leaves nothing behind.
    async fn write_image(&self, job: &GenerationJob, bytes: &[u8]) -> Result<String, BackendError> {
        let dir = self.output_dir.join(sanitize_file_stem(&job.project_name));
        tokio::fs::create_dir_all(&dir).await?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("shot_{:03}_{timestamp}.png", job.shot_number));
        let partial = path.with_extension("png.part");

        if let Err(e) = tokio::fs::write(&partial, bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tokio::fs::rename(&partial, &path).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    // ---- whole operations ----

    /// Generate one shot of a project the caller holds exclusively.
    ///
    /// Works on a copy that is written back once the generation finishes, so
    /// dropping the future leaves `project` untouched.
    pub async fn generate_shot(
        &self,
        project: &mut StoryboardProject,
        shot_number: u32,
        custom_prompt: Option<&str>,
        on_step: StepHook,
    ) -> Result<ShotGenerationResult, OrchestratorError> {
        let shared = Arc::new(Mutex::new(project.clone()));
        let outcome = self
            .generate_shot_shared(&shared, shot_number, custom_prompt, on_step)
            .await;
        *project = std::mem::take(&mut *shared.lock().await);
        outcome
    }

    /// Generate one shot of a shared project, holding the lock only while
    /// preparing and applying.
    pub async fn generate_shot_shared(
        &self,
        project: &Arc<Mutex<StoryboardProject>>,
        shot_number: u32,
        custom_prompt: Option<&str>,
        on_step: StepHook,
    ) -> Result<ShotGenerationResult, OrchestratorError> {
        let (job, mut in_flight) = {
            let mut locked = project.lock().await;
            let job = self.prepare(&mut locked, shot_number, custom_prompt, on_step)?;
            let in_flight = InFlight::new(project, &job);
            (job, in_flight)
        };
        let result = self.execute(job).await;
        Self::apply(&mut *project.lock().await, &result);
        in_flight.disarm();
        Ok(result)
    }

    /// Generate every shot without an output image, in order.
    ///
    /// Individual failures are collected, never propagated. Like
    /// [`Orchestrator::generate_shot`] this works on a copy of `project`.
    pub async fn generate_all(
        &self,
        project: &mut StoryboardProject,
        progress: Option<&BatchProgressFn>,
    ) -> Result<BatchResult, OrchestratorError> {
        let shared = Arc::new(Mutex::new(project.clone()));
        let outcome = self.generate_all_shared(&shared, progress).await;
        *project = std::mem::take(&mut *shared.lock().await);
        outcome
    }

    pub async fn generate_all_shared(
        &self,
        project: &Arc<Mutex<StoryboardProject>>,
        progress: Option<&BatchProgressFn>,
    ) -> Result<BatchResult, OrchestratorError> {
        let plan: Vec<(u32, bool)> = {
            let guard = project.lock().await;
            guard.shots.iter().map(|s| (s.shot_number, s.has_output())).collect()
        };
        if plan.is_empty() {
            return Err(OrchestratorError::NoShots);
        }

        let total = plan.len();
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for (index, (shot_number, has_output)) in plan.into_iter().enumerate() {
            if has_output {
                skipped.push(shot_number);
                report_batch(progress, index, total, &format!("Skipping shot {shot_number}, already generated"));
                continue;
            }
            report_batch(progress, index, total, &format!("Generating shot {shot_number}..."));

            match self.generate_shot_shared(project, shot_number, None, StepHook::none()).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(shot_number, error = %e, "Skipping shot in batch");
                    results.push(ShotGenerationResult {
                        shot_number,
                        success: false,
                        image_path: None,
                        error: Some(e.to_string()),
                        error_kind: None,
                        consistency_score: 0.0,
                        generation_time: 0.0,
                    });
                }
            }
        }

        let success_count = results.iter().filter(|r| r.success).count();
        let message = format!("{success_count}/{total}");
        report_batch(progress, total, total, &format!("Generated {message} shots"));
        tracing::info!(success_count, total, skipped = skipped.len(), "Batch generation finished");

        Ok(BatchResult {
            success_count,
            total,
            message,
            results,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use storyboard_core::model::{Character, Shot};
    use storyboard_core::templates::ShotTemplate;

    use super::*;
    use crate::backend::{BackendKind, GeneratedImage};
    use crate::mock::MockBackend;

    /// Records every request and fails the shots listed in `fail`.
    #[derive(Default)]
    struct ScriptedBackend {
        seen: StdMutex<Vec<GenerationRequest>>,
        fail: Vec<u32>,
        delay: Duration,
        takes_references: bool,
    }

    #[async_trait]
    impl ImageBackend for ScriptedBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Mock
        }

        fn takes_reference_images(&self) -> bool {
            self.takes_references
        }

        fn wants_consistency_prefix(&self) -> bool {
            self.takes_references
        }

        async fn check_availability(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn text_to_image(&self, request: &TextToImageRequest) -> Result<GeneratedImage, BackendError> {
            self.generate(&GenerationRequest::TextToImage(request.clone())).await
        }

        async fn image_to_image(&self, request: &ImageToImageRequest) -> Result<GeneratedImage, BackendError> {
            self.generate(&GenerationRequest::ImageToImage(request.clone())).await
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, BackendError> {
            self.seen.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let shot_number = request.base().shot_number;
            if self.fail.contains(&shot_number) {
                return Err(BackendError::Api(format!("API error: 500 - shot {shot_number}")));
            }
            request.base().on_step.report(1, 1);
            Ok(GeneratedImage {
                bytes: b"img".to_vec(),
                consistency_score: 0.85,
            })
        }
    }

    fn project(shots: u32) -> StoryboardProject {
        let mut project = StoryboardProject::new("Coffee: Shop", Default::default());
        for n in 1..=shots {
            let mut shot = Shot::from_template(n, ShotTemplate::T4StandardMedium);
            shot.description = format!("moment {n}");
            project.shots.push(shot);
        }
        project
    }

    fn orchestrator(backend: Arc<dyn ImageBackend>, dir: &Path) -> Orchestrator {
        Orchestrator::new(backend, dir)
    }

    // -- prompt resolution --

    #[tokio::test]
    async fn custom_prompt_wins_and_stored_prompt_is_compiled_once() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::default());
        let orch = orchestrator(backend.clone(), dir.path());
        let mut project = project(2);

        orch.generate_shot(&mut project, 1, Some("  a red kite  "), StepHook::none()).await.unwrap();
        assert!(project.shots[0].generated_prompt.is_empty());

        orch.generate_shot(&mut project, 2, Some("   "), StepHook::none()).await.unwrap();
        assert!(project.shots[1].generated_prompt.contains("moment 2"));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].base().prompt, "a red kite");
        assert_eq!(seen[1].base().prompt, project.shots[1].generated_prompt);
        assert_eq!((seen[0].base().width, seen[0].base().height), (1024, 576));
        assert!(!seen[0].base().negative_prompt.is_empty());
    }

    #[tokio::test]
    async fn locked_seed_is_identical_across_shots() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::default());
        let orch = orchestrator(backend.clone(), dir.path());
        let mut project = project(3);

        orch.generate_all(&mut project, None).await.unwrap();
        let seen = backend.seen.lock().unwrap();
        let seeds: Vec<i64> = seen.iter().map(|r| r.base().seed).collect();
        assert!(seeds[0] >= 0);
        assert!(seeds.iter().all(|s| *s == seeds[0]));
    }

    #[tokio::test]
    async fn reference_backends_get_image_to_image_and_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = dir.path().join("ming.png");
        std::fs::write(&ref_path, b"ref").unwrap();

        let backend = Arc::new(ScriptedBackend {
            takes_references: true,
            ..Default::default()
        });
        let orch = orchestrator(backend.clone(), dir.path());
        let mut project = project(1);
        let mut ming = Character::new("Ming", "writer");
        ming.ref_images = vec![ref_path.to_string_lossy().into_owned()];
        project.shots[0].characters_in_shot = vec![ming.id.clone()];
        project.characters.push(ming);

        orch.generate_shot(&mut project, 1, Some("at the counter"), StepHook::none()).await.unwrap();
        let seen = backend.seen.lock().unwrap();
        assert_matches!(&seen[0], GenerationRequest::ImageToImage(req) => {
            assert!(req.reference_path.ends_with("ming.png"));
            assert_eq!(req.denoise, 0.7);
            assert!(req.base.prompt.ends_with(" at the counter"));
            assert!(req.base.prompt.len() > "at the counter".len() + 1);
        });
    }

    // -- state and persistence --

    #[tokio::test]
    async fn success_writes_png_and_completes_shot() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(MockBackend::new()), dir.path());
        let mut project = project(1);

        let result = orch.generate_shot(&mut project, 1, None, StepHook::none()).await.unwrap();
        assert!(result.success);
        let path = result.image_path.clone().unwrap();
        let name = Path::new(&path).file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("shot_001_") && name.ends_with(".png"), "{name}");
        assert!(path.contains("Coffee_ Shop"));
        assert!(Path::new(&path).exists());

        let shot = &project.shots[0];
        assert_eq!(shot.status, ShotStatus::Completed);
        assert_eq!(shot.output_image, path);
        assert_eq!(shot.consistency_score, 0.85);
    }

    #[tokio::test]
    async fn failure_keeps_previous_output_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend {
            fail: vec![1],
            ..Default::default()
        });
        let orch = orchestrator(backend, dir.path());
        let mut project = project(1);
        project.shots[0].output_image = "/old/shot.png".into();

        let result = orch.generate_shot(&mut project, 1, None, StepHook::none()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Transient));
        assert_eq!(project.shots[0].status, ShotStatus::Failed);
        assert_eq!(project.shots[0].output_image, "/old/shot.png");
        assert!(project.shots[0].last_error.as_deref().unwrap().contains("API error: 500"));
        assert!(!dir.path().join("Coffee_ Shop").exists());
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend {
            delay: Duration::from_secs(5),
            ..Default::default()
        });
        let orch = orchestrator(backend, dir.path()).with_timeout(Duration::from_millis(50));
        let mut project = project(1);

        let result = orch.generate_shot(&mut project, 1, None, StepHook::none()).await.unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
        assert_eq!(project.shots[0].status, ShotStatus::Failed);
    }

    #[tokio::test]
    async fn unknown_shot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(MockBackend::new()), dir.path());
        let mut project = project(1);
        assert_matches!(
            orch.generate_shot(&mut project, 4, None, StepHook::none()).await,
            Err(OrchestratorError::ShotNotFound(4))
        );
    }

    // -- concurrency --

    #[tokio::test]
    async fn second_request_for_generating_shot_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let orch = Arc::new(orchestrator(backend, dir.path()));
        let shared = Arc::new(Mutex::new(project(1)));

        let first = {
            let (orch, shared) = (Arc::clone(&orch), Arc::clone(&shared));
            tokio::spawn(async move { orch.generate_shot_shared(&shared, 1, None, StepHook::none()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(shared.lock().await.shots[0].status, ShotStatus::Generating);
        assert_matches!(
            orch.generate_shot_shared(&shared, 1, None, StepHook::none()).await,
            Err(OrchestratorError::AlreadyGenerating(1))
        );

        assert!(first.await.unwrap().unwrap().success);
        assert_eq!(shared.lock().await.shots[0].status, ShotStatus::Completed);
    }

    #[tokio::test]
    async fn aborted_generation_restores_shot_and_allows_retry() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend {
            delay: Duration::from_secs(5),
            ..Default::default()
        });
        let orch = Arc::new(orchestrator(backend, dir.path()).with_timeout(Duration::from_millis(300)));
        let mut start = project(1);
        start.shots[0].status = ShotStatus::Failed;
        start.shots[0].last_error = Some("earlier failure".into());
        let shared = Arc::new(Mutex::new(start));

        let task = {
            let (orch, shared) = (Arc::clone(&orch), Arc::clone(&shared));
            tokio::spawn(async move { orch.generate_shot_shared(&shared, 1, None, StepHook::none()).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(shared.lock().await.shots[0].status, ShotStatus::Generating);
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        {
            let project = shared.lock().await;
            assert_eq!(project.shots[0].status, ShotStatus::Failed);
            assert_eq!(project.shots[0].last_error.as_deref(), Some("earlier failure"));
        }

        let retry = orch.generate_shot_shared(&shared, 1, None, StepHook::none()).await.unwrap();
        assert_eq!(retry.error_kind, Some(ErrorKind::Timeout));
        assert_eq!(shared.lock().await.shots[0].status, ShotStatus::Failed);
    }

    #[tokio::test]
    async fn dropped_exclusive_generation_leaves_project_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend {
            delay: Duration::from_secs(5),
            ..Default::default()
        });
        let orch = orchestrator(backend, dir.path());
        let mut project = project(1);

        let outcome = tokio::time::timeout(
            Duration::from_millis(100),
            orch.generate_shot(&mut project, 1, None, StepHook::none()),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(project.shots[0].status, ShotStatus::Pending);
    }

    // -- batch --

    #[tokio::test]
    async fn batch_skips_finished_shots_and_survives_failures() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend {
            fail: vec![3],
            ..Default::default()
        });
        let orch = orchestrator(backend, dir.path());
        let mut project = project(4);
        project.shots[1].output_image = "/done/shot_002.png".into();
        project.shots[1].reconcile_status();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let progress = move |_: usize, total: usize, _: &str| {
            assert_eq!(total, 4);
            counter.fetch_add(1, Ordering::SeqCst);
        };
        let batch = orch.generate_all(&mut project, Some(&progress)).await.unwrap();

        assert_eq!(batch.message, "2/4");
        assert_eq!(batch.skipped, vec![2]);
        let attempted: Vec<(u32, bool)> = batch.results.iter().map(|r| (r.shot_number, r.success)).collect();
        assert_eq!(attempted, vec![(1, true), (3, false), (4, true)]);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(project.shots[2].status, ShotStatus::Failed);
        assert_eq!(project.completed_count(), 3);
    }

    #[tokio::test]
    async fn batch_with_panicking_progress_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(MockBackend::new()), dir.path());
        let mut project = project(2);
        let progress = |_: usize, _: usize, _: &str| panic!("ui went away");
        let batch = orch.generate_all(&mut project, Some(&progress)).await.unwrap();
        assert_eq!(batch.success_count, 2);
    }

    #[tokio::test]
    async fn batch_requires_shots() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(MockBackend::new()), dir.path());
        let mut project = StoryboardProject::default();
        assert_matches!(orch.generate_all(&mut project, None).await, Err(OrchestratorError::NoShots));
    }

    #[tokio::test]
    async fn step_progress_reaches_caller() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(Arc::new(ScriptedBackend::default()), dir.path());
        let mut project = project(1);
        let steps = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&steps);
        let hook = StepHook::new(Arc::new(move |_: u32, _: u32| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));
        orch.generate_shot(&mut project, 1, None, hook).await.unwrap();
        assert_eq!(steps.load(Ordering::SeqCst), 1);
    }
}

mod api;
mod archive;
mod audio;
mod batch;
mod config;
mod content;
mod error;
mod poll;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use api::{GeminiClient, GeminiSceneSource};
use archive::AssetKind;
use chrono::Utc;
use clap::Parser;
use config::{find_genre, AgeGroup, AspectRatio, DurationClass, Genre, Language, Tone, GENRES};
use content::Project;
use error::{Result, StudioError};
use poll::PollConfig;
use session::Session;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "shorts-studio")]
#[command(about = "AI shortform content studio: script, storyboard, clips and narration", long_about = None)]
struct Args {
    /// Video subject; leave empty to let the model pick a trending topic
    #[arg(short, long, default_value = "")]
    subject: String,

    /// Genre id (horror, romance, comedy, education, ...); omit for a recommendation
    #[arg(short, long)]
    genre: Option<String>,

    #[arg(long, value_enum, default_value_t = Language::Korean)]
    language: Language,

    #[arg(long, value_enum, default_value_t = DurationClass::Short)]
    duration: DurationClass,

    #[arg(long, value_enum, default_value_t = Tone::Friendly)]
    tone: Tone,

    #[arg(long, value_enum, default_value_t = AgeGroup::Twenties)]
    age_group: AgeGroup,

    /// Script length/verbosity weight, 0-100
    #[arg(long, default_value_t = 50)]
    script_length: u8,

    /// Visual style fed to the image prompts
    #[arg(long, default_value = "Photorealistic")]
    style: String,

    #[arg(long, value_enum, default_value_t = AspectRatio::Shorts)]
    aspect_ratio: AspectRatio,

    /// Number of storyboard scenes/images (minimum 2)
    #[arg(short = 'n', long, default_value_t = 4)]
    images: usize,

    /// Reference image every scene is conditioned on
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Pre-supplied image for one scene, 1-based: e.g. --scene-image 2=cover.png
    #[arg(long = "scene-image", value_name = "SCENE=PATH", value_parser = parse_scene_override)]
    scene_images: Vec<(usize, PathBuf)>,

    /// Also animate each scene into a short video clip
    #[arg(long)]
    videos: bool,

    /// Maximum seconds to wait for one video render
    #[arg(long, default_value_t = 600)]
    video_wait: u64,

    /// Skip narration synthesis
    #[arg(long)]
    skip_audio: bool,

    /// Working directory for generated assets
    #[arg(short = 'w', long, default_value = "./output")]
    work_dir: PathBuf,

    /// Gemini API key
    #[arg(long)]
    api_key: Option<String>,
}

fn parse_scene_override(raw: &str) -> std::result::Result<(usize, PathBuf), String> {
    let (scene, path) = raw
        .split_once('=')
        .ok_or_else(|| "expected SCENE=PATH, e.g. 2=cover.png".to_string())?;
    let scene: usize = scene
        .trim()
        .parse()
        .map_err(|_| format!("'{scene}' is not a scene number"))?;
    if scene == 0 {
        return Err("scene numbers start at 1".to_string());
    }
    Ok((scene, PathBuf::from(path)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let api_key = if let Some(key) = args.api_key.clone() {
        key
    } else if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        key
    } else {
        eprintln!("Error: GEMINI_API_KEY not found. Please set it via --api-key or the GEMINI_API_KEY environment variable");
        std::process::exit(1);
    };

    info!("Starting shortform content generation...");

    tokio::fs::create_dir_all(&args.work_dir)
        .await
        .context("Failed to create work directory")?;

    // Ctrl-C abandons the wait for an in-flight video job; the provider-side
    // job itself cannot be cancelled.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    if let Err(e) = run_generation(args, api_key, cancel).await {
        error!("Content generation failed: {}", e);
        std::process::exit(1);
    }

    info!("Content generation completed successfully!");
    Ok(())
}

async fn run_generation(args: Args, api_key: String, cancel: CancellationToken) -> Result<()> {
    let client = GeminiClient::new(api_key);

    // 1. Resolve the genre, asking the model when none was given
    let genre = resolve_genre(&client, &args).await?;

    // 2. Generate the content plan: script, titles, scene prompts, narration
    info!("Step 1/5: Generating content plan...");
    let request = config::ContentRequest::new(
        &genre,
        &args.subject,
        args.language,
        args.duration,
        args.tone,
        args.age_group,
        args.script_length,
        &args.style,
        args.aspect_ratio,
        args.images,
    )?;
    let draft = client.generate_content(&request).await?;
    let mut session = Session::new(Project::from_draft(&request, draft));
    info!(
        "Content plan ready: {} scenes, {} titles",
        session.project.scene_count(),
        session.project.titles.len()
    );
    write_text_outputs(&session.project, &args.work_dir).await?;

    // 3. Fill in the storyboard images
    info!("Step 2/5: Generating scene images...");
    apply_scene_overrides(&mut session, &args.scene_images).await?;
    let reference = match &args.reference {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .map_err(|e| StudioError::Precondition(format!(
                    "cannot read reference image {}: {e}",
                    path.display()
                )))?,
        ),
        None => None,
    };

    session.begin_image_batch()?;
    let prompts = session.project.image_prompts.clone();
    let source = GeminiSceneSource {
        client: &client,
        aspect_ratio: session.project.aspect_ratio,
        reference: reference.as_deref(),
    };
    let batch_result = batch::fill_missing_images(
        &prompts,
        &mut session.project.images,
        &source,
        |progress| {
            if progress.skipped {
                info!(
                    "Scene {} already has an image, skipping ({}%)",
                    progress.scene + 1,
                    progress.percent
                );
            } else {
                info!(
                    "Generated image for scene {} ({}/{}, {}%)",
                    progress.scene + 1,
                    progress.scene + 1,
                    progress.total,
                    progress.percent
                );
            }
        },
    )
    .await;
    session.finish_image_batch();
    let generated = batch_result?;
    info!("Image batch finished: {} newly generated", generated);

    for (scene, bytes) in session.project.images.iter() {
        let path = args.work_dir.join(format!("scene_{}.png", scene + 1));
        tokio::fs::write(&path, bytes).await?;
    }

    // 4. Animate each scene, one job in flight at a time
    if args.videos {
        info!("Step 3/5: Animating scenes...");
        let poll_config = PollConfig {
            max_wait: Duration::from_secs(args.video_wait),
            ..PollConfig::default()
        };
        let scene_count = session.project.scene_count();
        for scene in 0..scene_count {
            animate_scene(&client, &mut session, scene, &poll_config, &cancel, &args.work_dir)
                .await?;
            info!("Animated scene {} ({}/{})", scene + 1, scene + 1, scene_count);
        }
    } else {
        info!("Step 3/5: Skipped scene animation");
    }

    // 5. Narration
    if args.skip_audio {
        info!("Step 4/5: Skipped narration synthesis");
    } else {
        info!("Step 4/5: Synthesizing narration...");
        synthesize_narration(&client, &mut session, &args.work_dir).await?;
    }

    // 6. Package everything for download
    info!("Step 5/5: Packaging archives...");
    export_archive(&session.project.images, AssetKind::Image, &args.work_dir)?;
    export_archive(&session.project.videos, AssetKind::Video, &args.work_dir)?;

    Ok(())
}

async fn resolve_genre(client: &GeminiClient, args: &Args) -> Result<Genre> {
    match args.genre.as_deref() {
        Some(id) => find_genre(id).copied().ok_or_else(|| {
            let known: Vec<&str> = GENRES.iter().map(|g| g.id).collect();
            StudioError::Precondition(format!(
                "unknown genre '{id}'; available: {}",
                known.join(", ")
            ))
        }),
        None => {
            let recommendation = client
                .recommend_genre(args.tone, args.age_group, GENRES)
                .await?;
            let genre = find_genre(&recommendation.genre_id).copied().ok_or_else(|| {
                StudioError::Generation(format!(
                    "model recommended unknown genre '{}'",
                    recommendation.genre_id
                ))
            })?;
            info!(
                "Recommended genre: {} {} — {}",
                genre.icon, genre.name, recommendation.reason
            );
            Ok(genre)
        }
    }
}

async fn write_text_outputs(project: &Project, work_dir: &Path) -> Result<()> {
    tokio::fs::write(work_dir.join("script.txt"), &project.script).await?;
    tokio::fs::write(work_dir.join("narration.txt"), &project.tts_script).await?;
    let titles: String = project
        .titles
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}\n", i + 1, t))
        .collect();
    tokio::fs::write(work_dir.join("titles.txt"), titles).await?;
    Ok(())
}

async fn apply_scene_overrides(
    session: &mut Session,
    overrides: &[(usize, PathBuf)],
) -> Result<()> {
    for (scene, path) in overrides {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            StudioError::Precondition(format!("cannot read scene image {}: {e}", path.display()))
        })?;
        session.attach_scene_image(scene - 1, bytes)?;
        info!("Using supplied image for scene {}", scene);
    }
    Ok(())
}

async fn animate_scene(
    client: &GeminiClient,
    session: &mut Session,
    scene: usize,
    poll_config: &PollConfig,
    cancel: &CancellationToken,
    work_dir: &Path,
) -> Result<()> {
    session.begin_video(scene)?;
    match run_video_job(client, session, scene, poll_config, cancel).await {
        Ok(bytes) => {
            let path = work_dir.join(format!("scene_{}.mp4", scene + 1));
            tokio::fs::write(&path, &bytes).await?;
            session.complete_video(scene, bytes)?;
            Ok(())
        }
        Err(e) => {
            session.abort_video();
            Err(e)
        }
    }
}

async fn run_video_job(
    client: &GeminiClient,
    session: &Session,
    scene: usize,
    poll_config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let prompt = &session.project.image_prompts[scene];
    let image = session.project.images.get(scene).ok_or_else(|| {
        StudioError::Precondition(format!("scene {} lost its conditioning image", scene + 1))
    })?;

    let handle = client
        .submit_video(image, prompt, session.project.aspect_ratio)
        .await?;
    let uri = poll::await_operation(
        poll_config,
        cancel,
        || client.poll_video(&handle),
        |status| info!("{}", status),
    )
    .await?;
    client.download_video(&uri).await
}

async fn synthesize_narration(
    client: &GeminiClient,
    session: &mut Session,
    work_dir: &Path,
) -> Result<()> {
    session.begin_speech()?;
    let result = client
        .generate_speech(&session.project.tts_script.clone(), session.project.language)
        .await;
    match result {
        Ok(payload) => {
            session.finish_speech(Some(payload.clone()));
            let buffer = audio::decode_pcm16(&payload)?;
            let path = work_dir.join("narration.wav");
            buffer.write_wav(&path)?;
            info!(
                "Narration ready: {:.1}s at {} Hz -> {}",
                buffer.duration_secs(),
                buffer.sample_rate,
                path.display()
            );
            Ok(())
        }
        Err(e) => {
            session.finish_speech(None);
            Err(e)
        }
    }
}

fn export_archive(
    assets: &content::SceneAssets,
    kind: AssetKind,
    work_dir: &Path,
) -> Result<()> {
    match archive::write_archive(assets, kind, work_dir, Utc::now()) {
        Ok(path) => {
            info!("Packaged archive: {}", path.display());
            Ok(())
        }
        Err(StudioError::ArchiveEmpty(msg)) => {
            warn!("{}", msg);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

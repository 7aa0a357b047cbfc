//! Subcommand handlers for generate and config actions.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::args::{ConfigAction, GenerateArgs};
use crate::config::{default_path as get_config_path, Config, DEFAULT_CONFIG_TOML};
use crate::player::write_player_page;
use crate::scene::{SceneSession, DEFAULT_SCENE_TITLE};
use crate::veo::{api_key_from_env, Cancellation, PollPolicy, ReferenceImage, VeoClient, VeoError};

/// Interval for the progress dots.
const PROGRESS_TICK: Duration = Duration::from_secs(2);

/// How a `generate` run ended.
#[derive(Debug, PartialEq)]
pub enum GenerateOutcome {
    /// Player page written to this path.
    Played(PathBuf),
    /// Generation failed; these lines are for the user.
    Failed(Vec<String>),
}

/// Everything `generate` needs once CLI flags and config are merged.
#[derive(Debug, PartialEq)]
pub struct GenerateSettings {
    pub prompt: String,
    pub title: String,
    pub image_path: PathBuf,
    pub mime_type: Option<String>,
    pub output: PathBuf,
    pub policy: PollPolicy,
}

/// Merge CLI flags over the config file. Flags win.
pub fn resolve_settings(args: GenerateArgs, config: &Config) -> Result<GenerateSettings, String> {
    let prompt = args
        .prompt
        .or_else(|| config.scene.prompt.clone())
        .unwrap_or_default();
    if prompt.trim().is_empty() {
        return Err("No prompt given. Pass one as an argument or set [scene] prompt.".to_string());
    }

    let image_path = args
        .image
        .or_else(|| config.scene.reference_image.clone())
        .ok_or_else(|| {
            "No reference image given. Use --image or set [scene] reference_image.".to_string()
        })?;

    let mut policy = config.polling.policy();
    if let Some(secs) = args.interval {
        policy = policy.with_interval(Duration::from_secs(secs));
    }
    if let Some(secs) = args.timeout {
        policy = policy.with_timeout(Duration::from_secs(secs));
    }
    if let Some(max) = args.max_attempts {
        policy = policy.with_max_attempts(max);
    }
    if policy.interval.is_zero() {
        return Err("Polling interval must be greater than 0".to_string());
    }

    Ok(GenerateSettings {
        prompt,
        title: args
            .title
            .or_else(|| config.scene.title.clone())
            .unwrap_or_else(|| DEFAULT_SCENE_TITLE.to_string()),
        image_path,
        mime_type: args.mime_type.or_else(|| config.scene.image_mime_type.clone()),
        output: args.output.unwrap_or_else(|| config.output.path.clone()),
        policy,
    })
}

/// Read the reference image and work out its MIME type.
pub fn load_reference_image(path: &Path, mime_type: Option<&str>) -> Result<ReferenceImage, String> {
    let mime_type = match mime_type {
        Some(m) => m.to_string(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ReferenceImage::mime_type_for_extension)
            .ok_or_else(|| {
                format!(
                    "Cannot tell the image type of '{}'. Use --mime-type.",
                    path.display()
                )
            })?
            .to_string(),
    };

    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read reference image '{}': {}", path.display(), e))?;
    if bytes.is_empty() {
        return Err(format!("Reference image '{}' is empty", path.display()));
    }

    Ok(ReferenceImage::new(bytes, mime_type))
}

/// Run the generate command.
pub fn run_generate(args: GenerateArgs, config: &Config) -> Result<GenerateOutcome, String> {
    let settings = resolve_settings(args, config)?;
    let image = load_reference_image(&settings.image_path, settings.mime_type.as_deref())?;

    let api_key = api_key_from_env().map_err(|e| match e {
        VeoError::MissingApiKey => "GEMINI_API_KEY environment variable is not set.\n\n\
            Add your API key to a .env file:\n\
                echo 'GEMINI_API_KEY=your-api-key-here' >> .env\n\n\
            Or set it as an environment variable:\n\
                export GEMINI_API_KEY=\"your-api-key-here\""
            .to_string(),
        _ => e.to_string(),
    })?;

    let client = VeoClient::with_options(
        api_key.clone(),
        config.api.base_url.clone(),
        config.api.model.clone(),
    )
    .map_err(|e| format!("Failed to create Veo client: {}", e))?;

    let mut session = SceneSession::new(image, api_key)
        .with_title(settings.title.clone())
        .with_policy(settings.policy);
    session.set_prompt(settings.prompt.clone());

    let cancel = Cancellation::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .map_err(|e| format!("Failed to set Ctrl-C handler: {}", e))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    println!("Generating video for: \"{}\"", settings.prompt);
    print!("Bringing your scene to life");
    std::io::stdout().flush().ok();

    let busy = session.busy_flag();
    let outcome = rt.block_on(async {
        let generation = session.generate(&client, &cancel);
        tokio::pin!(generation);
        let mut ticker = tokio::time::interval(PROGRESS_TICK);
        loop {
            tokio::select! {
                result = &mut generation => {
                    break result.cloned().map_err(|e| e.lines().to_vec());
                }
                _ = ticker.tick() => {
                    if busy.is_busy() {
                        print!(".");
                        std::io::stdout().flush().ok();
                    }
                }
            }
        }
    });
    println!();

    match outcome {
        Ok(video) => {
            write_player_page(&video, &settings.output).map_err(|e| {
                format!(
                    "Failed to write player page '{}': {}",
                    settings.output.display(),
                    e
                )
            })?;
            println!("Video ready!");
            println!("  Title: {}", video.title);
            println!("  Id:    {}", video.id);
            println!("  Page:  {}", settings.output.display());
            Ok(GenerateOutcome::Played(settings.output))
        }
        Err(lines) => Ok(GenerateOutcome::Failed(lines)),
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config: &Config, config_path: Option<&Path>) {
    let config_path = config_path.map(PathBuf::from).unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  API base URL:   {}", config.api.base_url);
            println!("  Model:          {}", config.api.model);
            println!("  Poll interval:  {}s", config.polling.interval_secs);
            println!(
                "  Max attempts:   {}",
                config
                    .polling
                    .max_attempts
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
            println!(
                "  Timeout:        {}",
                config
                    .polling
                    .timeout_secs
                    .map(|s| format!("{}s", s))
                    .unwrap_or_else(|| "none".to_string())
            );
            println!(
                "  Title:          {}",
                config.scene.title.as_deref().unwrap_or(DEFAULT_SCENE_TITLE)
            );
            println!(
                "  Reference image: {}",
                config
                    .scene
                    .reference_image
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  Output page:    {}", config.output.path.display());
            println!(
                "  API key:        {}",
                if api_key_from_env().is_ok() { "set" } else { "not set" }
            );
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'veo-scene config show' to view current settings.");
                std::process::exit(1);
            }

            if let Some(parent) = config_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    std::process::exit(1);
                }
            }

            if let Err(e) = std::fs::write(&config_path, DEFAULT_CONFIG_TOML) {
                eprintln!("Error writing config file: {}", e);
                std::process::exit(1);
            }

            println!("Created config file: {}", config_path.display());
        }
    }
}

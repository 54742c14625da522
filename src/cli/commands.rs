use anyhow::{Context, Result};
use serde_json::json;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use super::{AnalyzeArgs, Commands, GenerateArgs, ModelCommands, ReferenceArgs};
use veo_studio::session::{spawn_generation, StudioEvent};
use veo_studio::{
    AnalysisResult, AspectRatio, Config, GenAiClient, GenerationOutcome, GenerationRequest,
    ModelStore, PersonGeneration, Quiet, ReferenceAnalyzer, VideoGenerator,
};

pub async fn dispatch(config: &Config, config_path: &Path, command: Commands, pretty: bool) -> Result<()> {
    let store = ModelStore::new(config_path);
    match command {
        Commands::Doctor => doctor(config, &store, pretty),
        Commands::Models { command } => match command {
            ModelCommands::List => list_models(&store, pretty),
            ModelCommands::Use(args) => use_model(&store, &args.id, pretty),
        },
        Commands::Generate(args) => generate(config, store, &args, pretty).await,
        Commands::Analyze(args) => analyze(config, store, &args, pretty).await,
        Commands::Reference(args) => reference(config, store, &args, pretty).await,
        Commands::Interactive => interactive(config, store).await,
    }
}

/// Shared client stack for the generating commands
fn build_generator(config: &Config, store: ModelStore) -> Result<Arc<VideoGenerator>> {
    config.validate()?;
    let client = GenAiClient::new(config).context("Failed to initialize GenAI client")?;
    Ok(Arc::new(VideoGenerator::new(
        Arc::new(client),
        store,
        &config.generation,
    )))
}

/// Doctor command - check configuration before spending API quota
pub fn doctor(config: &Config, store: &ModelStore, pretty: bool) -> Result<()> {
    let mut checks = vec![];

    checks.push(match config.validate() {
        Ok(()) => json!({
            "name": "api_key",
            "status": "ok",
            "message": "Configured"
        }),
        Err(e) => json!({
            "name": "api_key",
            "status": "error",
            "message": e.to_string()
        }),
    });

    checks.push(json!({
        "name": "endpoint",
        "status": "ok",
        "message": config.api.base_url().unwrap_or("default (generativelanguage.googleapis.com)")
    }));

    checks.push(match config.api.proxy() {
        Some(proxy) => match reqwest::Proxy::all(proxy) {
            Ok(_) => json!({ "name": "proxy", "status": "ok", "message": proxy }),
            Err(e) => json!({
                "name": "proxy",
                "status": "error",
                "message": format!("Invalid proxy URL {}: {}", proxy, e)
            }),
        },
        None => json!({ "name": "proxy", "status": "ok", "message": "Not set" }),
    });

    checks.push(match (store.current_model(), store.models()) {
        (Ok(current), Ok(models)) => {
            let known = models.iter().any(|m| m.id == current);
            json!({
                "name": "model",
                "status": if known { "ok" } else { "warning" },
                "message": if known { current } else { format!("{} (not in catalog)", current) },
                "path": store.path()
            })
        }
        (Err(e), _) | (_, Err(e)) => json!({
            "name": "model",
            "status": "error",
            "message": e.to_string(),
            "path": store.path()
        }),
    });

    checks.push(json!({
        "name": "analysis_model",
        "status": "ok",
        "message": config.api.analysis_model()
    }));

    checks.push(json!({
        "name": "output_dir",
        "status": "ok",
        "message": config.generation.output_dir.display().to_string()
    }));

    let failed = checks.iter().any(|c| c["status"] == "error");

    if pretty {
        println!("Veo Studio Doctor\n");
        for check in &checks {
            let status = check["status"].as_str().unwrap_or("unknown");
            let icon = match status {
                "ok" => "\u{2714}",      // ✔
                "warning" => "\u{26A0}", // ⚠
                "error" => "\u{2718}",   // ✘
                _ => "?",
            };
            println!(
                "{} {}: {}",
                icon,
                check["name"].as_str().unwrap_or(""),
                check["message"].as_str().unwrap_or("")
            );
            if let Some(path) = check["path"].as_str() {
                println!("    Path: {}", path);
            }
        }
    } else {
        println!("{}", serde_json::to_string(&json!({ "checks": checks }))?);
    }

    if failed {
        anyhow::bail!("Configuration check failed");
    }
    Ok(())
}

pub fn list_models(store: &ModelStore, pretty: bool) -> Result<()> {
    let models = store.models()?;
    let current = store.current_model()?;

    if pretty {
        println!("Available models:\n");
        for (i, model) in models.iter().enumerate() {
            let marker = if model.id == current { " (current)" } else { "" };
            println!("  {}. {} ({}){}", i + 1, model.name, model.id, marker);
            if !model.description.is_empty() {
                println!("      {}", model.description);
            }
        }
    } else {
        println!(
            "{}",
            json!({
                "current_model": current,
                "models": models,
                "count": models.len()
            })
        );
    }

    Ok(())
}

pub fn use_model(store: &ModelStore, id: &str, pretty: bool) -> Result<()> {
    store.set_current_model(id)?;

    if pretty {
        println!("\u{2714} Model set to: {}", id);
        println!("\n\u{1F4DD} Configuration saved to:");
        println!("   {}", store.path().display());
    } else {
        println!(
            "{}",
            json!({
                "status": "success",
                "current_model": id,
                "config_path": store.path()
            })
        );
    }

    Ok(())
}

pub async fn generate(config: &Config, store: ModelStore, args: &GenerateArgs, pretty: bool) -> Result<()> {
    let generator = build_generator(config, store)?;
    let request = args.params.request(&args.prompt);

    if pretty {
        println!("Generating video... This may take a while.");
    }
    let outcome = generator.generate_video(&request, &Quiet).await?;
    print_outcome(&outcome, None, pretty)
}

pub async fn analyze(config: &Config, store: ModelStore, args: &AnalyzeArgs, pretty: bool) -> Result<()> {
    let generator = build_generator(config, store)?;
    let analyzer = ReferenceAnalyzer::new(generator, &config.api, &config.generation);

    let analysis = analyzer
        .analyze_reference_video(&args.video, args.prompt.as_deref(), args.lang, &Quiet)
        .await?;

    if pretty {
        print_analysis_pretty(&analysis);
    } else {
        println!("{}", serde_json::to_string(&analysis)?);
    }
    Ok(())
}

pub async fn reference(config: &Config, store: ModelStore, args: &ReferenceArgs, pretty: bool) -> Result<()> {
    let generator = build_generator(config, store)?;
    let analyzer = ReferenceAnalyzer::new(generator, &config.api, &config.generation);
    let request = args.params.request(args.prompt.as_deref().unwrap_or(""));

    if pretty {
        println!("Analyzing reference video, then generating... This may take a while.");
    }
    let generated = analyzer
        .generate_video_from_reference(&args.video, &request, args.lang, &Quiet)
        .await?;

    if pretty {
        print_analysis_pretty(&generated.analysis);
        println!();
    }
    print_outcome(
        &generated.outcome,
        Some((&generated.final_prompt, &generated.analysis)),
        pretty,
    )
}

fn print_outcome(
    outcome: &GenerationOutcome,
    reference: Option<(&String, &AnalysisResult)>,
    pretty: bool,
) -> Result<()> {
    if pretty {
        match outcome {
            GenerationOutcome::Saved(path) => {
                println!("SUCCESS: Video generated at {}", path.display())
            }
            GenerationOutcome::NoVideos => {
                println!("No videos were generated. Try rephrasing the prompt.")
            }
        }
        return Ok(());
    }

    let mut result = match outcome {
        GenerationOutcome::Saved(path) => json!({ "status": "success", "video_path": path }),
        GenerationOutcome::NoVideos => json!({ "status": "no_result" }),
    };
    if let Some((final_prompt, analysis)) = reference {
        result["final_prompt"] = json!(final_prompt);
        result["analysis"] = serde_json::to_value(analysis)?;
    }
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn print_analysis_pretty(analysis: &AnalysisResult) {
    println!("Reference Analysis\n");
    if let Some(title) = analysis.title() {
        println!("Title: {}", title);
    }
    if let Some(description) = analysis.description() {
        println!("Description: {}", description);
    }
    let tags = analysis.tags();
    if !tags.is_empty() {
        println!("Tags: {}", tags.join(", "));
    }
    if let Some(notes) = analysis.style_notes() {
        println!("Style: {}", notes);
    }
    match analysis.refined_prompt() {
        Some(prompt) => println!("\nRefined prompt:\n  {}", prompt),
        None => println!("\n\u{26A0}  No refined prompt in response"),
    }
}

/// Print `label`, read one trimmed line; `None` on end of input
fn ask(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Interactive loop - one background job per prompt
pub async fn interactive(config: &Config, store: ModelStore) -> Result<()> {
    println!("=== Veo Video Generation Studio ===");

    if let Err(e) = config.validate() {
        println!("\nError: {}", e);
        println!("Please create a .env file with your GOOGLE_API_KEY.");
        std::process::exit(1);
    }
    let generator = build_generator(config, store)?;

    loop {
        println!("\n--- New Video Generation Task ---");
        let Some(prompt) = ask("Enter your video prompt (or 'q' to quit): ")? else {
            break;
        };

        if prompt.eq_ignore_ascii_case("q") {
            println!("Exiting...");
            break;
        }
        if prompt.is_empty() {
            println!("Prompt cannot be empty.");
            continue;
        }

        println!("\nOptional Parameters (press Enter to use default):");
        let aspect_ratio = match ask("Aspect Ratio [16:9]: ")?.as_deref() {
            None | Some("") => AspectRatio::default(),
            Some(value) => match value.parse() {
                Ok(ratio) => ratio,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
        };
        let person_generation = match ask("Person Generation [allow_adult]: ")?.as_deref() {
            None | Some("") => PersonGeneration::default(),
            Some(value) => match value.parse() {
                Ok(policy) => policy,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
        };

        let request = GenerationRequest::new(prompt)
            .with_aspect_ratio(aspect_ratio)
            .with_person_generation(person_generation);

        println!("\nGenerating video... This may take a while.");
        let job = spawn_generation(Arc::clone(&generator), request);
        let last = job
            .run_to_end(|event| {
                if let StudioEvent::Log(line) = event {
                    println!("  {}", line);
                }
            })
            .await;

        match last {
            StudioEvent::Finished(path) => {
                println!("\nSUCCESS: Video generated at {}", path.display())
            }
            StudioEvent::NoResult => {
                println!("\nFAILED: Generation completed but no video was returned.")
            }
            StudioEvent::Failed(message) => println!("\nFAILED: {}", message),
            _ => {}
        }
    }

    Ok(())
}

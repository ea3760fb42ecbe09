mod config;
mod context;
mod insights;
mod interview;
mod llm;
mod logging;
mod profile;
mod synthesis;
mod vendors;

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::Parser;
use tracing::{debug, info};

use crate::interview::InterviewState;
use crate::vendors::ProfileFields;

const AFTER_HELP: &str = "Available output formats:
  cursor      Cursor AI (.cursorrules)
  continue    Continue (.continuerules)
  aider       Aider (.aider.conf.yml)

Example usage:
  devprompt                # Interactive mode, display prompt
  devprompt -o cursor      # Save to .cursorrules for Cursor AI
  devprompt -o continue    # Save to .continuerules for Continue
  devprompt -o aider       # Save to .aider.conf.yml for Aider";

/// Generate personalized coding assistant prompts through an interactive
/// interview.
#[derive(Parser, Debug)]
#[command(name = "devprompt", version, after_help = AFTER_HELP)]
struct Cli {
    /// Output format for a specific coding assistant
    #[arg(
        short = 'o',
        long = "output-format",
        value_parser = clap::builder::PossibleValuesParser::new(vendors::KEYS)
    )]
    output_format: Option<String>,

    /// Skip the welcome message (useful for scripting)
    #[arg(long)]
    no_welcome: bool,

    /// Use the legacy field-based interview
    #[arg(long)]
    legacy: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("\nError: {e:#}");
        eprintln!("Please try again or report this issue.");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Config before logging: the configured level seeds the log filter.
    // Anything traced during config loading is dropped, which is fine.
    let loaded = config::load_config();

    let _logging_guard = match logging::init(&loaded.config.logging.level) {
        Ok(ctx) => {
            debug!(
                session_id = %ctx.session_id,
                log_directory = %ctx.log_directory.display(),
                "logging_initialized"
            );
            logging::cleanup_old_logs(&ctx.log_directory);
            Some(ctx)
        }
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    debug!(
        config_path = %loaded.config_path.display(),
        project_config = ?loaded.project_config_path,
        status = ?loaded.status,
        "config_loaded"
    );

    if !cli.no_welcome {
        print_welcome();
    }

    let generator = llm::OpenAiClient::from_config(&loaded.config)
        .map_err(|e| anyhow!("failed to build text-generation client: {e}"))?;

    println!("Starting interview...");
    println!("{}", "-".repeat(30));

    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let project_context = context::detect(&working_dir);

    let (prompt, profile_fields) = if cli.legacy {
        let answers = profile::conduct_legacy(&project_context, &generator, true);
        if answers.is_empty() {
            println!("\nInterview cancelled. No files were created.");
            return Ok(());
        }

        println!("{}", "-".repeat(30));
        println!("Generating your personalized prompt...");
        let prompt = profile::generate_legacy_prompt(&answers, &generator)
            .map_err(|e| anyhow!("prompt generation failed: {e}"))?;
        (prompt, answers.to_map())
    } else {
        let interview = interview::conduct(project_context, &generator, true);
        if interview.exchanges().is_empty() {
            println!("\nInterview cancelled. No files were created.");
            return Ok(());
        }

        println!("{}", "-".repeat(30));
        println!("Generating your personalized prompt...");
        let prompt = synthesis::generate_prompt(&interview, None, &generator)
            .map_err(|e| anyhow!("prompt generation failed: {e}"))?;
        let fields = fields_from_interview(&interview);
        (prompt, fields)
    };

    info!(chars = prompt.len(), "prompt_generated");

    match &cli.output_format {
        Some(vendor_key) => {
            let output_dir = loaded.config.output_dir();
            let path = vendors::export(vendor_key, &prompt, &profile_fields, &output_dir)?;
            print_completion(Some((vendor_key.as_str(), path.as_path())));
        }
        None => {
            println!();
            println!("{}", "=".repeat(80));
            println!("YOUR PERSONALIZED CODING ASSISTANT PROMPT");
            println!("{}", "=".repeat(80));
            println!("{prompt}");
            println!("{}", "=".repeat(80));
            print_completion(None);
        }
    }

    Ok(())
}

/// Derive the vendor-header fields from a conversational interview.
fn fields_from_interview(interview: &InterviewState) -> ProfileFields {
    let mut fields = ProfileFields::new();

    let languages = if interview.insights().languages.is_empty() {
        interview.project_context().languages.clone()
    } else {
        interview.insights().languages.clone()
    };
    if !languages.is_empty() {
        fields.insert("primary_languages".to_string(), languages.join(", "));
    }

    if let Some(focus) = &interview.insights().project_focus {
        fields.insert("current_project".to_string(), focus.clone());
    }

    fields
}

fn print_welcome() {
    println!("DevPrompt - Adaptive Developer Prompt Generation");
    println!("{}", "=".repeat(50));
    println!("I'll ask you a few questions to create a personalized coding assistant prompt.");
    println!("This should take about 2-3 minutes. Let's get started!");
    println!();
}

fn print_completion(saved: Option<(&str, &Path)>) {
    println!();
    println!("Interview complete! Your personalized prompt has been generated.");

    match saved {
        Some((vendor_key, path)) => {
            let name = vendors::lookup(vendor_key)
                .map(|v| v.name)
                .unwrap_or(vendor_key);
            println!("{} rules saved to: {}", name, path.display());
            println!("Your coding assistant is now configured with your preferences!");
        }
        None => {
            println!("Use -o to save to your preferred coding assistant format.");
        }
    }

    println!();
    println!("Thanks for using DevPrompt!");
}

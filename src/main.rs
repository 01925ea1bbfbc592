use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexushub::HubError;
use nexushub::cli::CommandContext;
use nexushub::cli::commands::{chat, config, draft, resource, task, video};

#[derive(Parser)]
#[command(name = "nexushub")]
#[command(
    version,
    about = "AI-assisted task board, knowledge hub and video analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft three task variants from a free-form request
    Draft {
        #[arg(help = "What needs to be done, in your own words")]
        input: String,
        #[arg(long, help = "Create the N-th draft (1-3) as a task")]
        pick: Option<usize>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Manage tasks on the board
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage knowledge hub resources
    Resource {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Analyze videos
    Video {
        #[command(subcommand)]
        action: VideoAction,
    },

    /// Chat with the assistant (interactive when no message is given)
    Chat {
        message: Option<String>,
        #[arg(long, help = "Attach an image to the first message")]
        image: Option<PathBuf>,
        #[arg(long, help = "Model override")]
        model: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Create a task
    Add {
        title: String,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short, help = "HIGH, MEDIUM or LOW")]
        priority: Option<String>,
        #[arg(long)]
        product: Option<String>,
        #[arg(long = "type")]
        task_type: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks grouped by status
    List {
        #[arg(long, short, help = "Only this status")]
        status: Option<String>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show one task
    Show {
        id: String,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Move a task to another status
    Status { id: String, status: String },
    /// Generate an execution strategy
    Analyze { id: String },
    /// Suggest a subtask checklist
    Subtasks {
        id: String,
        #[arg(long, help = "Add the suggestions to the task")]
        apply: bool,
    },
    /// Toggle a subtask's completion
    Toggle { id: String, subtask: String },
    /// Guide chat about a task (interactive when no message is given)
    Chat { id: String, message: Option<String> },
    /// Delete a task
    Delete { id: String },
}

#[derive(Subcommand)]
enum ResourceAction {
    /// Add a resource from a URL or a local file
    Add {
        url: Option<String>,
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,
    },
    /// Re-run analysis for a stored resource
    Retry { id: String },
    /// List resources, newest first
    List {
        #[arg(long, help = "Only resources whose analysis failed")]
        failed: bool,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show one resource
    Show {
        id: String,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Delete a resource
    Delete { id: String },
}

#[derive(Subcommand)]
enum VideoAction {
    /// Detailed analysis of a video URL
    Analyze {
        url: String,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Analyze frames sampled from a video
    Frames {
        #[arg(help = "Name of the video the frames were taken from")]
        name: String,
        #[arg(long = "frame", required = true, help = "Frame image, in playback order")]
        frames: Vec<PathBuf>,
        #[arg(long, help = "Video duration in seconds")]
        duration: f64,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Quick markdown summary of a video URL
    Summary { url: String },
    /// List past analyses, newest first
    History {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show one past analysis
    Show {
        id: String,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mNexusHub encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = e
                .downcast_ref::<HubError>()
                .map(HubError::user_message)
                .unwrap_or_else(|| e.to_string());
            eprintln!("\x1b[31mError:\x1b[0m {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Config { action } = cli.command {
        match action {
            ConfigAction::Show { global, format } => config::show(global, &format)?,
            ConfigAction::Path => config::path()?,
            ConfigAction::Init { global, force } => {
                if global {
                    config::init_global(force)?;
                } else {
                    config::init_project()?;
                }
            }
        }
        return Ok(());
    }

    let rt = Runtime::new()?;
    rt.block_on(dispatch(cli.command))?;
    Ok(())
}

async fn dispatch(command: Commands) -> nexushub::Result<()> {
    let ctx = CommandContext::load()?;

    match command {
        Commands::Draft {
            input,
            pick,
            format,
        } => draft::run(&ctx, &input, pick, &format).await,
        Commands::Task { action } => match action {
            TaskAction::Add {
                title,
                description,
                priority,
                product,
                task_type,
                due,
            } => task::add(
                &ctx,
                task::NewTask {
                    title,
                    description,
                    priority,
                    product,
                    task_type,
                    due_date: due,
                },
            ),
            TaskAction::List { status, format } => task::list(&ctx, status.as_deref(), &format),
            TaskAction::Show { id, format } => task::show(&ctx, &id, &format),
            TaskAction::Status { id, status } => task::status(&ctx, &id, &status),
            TaskAction::Analyze { id } => task::analyze(&ctx, &id).await,
            TaskAction::Subtasks { id, apply } => task::subtasks(&ctx, &id, apply).await,
            TaskAction::Toggle { id, subtask } => task::toggle(&ctx, &id, &subtask),
            TaskAction::Chat { id, message } => task::chat(&ctx, &id, message.as_deref()).await,
            TaskAction::Delete { id } => task::delete(&ctx, &id),
        },
        Commands::Resource { action } => match action {
            ResourceAction::Add { url, file } => {
                resource::add(&ctx, url.as_deref(), file.as_deref()).await
            }
            ResourceAction::Retry { id } => resource::retry(&ctx, &id).await,
            ResourceAction::List { failed, format } => resource::list(&ctx, failed, &format),
            ResourceAction::Show { id, format } => resource::show(&ctx, &id, &format),
            ResourceAction::Delete { id } => resource::delete(&ctx, &id),
        },
        Commands::Video { action } => match action {
            VideoAction::Analyze { url, format } => video::analyze(&ctx, &url, &format).await,
            VideoAction::Frames {
                name,
                frames,
                duration,
                format,
            } => video::frames(&ctx, &name, &frames, duration, &format).await,
            VideoAction::Summary { url } => video::summary(&ctx, &url).await,
            VideoAction::History { format } => video::history(&ctx, &format),
            VideoAction::Show { id, format } => video::show(&ctx, &id, &format),
        },
        Commands::Chat {
            message,
            image,
            model,
        } => chat::run(&ctx, message.as_deref(), image.as_deref(), model.as_deref()).await,
        Commands::Config { .. } => Ok(()),
    }
}

//! CLI binary for subcruncher.
//!
//! A thin shim over the library crate: maps subcommands to `App` calls and
//! prints what happened.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subcruncher::{
    App, ClientConfig, ConversionMode, ConvertIntent, ConvertOutcome, Credentials,
    FileSessionStorage, NotificationLevel, Notifier, Preview, PreviewStatus, RenderedPage,
    Resolution, Route, SignupPayload,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal notifier using indicatif ────────────────────────────────────────

/// Prints toasts to stderr and shows a spinner while a conversion runs.
struct CliNotifier {
    spinner: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl CliNotifier {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
            quiet,
        })
    }
}

impl Notifier for CliNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        if self.quiet && level != NotificationLevel::Error {
            return;
        }
        let line = match level {
            NotificationLevel::Info => format!("{} {}", cyan("◆"), message),
            NotificationLevel::Success => format!("{} {}", green("✔"), message),
            NotificationLevel::Error => format!("{} {}", red("✘"), red(message)),
        };
        let spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        match spinner.as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn loading_started(&self, label: &str) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
    }

    fn loading_finished(&self) {
        if let Some(bar) = self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sign in (the session is kept until logout)
  subcruncher login --email me@example.com --password '...'

  # Convert and save converted_report.docx into ./out
  subcruncher convert report.docx -o out

  # Convert the other way and preview page 2 at 150 %
  subcruncher convert report.docx --mode reverse --preview --page 2 --zoom 1.5

  # Render page 1 of a local PDF to PNG (no network)
  subcruncher preview converted_report.pdf --out page1.png

  # Interactive dashboard
  subcruncher dashboard

DASHBOARD COMMANDS:
  open <path>            select a .docx file
  mode <forward|reverse> L500 to Chamber / Chamber to L500
  convert | preview      convert and preview the result
  download [dir]         convert for download, or save the last result
  next | prev            page navigation
  zoom+ | zoom-          zoom in 10 % steps (50 %–200 %)
  page [N]               show the current page, or jump to page N
  logout | help | quit

ENVIRONMENT VARIABLES:
  SUBCRUNCHER_EMAIL      Default for --email
  SUBCRUNCHER_PASSWORD   Default for --password
  PDFIUM_LIB_PATH        Directory containing libpdfium (PDF previews)
  RUST_LOG               Tracing filter, overrides --verbose / --quiet
"#;

/// Terminal client for the SubCruncher document converter.
#[derive(Parser, Debug)]
#[command(
    name = "subcruncher",
    version,
    about = "Convert L500 / Chamber documents with the SubCruncher service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory containing the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable INFO-level tracing logs.
    #[arg(short, long, global = true, env = "SUBCRUNCHER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SUBCRUNCHER_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long, env = "SUBCRUNCHER_EMAIL")]
        email: String,
        #[arg(long, env = "SUBCRUNCHER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account.
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, env = "SUBCRUNCHER_EMAIL")]
        email: String,
        #[arg(long, env = "SUBCRUNCHER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show the stored session.
    Whoami,

    /// Convert a .docx file (requires a session).
    Convert {
        /// The .docx file to convert.
        file: PathBuf,

        /// Conversion direction.
        #[arg(long, value_enum, default_value = "forward")]
        mode: ModeArg,

        /// Preview the result instead of saving it.
        #[arg(long)]
        preview: bool,

        #[command(flatten)]
        view: ViewArgs,

        /// Save the converted file into this directory.
        #[arg(short = 'o', long = "output-dir", conflicts_with = "preview")]
        output_dir: Option<PathBuf>,
    },

    /// Render a page of a local PDF or DOCX (no network).
    Preview {
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Interactive session: select, convert, page through, download.
    Dashboard,
}

#[derive(clap::Args, Debug)]
struct ViewArgs {
    /// Page to show (1-based, clamped).
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Zoom factor, 0.5–2.0 in 0.1 steps.
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    /// Write the page to this file (PNG for PDF pages, text for DOCX).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// L500 to Chamber.
    Forward,
    /// Chamber to L500.
    Reverse,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Forward => ConversionMode::L500ToChamber,
            ModeArg::Reverse => ConversionMode::ChamberToL500,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ClientConfig::builder();
    if let Some(ref dir) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir);
    }
    if let Command::Convert {
        output_dir: Some(ref dir),
        ..
    } = cli.command
    {
        builder = builder.download_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let storage = FileSessionStorage::new(config.session_file());
    let notifier = CliNotifier::new(cli.quiet);
    let mut app = App::new(config, storage, notifier).context("Failed to create HTTP client")?;

    match cli.command {
        Command::Login { email, password } => {
            app.navigate(Route::Login.path());
            app.sign_in(&Credentials::new(email, password))
                .await
                .context("Sign-in failed")?;
            if !cli.quiet {
                eprintln!(
                    "   session saved to {}",
                    dim(&app.store().storage().path().display().to_string())
                );
            }
        }

        Command::Signup {
            name,
            email,
            password,
        } => {
            app.navigate(Route::Signup.path());
            app.sign_up(&SignupPayload {
                name,
                email,
                password,
            })
            .await
            .context("Sign-up failed")?;
            if !cli.quiet {
                eprintln!("   next: {}", bold("subcruncher login --email ..."));
            }
        }

        Command::Logout => {
            app.sign_out();
            if !cli.quiet {
                eprintln!("{} Signed out", green("✔"));
            }
        }

        Command::Whoami => {
            let state = app.state();
            match (&state.user, state.is_authenticated()) {
                (Some(user), true) => println!("{}", user.email),
                (Some(user), false) => println!("{} {}", user.email, dim("(no token)")),
                (None, true) => println!("{}", dim("(token only)")),
                (None, false) => {
                    println!("not signed in");
                    std::process::exit(1);
                }
            }
        }

        Command::Convert {
            file,
            mode,
            preview,
            view,
            output_dir: _,
        } => {
            require_session(&mut app)?;
            let wf = app.workflow_mut();
            wf.select_path(&file)
                .await
                .with_context(|| format!("Cannot use {}", file.display()))?;
            wf.set_mode(mode.into());

            let intent = if preview {
                ConvertIntent::Preview
            } else {
                ConvertIntent::Download
            };
            let outcome = wf.convert(intent).await.context("Conversion failed")?;

            match outcome {
                ConvertOutcome::Downloaded { path } => {
                    if !cli.quiet {
                        eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
                    }
                }
                ConvertOutcome::Previewed { .. } => match wf.preview_mut() {
                    PreviewStatus::Ready(p) => show_page(p, &view).await?,
                    _ => bail!("The converted document could not be rendered for preview"),
                },
                ConvertOutcome::Skipped(reason) => bail!("Conversion skipped: {:?}", reason),
            }
        }

        Command::Preview { file, view } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut preview = Preview::load(Arc::new(bytes), app.config())
                .await
                .with_context(|| format!("Cannot preview {}", file.display()))?;
            show_page(&mut preview, &view).await?;
        }

        Command::Dashboard => {
            require_session(&mut app)?;
            dashboard(&mut app).await?;
        }
    }

    Ok(())
}

/// Route-guard check for commands that need a signed-in user.
fn require_session(app: &mut App<FileSessionStorage>) -> Result<()> {
    match app.navigate(Route::Dashboard.path()) {
        Resolution::Render(Route::Dashboard) => Ok(()),
        _ => bail!("Not signed in. Run `subcruncher login` first."),
    }
}

async fn show_page(preview: &mut Preview, view: &ViewArgs) -> Result<()> {
    let state = preview.state_mut();
    state.go_to(view.page);
    state.set_scale(view.zoom);

    let page = preview
        .render_current()
        .await
        .context("Failed to render page")?;
    eprintln!("{}", dim(&preview.state().status_line()));

    match view.out {
        Some(ref out) => {
            page.write_to(out)?;
            eprintln!("{} {}", green("✔"), bold(&out.display().to_string()));
        }
        None => {
            for line in page.display_lines() {
                println!("{line}");
            }
        }
    }
    Ok(())
}

// ── Interactive dashboard ────────────────────────────────────────────────────

const DASHBOARD_HELP: &[&str] = &[
    "open <path>  mode <forward|reverse>  convert  preview  download [dir]",
    "next  prev  zoom+  zoom-  page [N]  logout  help  quit",
];

async fn dashboard(app: &mut App<FileSessionStorage>) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut page: Option<RenderedPage> = None;
    let mut notice: Vec<String> = DASHBOARD_HELP.iter().map(|s| s.to_string()).collect();

    loop {
        print!("{}", app.screen(dashboard_lines(app, page.as_ref(), &notice)));
        notice.clear();
        eprint!("{} ", cyan("›"));

        let Some(line) = stdin.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let arg = parts.collect::<Vec<_>>().join(" ");
        let default_dir = app.config().download_dir.clone();
        let wf = app.workflow_mut();

        match cmd {
            "" => {}
            "open" if !arg.is_empty() => {
                match wf.select_path(Path::new(&arg)).await {
                    Ok(_) => page = None,
                    // Rendered below the status line from `wf.error()`.
                    Err(e) => warn!("open failed: {}", e),
                }
            }
            "mode" => match arg.parse::<ConversionMode>() {
                Ok(mode) => wf.set_mode(mode),
                Err(e) => notice.push(red(&e)),
            },
            "convert" | "preview" => {
                if let Ok(ConvertOutcome::Skipped(reason)) = wf.convert(ConvertIntent::Preview).await {
                    notice.push(format!("nothing to do ({reason:?})"));
                }
                page = render_current(wf.preview()).await;
            }
            "download" => {
                let result = if wf.artifact().is_some() {
                    let dir = if arg.is_empty() {
                        default_dir
                    } else {
                        PathBuf::from(&arg)
                    };
                    wf.download(&dir).await.map(Some)
                } else {
                    wf.convert(ConvertIntent::Download).await.map(|o| match o {
                        ConvertOutcome::Downloaded { path } => Some(path),
                        _ => None,
                    })
                };
                match result {
                    Ok(Some(path)) => notice.push(format!("saved {}", path.display())),
                    Ok(None) => notice.push("nothing to download".to_string()),
                    Err(e) => warn!("{}", e),
                }
            }
            "next" | "prev" | "zoom+" | "zoom-" | "page" => {
                if let Some(p) = wf.preview_mut().preview_mut() {
                    let state = p.state_mut();
                    match cmd {
                        "next" => {
                            state.next_page();
                        }
                        "prev" => {
                            state.prev_page();
                        }
                        "zoom+" => state.zoom_in(),
                        "zoom-" => state.zoom_out(),
                        _ => {
                            if let Ok(n) = arg.parse::<usize>() {
                                state.go_to(n);
                            }
                        }
                    }
                }
                page = render_current(wf.preview()).await;
            }
            "logout" => {
                app.sign_out();
                eprintln!("{} Signed out", green("✔"));
                break;
            }
            "help" => notice.extend(DASHBOARD_HELP.iter().map(|s| s.to_string())),
            "quit" | "exit" => break,
            other => notice.push(red(&format!("unknown command '{other}' (try help)"))),
        }
    }
    Ok(())
}

/// Render the current preview page, if there is one. Failures are logged.
async fn render_current(status: &PreviewStatus) -> Option<RenderedPage> {
    let preview = status.preview()?;
    match preview.render_current().await {
        Ok(page) => Some(page),
        Err(e) => {
            warn!("Preview render failed: {}", e);
            None
        }
    }
}

fn dashboard_lines(
    app: &App<FileSessionStorage>,
    page: Option<&RenderedPage>,
    notice: &[String],
) -> Vec<String> {
    let wf = app.workflow();
    let mut lines = vec![
        bold("Dashboard"),
        String::new(),
        format!(
            "File:    {}",
            wf.selected_file()
                .map(|f| format!("{} ({} bytes)", f.name(), f.len()))
                .unwrap_or_else(|| dim("none (open <path>)"))
        ),
        format!("Mode:    {}", wf.mode()),
        format!("Status:  {:?}", wf.state()),
    ];
    if let Some(err) = wf.error() {
        lines.push(red(err));
    }
    lines.push(String::new());

    match wf.preview() {
        PreviewStatus::Empty => lines.push(dim("Convert a document to see the preview")),
        PreviewStatus::Loading => lines.push(dim("Loading preview…")),
        PreviewStatus::Ready(p) => {
            lines.push(dim(&p.state().status_line()));
            lines.push(String::new());
            if let Some(page) = page {
                lines.extend(page.display_lines());
            }
        }
    }

    if !notice.is_empty() {
        lines.push(String::new());
        lines.extend(notice.iter().cloned());
    }
    lines
}

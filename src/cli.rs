use crate::client::{ApiClient, SettingsStore};
use crate::config::{Config, load_config};
use crate::layout::{Layout, compute_layout};
use crate::layout_dump::write_layout_dump;
use crate::model::{GraphPayload, Toggles};
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_svg, write_output_svg};
use crate::session::{GraphView, ViewState};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bpmn-graph", version, about = "Layered layout and SVG rendering of process graphs")]
pub struct Cli {
    /// Settings file holding the API base URL and bearer token
    #[arg(long = "settings", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lay out a graph payload and write it as SVG or PNG
    Render(RenderArgs),
    /// Store a bearer token (and optionally the API base URL)
    Login {
        #[arg(long)]
        token: String,
        #[arg(long = "api-base")]
        api_base: Option<String>,
    },
    /// Forget the stored bearer token
    Logout,
    /// Print the effective API settings
    Settings,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Graph payload JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Fetch the graph of this process from the API instead of reading input
    #[arg(long = "process-id", conflicts_with = "input")]
    pub process_id: Option<i64>,

    #[command(flatten)]
    pub toggles: ToggleArgs,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file (theme, themeVariables, layout)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Also write the computed geometry as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Default PNG width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Default PNG height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub struct ToggleArgs {
    /// Show inbound actions under each activity
    #[arg(long)]
    pub inbound: bool,
    /// Show outbound actions under each activity
    #[arg(long)]
    pub outbound: bool,
    /// Show conditions on edges
    #[arg(long = "node-conditions")]
    pub node_conditions: bool,
    /// Show commands on edges
    #[arg(long = "node-commands")]
    pub node_commands: bool,
    /// Shorthand for all four toggles
    #[arg(long)]
    pub all: bool,
}

impl ToggleArgs {
    pub fn resolve(self) -> Toggles {
        if self.all {
            return Toggles::all();
        }
        Toggles {
            inbound: self.inbound,
            outbound: self.outbound,
            node_conditions: self.node_conditions,
            node_commands: self.node_commands,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => render(args, cli.settings),
        Command::Login { token, api_base } => {
            let store = settings_store(cli.settings)?;
            let mut settings = store.load()?;
            if let Some(base) = api_base {
                settings.base_url = base;
            }
            settings.login(token);
            store.save(&settings)?;
            println!("Logged in to {}", settings.base_url);
            Ok(())
        }
        Command::Logout => {
            let store = settings_store(cli.settings)?;
            store.clear_token()?;
            println!("Logged out");
            Ok(())
        }
        Command::Settings => {
            let store = settings_store(cli.settings)?;
            let settings = store.load()?.with_env_overrides();
            println!("settings file: {}", store.path().display());
            println!("api base: {}", settings.base_url);
            println!(
                "token: {}",
                if settings.is_authenticated() { "set" } else { "not set" }
            );
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn settings_store(path: Option<PathBuf>) -> Result<SettingsStore> {
    match path {
        Some(path) => Ok(SettingsStore::new(path)),
        None => Ok(SettingsStore::default_location()?),
    }
}

fn render(args: RenderArgs, settings: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let toggles = args.toggles.resolve();
    let layout = match args.process_id {
        Some(process_id) => fetch_layout(process_id, toggles, &config, settings)?,
        None => {
            let input = read_input(args.input.as_deref())?;
            let payload = GraphPayload::from_json(&input).context("invalid graph payload")?;
            compute_layout(&payload, toggles, &config.layout)
        }
    };

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout)?;
    }

    let svg = render_svg(&layout, &config.theme);
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref()),
        OutputFormat::Png => write_png(&svg, args.output.as_deref(), &config),
    }
}

fn fetch_layout(
    process_id: i64,
    toggles: Toggles,
    config: &Config,
    settings: Option<PathBuf>,
) -> Result<Layout> {
    let api = settings_store(settings)?.load()?.with_env_overrides();
    let client = ApiClient::new(&api);
    let view = GraphView::new(process_id, toggles, config.layout.clone());
    match current_thread_runtime()?.block_on(view.refresh(&client)) {
        ViewState::Ready(layout) => Ok(layout),
        ViewState::Failed(message) => Err(anyhow::anyhow!(message)),
        ViewState::Loading => Err(anyhow::anyhow!("graph of process {process_id} did not load")),
    }
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let output = ensure_output(output, "png")?;
    write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: Option<&Path>, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg_attr(not(feature = "png"), allow(dead_code))]
fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn all_flag_enables_every_toggle() {
        let cli = Cli::parse_from(["bpmn-graph", "render", "-i", "graph.json", "--all"]);
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.toggles.resolve(), Toggles::all());
    }

    #[test]
    fn individual_toggles() {
        let cli = Cli::parse_from([
            "bpmn-graph",
            "render",
            "--inbound",
            "--node-commands",
            "-e",
            "png",
            "-o",
            "out.png",
        ]);
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        let toggles = args.toggles.resolve();
        assert!(toggles.inbound && toggles.node_commands);
        assert!(!toggles.outbound && !toggles.node_conditions);
        assert_eq!(args.output_format, OutputFormat::Png);
    }

    #[test]
    fn process_id_conflicts_with_input() {
        let result = Cli::try_parse_from([
            "bpmn-graph",
            "render",
            "-i",
            "graph.json",
            "--process-id",
            "4",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn login_takes_token_and_base() {
        let cli = Cli::parse_from([
            "bpmn-graph",
            "--settings",
            "/tmp/s.json",
            "login",
            "--token",
            "abc",
            "--api-base",
            "http://example.test/v1",
        ]);
        assert_eq!(cli.settings.as_deref(), Some(Path::new("/tmp/s.json")));
        let Command::Login { token, api_base } = cli.command else {
            panic!("expected login");
        };
        assert_eq!(token, "abc");
        assert_eq!(api_base.as_deref(), Some("http://example.test/v1"));
    }

    #[test]
    fn png_needs_an_output_path() {
        assert!(ensure_output(None, "png").is_err());
        assert_eq!(
            ensure_output(Some(Path::new("a.png")), "png").unwrap(),
            Path::new("a.png")
        );
    }

    #[test]
    fn runtime_drives_timers_and_sockets() {
        let runtime = current_thread_runtime().unwrap();
        let port = runtime.block_on(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        });
        assert!(port > 0);
    }

    #[test]
    fn read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{\"activities\":[]}").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "{\"activities\":[]}");
        assert!(read_input(Some(&dir.path().join("missing.json"))).is_err());
    }
}

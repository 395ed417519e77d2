use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use coremon::app::App;
use coremon::config::{self, Config, load_config, load_config_from_path};
use coremon::event::{Event, EventHandler};
use coremon::logging;
use coremon::render::{self, OutputFormat, dashboard};
use coremon::system::collector::Collector;
use coremon::system::platform;
use coremon::system::source::CounterSources;
use coremon::system::store::{MemoryStore, SampleStore, SharedRegionStore};

const MIN_REFRESH_MS: u64 = 100;

#[derive(Parser)]
#[command(
    name = "coremon",
    about = "Per-core CPU, memory and GPU utilization sampler"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for non-interactive runs
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write each report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keep sampling at the refresh rate
    #[arg(long, default_value_t = false)]
    continuous: bool,

    /// Interactive terminal dashboard
    #[arg(long, default_value_t = false)]
    dashboard: bool,

    /// Refresh rate in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Keep the previous sample in memory only; the first report waits one interval
    #[arg(long, default_value_t = false)]
    no_store: bool,

    /// Skip GPU queries
    #[arg(long, default_value_t = false)]
    no_gpu: bool,

    /// Remove this user's sample region and exit
    #[arg(long, default_value_t = false)]
    clear: bool,

    /// Log filter, e.g. `debug` or `coremon=trace`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    logging::init_tracing(&config.logging, cli.dashboard)?;

    if cli.clear {
        return clear_region(&config);
    }

    let in_memory = !config.store.enabled;
    let collector = build_collector(&config)?;

    if cli.dashboard {
        return run_dashboard(collector, config.general.refresh_rate_ms).await;
    }

    let format = cli
        .format
        .unwrap_or_else(|| OutputFormat::from_str_config(&config.general.format));
    run_report(collector, &config, format, in_memory, cli.output.as_deref())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    config.general.refresh_rate_ms = config.general.refresh_rate_ms.max(MIN_REFRESH_MS);
    if cli.continuous {
        config.general.continuous = true;
    }
    if cli.no_store {
        config.store.enabled = false;
    }
    if cli.no_gpu {
        config.sources.gpu_enabled = false;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config
}

fn region_dir(config: &config::StoreConfig) -> PathBuf {
    config
        .region_dir
        .clone()
        .unwrap_or_else(platform::shared_region_dir)
}

fn build_collector(config: &Config) -> Result<Collector<Box<dyn SampleStore>>> {
    let sources = CounterSources::from_config(&config.sources);
    let store: Box<dyn SampleStore> = if config.store.enabled {
        Box::new(SharedRegionStore::open_for_user(
            platform::user_id(),
            &region_dir(&config.store),
            &config.store.region_prefix,
        )?)
    } else {
        Box::new(MemoryStore::default())
    };
    Ok(Collector::new(sources, store))
}

fn clear_region(config: &Config) -> Result<()> {
    let dir = region_dir(&config.store);
    let uid = platform::user_id();
    let path = SharedRegionStore::region_path(&dir, &config.store.region_prefix, uid);
    if SharedRegionStore::clear(uid, &dir, &config.store.region_prefix)? {
        println!("removed {}", path.display());
    } else {
        println!("no sample region at {}", path.display());
    }
    Ok(())
}

fn run_report(
    mut collector: Collector<Box<dyn SampleStore>>,
    config: &Config,
    format: OutputFormat,
    in_memory: bool,
    output: Option<&Path>,
) -> Result<()> {
    let interval = Duration::from_millis(config.general.refresh_rate_ms);
    let renderer = render::renderer(format, &config.svg);

    // Without a persisted sample, open a real window before the first report.
    if in_memory {
        collector.prime()?;
        std::thread::sleep(interval);
    }

    loop {
        let snapshot = collector.sample()?;
        let rendered = renderer.render(&snapshot)?;
        emit(&rendered, output)?;

        if !config.general.continuous {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

/// File output is replaced whole so readers never see a partial report.
fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let tmp = temp_path(path);
            fs::write(&tmp, rendered)?;
            fs::rename(&tmp, path)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Sibling of `path` with `.tmp` appended to the whole file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn run_dashboard(
    collector: Collector<Box<dyn SampleStore>>,
    refresh_rate_ms: u64,
) -> Result<()> {
    // First cycle runs before the terminal is taken over so errors print cleanly.
    let app = App::new(collector, refresh_rate_ms)?;

    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run(&mut terminal, app).await;

    ratatui::restore();

    result
}

async fn run(terminal: &mut ratatui::DefaultTerminal, mut app: App) -> Result<()> {
    let tick_rate = Duration::from_millis(app.refresh_rate_ms);
    let mut events = EventHandler::new(tick_rate);

    terminal.draw(|frame| dashboard::draw(frame, &app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        let mut should_draw = false;
        match event {
            Event::Key(key) => {
                if key.kind == crossterm::event::KeyEventKind::Press {
                    let action = app.map_key(key);
                    app.dispatch(action)?;
                    should_draw = true;
                }
            }
            Event::Tick => {
                app.refresh_data()?;
                should_draw = true;
            }
            Event::Resize => {
                should_draw = true;
            }
        }
        if should_draw && app.running {
            terminal.draw(|frame| dashboard::draw(frame, &app))?;
        }
    }

    Ok(())
}

use anyhow::Context;
use diamond_browser::annotate::annotator::AttributeAnnotator;
use diamond_browser::annotate::decorator::{REGIONS_ATTR, RegionDecorator};
use diamond_browser::annotate::thumbnail::{COLS_ATTR, ROWS_ATTR};
use diamond_browser::config::BrowserConfig;
use diamond_browser::controller::controller::SessionController;
use diamond_browser::display::context::PresentationContext;
use diamond_browser::display::sink::ChannelSink;
use diamond_browser::display::types::DisplayEvent;
use diamond_browser::session::scripted::{Script, ScriptValue, ScriptedFactory};
use diamond_browser::session::types::{Filter, FilterCode, Scope, Searchlet};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = BrowserConfig::from_env()?;
    let mut script_path: Option<String> = None;
    let mut auto_advance = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--script" => {
                script_path = Some(value_of(&args, i)?.to_string());
                i += 2;
            }
            "--rows" => {
                config.rows = value_of(&args, i)?.parse()?;
                i += 2;
            }
            "--cols" => {
                config.cols = value_of(&args, i)?.parse()?;
                i += 2;
            }
            "--auto-advance" => {
                auto_advance = true;
                i += 1;
            }
            _ => {
                eprintln!(
                    "Usage: {} [--script <file.json>] [--rows <n>] [--cols <n>] [--auto-advance]",
                    args[0]
                );
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    // 1. Backend:
    let script = match script_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read script {}", path))?;
            Script::from_json(&json).with_context(|| format!("invalid script {}", path))?
        }
        None => demo_script(),
    };
    tracing::info!(
        "Loaded script: {} objects on {} servers",
        script.objects.len(),
        script.servers.len()
    );
    let factory = Arc::new(ScriptedFactory::new(script));

    // 2. Presentation context:
    let (sink, mut events) = ChannelSink::channel();
    let context = PresentationContext::spawn(sink);

    // 3. Controller:
    let controller = SessionController::new(&config, factory, context.presenter())?
        .with_annotator(Arc::new(AttributeAnnotator::new(vec![
            COLS_ATTR.to_string(),
            ROWS_ATTR.to_string(),
        ])))
        .with_decorator(Arc::new(RegionDecorator::new(REGIONS_ATTR)));

    let id = controller.start(Scope::new("default", "demo-cookie"), rgb_searchlet())?;
    tracing::info!(
        "Session {} started, {}x{} grid, auto-advance {}",
        id,
        config.rows,
        config.cols,
        auto_advance
    );

    // 4. Render loop:
    let mut page = 1;
    while let Some(event) = events.recv().await {
        match event {
            DisplayEvent::SlotFilled { index, view } => {
                tracing::info!(
                    "  [{}] {} {} ({} regions)",
                    index,
                    view.object_id(),
                    view.label(),
                    view.decorations.len()
                );
            }
            DisplayEvent::Status(line) => {
                tracing::info!("Status: {}", line);
            }
            DisplayEvent::StateChanged(state) => {
                tracing::info!("Session state: {:?}", state);
            }
            DisplayEvent::SessionVariablesChanged(vars) => {
                tracing::debug!("Session variables: {:?}", vars);
            }
            DisplayEvent::NextEnabled(true) => {
                tracing::info!("Page {} full", page);
                let grid = controller.grid();
                for (row, slots) in grid.grid_rows().enumerate() {
                    let ids: Vec<String> = slots.iter().flatten().map(ToString::to_string).collect();
                    tracing::debug!("  row {}: {}", row, ids.join(" "));
                }
                let outcome = if auto_advance {
                    page += 1;
                    controller.advance()
                } else {
                    controller.stop()
                };
                if let Err(e) = outcome {
                    tracing::warn!("Ignoring page action: {}", e);
                }
            }
            DisplayEvent::StartEnabled(true) => break,
            _ => {}
        }
    }

    controller.join().await;

    let grid = controller.grid();
    tracing::info!(
        "Finished on page {}: {} of {} slots occupied",
        page,
        grid.occupied().len(),
        controller.capacity()
    );

    context.shutdown().await;

    Ok(())
}

fn value_of(args: &[String], i: usize) -> anyhow::Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing value for {}", args[i]))
}

/// The image-to-RGB conversion filter every image search starts from.
fn rgb_searchlet() -> Searchlet {
    let mut searchlet = Searchlet::new();
    searchlet.add_filter(
        Filter::new(
            "rgb",
            FilterCode::default(),
            "f_eval_img2rgb",
            "f_init_img2rgb",
            "f_fini_img2rgb",
            1,
        )
        .with_merit(400),
    );
    searchlet.set_application_dependencies(vec!["rgb".to_string()]);
    searchlet
}

fn demo_script() -> Script {
    let mut script = Script {
        servers: vec!["server-a".to_string(), "server-b".to_string()],
        delay_ms: 100,
        ..Script::numbered(20)
    };
    for (i, object) in script.objects.iter_mut().enumerate().step_by(3) {
        let region = format!("{},{},64,48,match", i * 10, i * 5);
        object
            .attributes
            .insert(REGIONS_ATTR.to_string(), ScriptValue::Text(region));
    }
    script
}

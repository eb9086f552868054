use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use rosterviz::roster::{self, DEFAULT_SELECTED_TEAMS};
use rosterviz::{
    InteractionMode, RosterGraph, Viewport, build_entities, parse_team_list, render_svg,
};

#[derive(Debug, Parser)]
#[command(
    name = "rosterviz",
    about = "Render sports rosters as force-directed team clusters in SVG."
)]
struct RenderArgs {
    /// Path to a local roster JSON document. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Fetch the roster document from this URL instead of a local file.
    #[arg(long, conflicts_with = "input")]
    url: Option<String>,

    /// League segment of the default data URL.
    #[arg(long, default_value = roster::DEFAULT_LEAGUE)]
    league: String,

    /// Season segment of the default data URL.
    #[arg(long, default_value = roster::DEFAULT_SEASON)]
    season: String,

    /// Comma-separated team abbreviations to display.
    #[arg(short = 't', long = "teams")]
    teams: Option<String>,

    /// Path to the output SVG. Use '-' to write to stdout.
    #[arg(short = 'o', long = "output", default_value = "roster.svg")]
    output: String,

    /// Simulation viewport width.
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Simulation viewport height.
    #[arg(long, default_value_t = 500.0)]
    height: f32,

    /// Simulation steps to run before taking the snapshot.
    #[arg(long, default_value_t = 300)]
    steps: usize,

    /// Background color for the rendered graph.
    #[arg(short = 'b', long = "background-color", default_value = "white")]
    background_color: String,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = dispatch().await {
        eprintln!("\u{001b}[31merror:\u{001b}[0m {err:?}");
        std::process::exit(1);
    }
}

async fn dispatch() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("serve") => run_serve_command(&args).await,
        Some("render") => {
            let render_args = RenderArgs::parse_from(
                std::iter::once(args[0].clone()).chain(args.iter().skip(2).cloned()),
            );
            run_render(render_args).await
        }
        _ => {
            let render_args = RenderArgs::parse_from(args);
            run_render(render_args).await
        }
    }
}

#[cfg(feature = "server")]
async fn run_serve_command(args: &[String]) -> Result<()> {
    let serve_args = rosterviz::serve::ServeArgs::parse_from(
        std::iter::once(args[0].clone()).chain(args.iter().skip(2).cloned()),
    );
    let ui_root = serve_args.ui_dir.clone();
    rosterviz::serve::run_serve(serve_args, ui_root).await
}

#[cfg(not(feature = "server"))]
async fn run_serve_command(_args: &[String]) -> Result<()> {
    anyhow::bail!("this build was compiled without the 'server' feature")
}

async fn run_render(cli: RenderArgs) -> Result<()> {
    let document = match (&cli.input, &cli.url) {
        (Some(input), _) if input == "-" => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read roster document from stdin")?;
            roster::parse_roster(&buffer)?
        }
        (Some(input), _) => roster::read_roster(Path::new(input))?,
        (None, Some(url)) => roster::fetch_roster(url).await?,
        (None, None) => roster::fetch_roster(&roster::data_url(&cli.league, &cli.season)).await?,
    };

    let selected: Vec<String> = match &cli.teams {
        Some(teams) => parse_team_list(teams),
        None => DEFAULT_SELECTED_TEAMS
            .iter()
            .map(|abbr| abbr.to_string())
            .collect(),
    };

    let built = build_entities(&document, &selected);
    if built.skipped > 0 && !cli.quiet {
        eprintln!("warning: skipped {} athletes without ids", built.skipped);
    }

    let mut graph = RosterGraph::new(
        built.entities,
        built.groups,
        built.palette,
        Viewport::new(cli.width, cli.height),
        InteractionMode::Drag,
    );
    graph.run(cli.steps);

    let svg = render_svg(&graph, &cli.background_color)?;

    if cli.output == "-" {
        io::stdout()
            .write_all(svg.as_bytes())
            .context("failed to write SVG to stdout")?;
        return Ok(());
    }

    fs::write(&cli.output, svg.as_bytes())
        .with_context(|| format!("failed to write '{}'", cli.output))?;

    if !cli.quiet {
        println!(
            "Rendered {} players across {} teams to {}",
            graph.entities().len(),
            graph.groups().len(),
            cli.output
        );
    }

    Ok(())
}

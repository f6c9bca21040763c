use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::info;
use shadergraph_ext::{
    dsl,
    export::{self, ExportHint, ExportOutcome, PreambleSource, SaveRequest},
    graph::{ShaderGraph, ShaderStageCapability, SpaceRequirement},
};

#[derive(Debug, Default, Clone)]
struct Cli {
    graph: Option<PathBuf>,
    stage: Option<ShaderStageCapability>,
    export: Option<PathBuf>,
    print: bool,
    name: Option<String>,
    dialog: bool,
}

const USAGE: &str = "supported: --graph <graph.json>, --stage vertex|fragment|all, \
--export <file.shader>, --print, --name <shader name>, --dialog";

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--graph" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --graph"));
                };
                cli.graph = Some(PathBuf::from(v));
                i += 2;
            }
            "--stage" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --stage"));
                };
                let stage = ShaderStageCapability::parse(v)
                    .ok_or_else(|| anyhow!("unknown stage: {v} (expected vertex, fragment or all)"))?;
                cli.stage = Some(stage);
                i += 2;
            }
            "--export" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --export"));
                };
                cli.export = Some(PathBuf::from(v));
                i += 2;
            }
            "--name" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --name"));
                };
                cli.name = Some(v.clone());
                i += 2;
            }
            "--print" => {
                cli.print = true;
                i += 1;
            }
            "--dialog" => {
                cli.dialog = true;
                i += 1;
            }
            other => {
                return Err(anyhow!("unknown argument: {other} ({USAGE})"));
            }
        }
    }
    if cli.export.is_some() && cli.dialog {
        return Err(anyhow!("--export and --dialog are mutually exclusive"));
    }
    Ok(cli)
}

fn print_requirements(graph: &ShaderGraph, stage: ShaderStageCapability) {
    let reqs = graph.requirements(stage);
    println!("{} ({stage:?})", graph.name());
    for kind in SpaceRequirement::ALL {
        println!("  {kind:?}: {}", reqs.space(kind));
    }
    println!("  VertexId: {}", reqs.vertex_id);
    println!("  VertexColor: {}", reqs.vertex_color);
}

fn report_export(outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Written(path) => println!("exported: {}", path.display()),
        ExportOutcome::Cancelled => println!("export cancelled"),
    }
}

fn run_export(source: &PreambleSource, graph_path: &Path, target: PathBuf) -> Result<()> {
    let hint = ExportHint {
        recommended_path: Some(target.clone()),
        active_scene: None,
    };
    let mut prompt = move |_: &SaveRequest| -> Option<PathBuf> { Some(target.clone()) };
    report_export(export::export_shader(source, graph_path, &mut prompt, &hint)?);
    Ok(())
}

#[cfg(feature = "native-dialog")]
fn run_dialog_export(source: &PreambleSource, graph_path: &Path) -> Result<()> {
    let mut prompt = export::RfdSavePrompt;
    report_export(export::export_shader(
        source,
        graph_path,
        &mut prompt,
        &ExportHint::default(),
    )?);
    Ok(())
}

#[cfg(not(feature = "native-dialog"))]
fn run_dialog_export(_source: &PreambleSource, _graph_path: &Path) -> Result<()> {
    Err(anyhow!("--dialog requires the native-dialog feature"))
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&args)?;
    let graph_path = cli
        .graph
        .clone()
        .ok_or_else(|| anyhow!("--graph <graph.json> is required ({USAGE})"))?;

    let graph = dsl::load_graph_from_path(&graph_path)?;
    info!("loaded graph '{}' with {} nodes", graph.name(), graph.len());

    let stages: Vec<ShaderStageCapability> = match cli.stage {
        Some(stage) => vec![stage],
        None => ShaderStageCapability::CONCRETE.to_vec(),
    };
    for stage in stages {
        print_requirements(&graph, stage);
    }

    let source = PreambleSource {
        shader_name: cli.name.clone(),
    };
    if cli.print {
        println!("{}", export::log_shader(&source, &graph_path)?);
    }
    if let Some(target) = cli.export {
        run_export(&source, &graph_path, target)?;
    } else if cli.dialog {
        run_dialog_export(&source, &graph_path)?;
    }
    Ok(())
}

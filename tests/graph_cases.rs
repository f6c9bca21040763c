use std::path::{Path, PathBuf};

use serde::Deserialize;
use shadergraph_ext::dsl;
use shadergraph_ext::graph::{
    CoordinateSpace, GraphRequirements, NeededCoordinateSpace, ShaderStageCapability,
};
use shadergraph_ext::preamble::build_shader_preamble;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExpectedStage {
    normal: Vec<String>,
    position: Vec<String>,
    tangent: Vec<String>,
    bitangent: Vec<String>,
    view_direction: Vec<String>,
    vertex_id: bool,
    vertex_color: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Expected {
    vertex: ExpectedStage,
    fragment: ExpectedStage,
    #[serde(default)]
    defines: Vec<String>,
    #[serde(default)]
    absent_defines: Vec<String>,
}

fn cases_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("cases")
}

fn mask(names: &[String]) -> NeededCoordinateSpace {
    names.iter().fold(NeededCoordinateSpace::empty(), |acc, name| {
        let space = CoordinateSpace::parse(name)
            .unwrap_or_else(|| panic!("unknown space {name} in expected.json"));
        acc | space.to_needed()
    })
}

fn check_stage(case: &str, stage: ShaderStageCapability, actual: &GraphRequirements, expected: &ExpectedStage) {
    let want = GraphRequirements {
        normal: mask(&expected.normal),
        position: mask(&expected.position),
        tangent: mask(&expected.tangent),
        bitangent: mask(&expected.bitangent),
        view_direction: mask(&expected.view_direction),
        vertex_id: expected.vertex_id,
        vertex_color: expected.vertex_color,
    };
    assert_eq!(actual, &want, "{case}: requirements mismatch for {stage:?}");
}

fn run_case(dir: &Path) {
    let case = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<case>")
        .to_string();
    let graph = dsl::load_graph_from_path(dir.join("graph.json"))
        .unwrap_or_else(|e| panic!("{case}: failed to load graph: {e:#}"));
    let expected_text = std::fs::read_to_string(dir.join("expected.json"))
        .unwrap_or_else(|e| panic!("{case}: missing expected.json: {e}"));
    let expected: Expected = serde_json::from_str(&expected_text)
        .unwrap_or_else(|e| panic!("{case}: invalid expected.json: {e}"));

    let vertex = graph.requirements(ShaderStageCapability::Vertex);
    let fragment = graph.requirements(ShaderStageCapability::Fragment);
    check_stage(&case, ShaderStageCapability::Vertex, &vertex, &expected.vertex);
    check_stage(&case, ShaderStageCapability::Fragment, &fragment, &expected.fragment);

    // Querying All sees every slot, so it is exactly the union of the two stages.
    assert_eq!(
        graph.requirements(ShaderStageCapability::All),
        vertex.union(fragment),
        "{case}: All must equal Vertex | Fragment"
    );

    let text = build_shader_preamble(&graph, graph.name())
        .unwrap_or_else(|e| panic!("{case}: preamble failed: {e:#}"));
    for define in &expected.defines {
        assert!(
            text.contains(&format!("#define {define}\n")),
            "{case}: missing #define {define}\n{text}"
        );
    }
    for define in &expected.absent_defines {
        assert!(
            !text.contains(&format!("#define {define}\n")),
            "{case}: unexpected #define {define}\n{text}"
        );
    }
}

#[test]
fn graph_cases_match_expected_requirements() {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(cases_root())
        .expect("read tests/cases")
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.join("graph.json").is_file())
        .collect();
    dirs.sort();
    assert!(!dirs.is_empty(), "no graph cases found");
    for dir in dirs {
        run_case(&dir);
    }
}

#[test]
fn loaded_documents_round_trip() {
    let path = cases_root().join("anisotropic-world").join("graph.json");
    let graph = dsl::load_graph_from_path(&path).unwrap();
    let doc = dsl::document_from_graph(&graph);
    let reloaded = dsl::graph_from_document(&doc).unwrap();
    for stage in ShaderStageCapability::CONCRETE {
        assert_eq!(graph.requirements(stage), reloaded.requirements(stage));
    }
    assert_eq!(dsl::document_from_graph(&reloaded), doc);
}

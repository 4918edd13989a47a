//! Direct coverage of the standard-library symbols: math and string
//! functions, constants, transforms, materials, and path primitives.

use carve::{evaluate, parse, CollectLog, FileSystemDelegate, GeometryKind, Scene};
use carve_geom::{Color, MaterialProperty, Vector};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Scene {
    let program = parse(source).expect("parse failed");
    evaluate(&program, &FileSystemDelegate, None, &|| false).expect("evaluation failed")
}

fn lines(source: &str) -> Vec<String> {
    let log = CollectLog::new();
    let program = parse(source).expect("parse failed");
    evaluate(&program, &log, None, &|| false).expect("evaluation failed");
    log.lines()
}

#[test]
fn unary_math_functions() {
    assert_eq!(
        lines("print abs(-3)\nprint sign(-2)\nprint sign(0)\nprint floor(1.7)\nprint ceil(1.2)\nprint round(2.5)"),
        vec!["3", "-1", "0", "1", "2", "3"]
    );
    assert_eq!(lines("print sqrt(9)"), vec!["3"]);
}

#[test]
fn binary_and_variadic_math() {
    assert_eq!(lines("print pow(2 10)"), vec!["1024"]);
    assert_eq!(lines("print atan2(0 1)"), vec!["0"]);
    assert_eq!(lines("print min(3 1 2)\nprint max(3 1 2)"), vec!["1", "3"]);
}

#[test]
fn trigonometry_round_trip() {
    assert_eq!(lines("print cos(0)\nprint sin(0)\nprint tan(0)"), vec!["1", "0", "0"]);
    assert_eq!(lines("print acos(1)\nprint asin(0)\nprint atan(0)"), vec!["0", "0", "0"]);
}

#[test]
fn pi_and_boolean_constants() {
    assert_eq!(lines("print pi > 3.14 and pi < 3.15"), vec!["true"]);
    assert_eq!(lines("print true\nprint false\nprint not(false)"), vec!["true", "false", "true"]);
}

#[test]
fn linear_algebra_functions() {
    assert_eq!(lines("print dot((1 0 0) (0 1 0))"), vec!["0"]);
    assert_eq!(lines("print cross((1 0 0) (0 1 0))"), vec!["0 0 1"]);
    assert_eq!(lines("print length((3 4 0))"), vec!["5"]);
    assert_eq!(lines("print normalize((0 9 0))"), vec!["0 1 0"]);
}

#[test]
fn string_functions() {
    assert_eq!(lines("print trim(\"  abc  \")"), vec!["abc"]);
    assert_eq!(lines("print split(\"a,b,c\" \",\")"), vec!["a b c"]);
    assert_eq!(lines("print join((\"a\" \"b\" \"c\") \"-\")"), vec!["a-b-c"]);
    assert_eq!(lines("print join((1 2) \"+\")"), vec!["1+2"]);
}

#[test]
fn color_constants_set_the_material() {
    let scene = run("color red\ncube");
    let Some(MaterialProperty::Color(color)) = &scene.children[0].material.diffuse else {
        panic!("expected a diffuse color");
    };
    assert_eq!(*color, Color::RED);
    // The British spelling is an alias for the same slot.
    let scene = run("colour blue\ncube");
    assert_eq!(
        scene.children[0].material.diffuse,
        Some(MaterialProperty::Color(Color::BLUE))
    );
}

#[test]
fn translate_rotate_scale_compose_cumulatively() {
    let scene = run("translate 1 0 0\nscale 2\ncube");
    let cube = &scene.children[0];
    assert_eq!(cube.transform.offset, Vector::new(1.0, 0.0, 0.0));
    assert_eq!(cube.transform.scale, Vector::new(2.0, 2.0, 2.0));
}

#[test]
fn position_orientation_size_are_absolute() {
    let scene = run("cube {\nposition 1 2 3\nsize 2 3 4\n}");
    let cube = &scene.children[0];
    assert_eq!(cube.transform.offset, Vector::new(1.0, 2.0, 3.0));
    assert_eq!(cube.transform.scale, Vector::new(2.0, 3.0, 4.0));
}

#[test]
fn rotate_by_half_turn() {
    let scene = run("rotate 1\ncube");
    let rotation = scene.children[0].transform.rotation;
    assert!((rotation.roll().abs() - 1.0).abs() < 1e-9);
}

#[test]
fn material_object_applies_recognised_fields() {
    let scene = run("material object {\ndefine color red\ndefine opacity 0.5\n}\ncube");
    let material = &scene.children[0].material;
    assert_eq!(material.diffuse, Some(MaterialProperty::Color(Color::RED)));
    assert!((material.opacity - 0.5).abs() < 1e-9);
}

#[test]
fn path_block_builds_from_points() {
    let scene = run("path {\npoint 0 0\npoint 1 0\ncurve 1 1\n}");
    let GeometryKind::Path { path } = &scene.children[0].kind else {
        panic!("expected a path node");
    };
    assert_eq!(path.points.len(), 3);
    assert!(!path.points[0].is_curved);
    assert!(path.points[2].is_curved);
}

#[test]
fn square_and_circle_shapes() {
    let scene = run("square");
    let GeometryKind::Path { path } = &scene.children[0].kind else {
        panic!("expected a path node");
    };
    assert!(path.is_closed());
    assert_eq!(path.points.len(), 5);

    let scene = run("detail 8\ncircle");
    let GeometryKind::Path { path } = &scene.children[0].kind else {
        panic!("expected a path node");
    };
    assert_eq!(path.points.len(), 9);
}

#[test]
fn polygon_sides_option() {
    let scene = run("polygon {\nsides 6\n}");
    let GeometryKind::Path { path } = &scene.children[0].kind else {
        panic!("expected a path node");
    };
    // Six corners plus the closing point.
    assert_eq!(path.points.len(), 7);
}

#[test]
fn roundrect_radius_option() {
    let scene = run("roundrect {\nradius 0\n}");
    let GeometryKind::Path { path } = &scene.children[0].kind else {
        panic!("expected a path node");
    };
    assert!(path.points.iter().all(|p| !p.is_curved));
}

#[test]
fn svgpath_function_parses_path_data() {
    let scene = run("svgpath \"M 0 0 L 1 0 L 1 1 Z\"");
    let GeometryKind::Path { path } = &scene.children[0].kind else {
        panic!("expected a path node");
    };
    assert!(path.is_closed());
}

#[test]
fn lathe_and_loft_and_fill_consume_paths() {
    for (source, expect_kind) in [
        ("lathe { square }", "lathe"),
        ("loft { circle\nsquare }", "loft"),
        ("fill { square }", "fill"),
    ] {
        let scene = run(source);
        let matches = match &scene.children[0].kind {
            GeometryKind::Lathe { shapes, .. } => (expect_kind == "lathe", shapes.len()),
            GeometryKind::Loft { shapes } => (expect_kind == "loft", shapes.len()),
            GeometryKind::Fill { shapes } => (expect_kind == "fill", shapes.len()),
            other => panic!("unexpected kind {other:?} for {source}"),
        };
        assert!(matches.0, "wrong kind for {source}");
        assert!(matches.1 >= 1, "no shapes for {source}");
    }
}

#[test]
fn hull_collects_points_from_children() {
    let scene = run("hull {\npoint 0 0 0\npoint 1 0 0\npoint 0 1 0\n}");
    let GeometryKind::Hull { points } = &scene.children[0].kind else {
        panic!("expected a hull node");
    };
    assert_eq!(points.len(), 3);
}

#[test]
fn mesh_block_collects_polygons() {
    let scene = run("mesh {\npolygon {\npoint 0 0\npoint 1 0\npoint 0 1\n}\n}");
    let GeometryKind::Mesh { mesh } = &scene.children[0].kind else {
        panic!("expected a mesh node");
    };
    assert_eq!(mesh.polygons.len(), 1);
    assert_eq!(mesh.polygons[0].vertices.len(), 3);
}

#[test]
fn debug_marks_children() {
    let scene = run("debug cube");
    assert!(scene.children[0].debug);
}

#[test]
fn seed_property_reads_back() {
    assert_eq!(lines("seed 5\nprint seed"), vec!["5"]);
}

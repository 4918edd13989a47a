//! End-to-end evaluation behavior: scenes, values, scoping, control flow.

use carve::{evaluate, parse, CollectLog, FileSystemDelegate, GeometryKind, RuntimeErrorKind, Scene, Value};
use carve_geom::Vector;
use pretty_assertions::assert_eq;

fn run(source: &str) -> Scene {
    let program = parse(source).expect("parse failed");
    evaluate(&program, &FileSystemDelegate, None, &|| false).expect("evaluation failed")
}

fn run_logging(source: &str) -> CollectLog {
    let log = CollectLog::new();
    let program = parse(source).expect("parse failed");
    evaluate(&program, &log, None, &|| false).expect("evaluation failed");
    log
}

fn run_err(source: &str) -> carve::RuntimeError {
    let program = parse(source).expect("parse failed");
    evaluate(&program, &FileSystemDelegate, None, &|| false).expect_err("expected a runtime error")
}

#[test]
fn cube_with_size_two() {
    let scene = run("cube { size 2 }");
    assert_eq!(scene.children.len(), 1);
    let cube = &scene.children[0];
    assert!(matches!(cube.kind, GeometryKind::Cube));
    assert_eq!(cube.transform.scale, Vector::new(2.0, 2.0, 2.0));
    assert_eq!(cube.material, carve_geom::Material::default());
    let bounds = cube.bounds();
    assert_eq!(bounds.min, Vector::new(-1.0, -1.0, -1.0));
    assert_eq!(bounds.max, Vector::new(1.0, 1.0, 1.0));
}

#[test]
fn arithmetic_precedence() {
    let log = run_logging("print 1 + 2 * 3");
    assert_eq!(log.entries(), vec![vec![Value::Number(7.0)]]);
    let log = run_logging("print (1 + 2) * 3");
    assert_eq!(log.entries(), vec![vec![Value::Number(9.0)]]);
}

#[test]
fn for_loop_over_stepped_range() {
    let log = run_logging("for i in 1 to 3 step 0.5 {\nprint i\n}");
    let printed: Vec<f64> = log
        .entries()
        .iter()
        .map(|values| match values[..] {
            [Value::Number(n)] => n,
            _ => panic!("expected a single number"),
        })
        .collect();
    assert_eq!(printed, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
}

#[test]
fn for_loop_over_tuple_and_object() {
    let log = run_logging("define list (\"a\" \"b\")\nfor x in list {\nprint x\n}");
    assert_eq!(log.lines(), vec!["a", "b"]);
}

#[test]
fn recursion_limit_reports_assertion_failure() {
    let error = run_err("define f(n) { f(n + 1) }\nf(0)");
    let RuntimeErrorKind::AssertionFailure { message } = &error.kind else {
        panic!("expected an assertion failure, got {error:?}");
    };
    assert_eq!(message, "Too much recursion");
}

#[test]
fn recursive_block_also_hits_the_limit() {
    let error = run_err("define b { b { } }\nb { }");
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::AssertionFailure { .. }
    ));
}

#[test]
fn unknown_symbol_suggests_cube() {
    let error = run_err("cuube { }");
    let RuntimeErrorKind::UnknownSymbol { name, .. } = &error.kind else {
        panic!("expected unknown symbol, got {error:?}");
    };
    assert_eq!(name, "cuube");
    assert_eq!(error.suggestion().as_deref(), Some("cube"));
}

#[test]
fn cancellation_yields_empty_scene_without_error() {
    let program = parse("cube\nsphere\ncylinder").expect("parse failed");
    let scene = evaluate(&program, &FileSystemDelegate, None, &|| true).expect("cancellation is not an error");
    assert!(scene.children.is_empty());
}

#[test]
fn evaluation_is_deterministic() {
    let source = "seed 3\nfor i in 1 to 4 {\nprint rnd\n}";
    assert_eq!(run_logging(source).lines(), run_logging(source).lines());
}

#[test]
fn seeded_rnd_sequence_is_reproducible_and_reseedable() {
    let log = run_logging("seed 7\nprint rnd\nprint rnd\nseed 7\nprint rnd");
    let lines = log.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], lines[2], "reseeding must restart the stream");
    assert_ne!(lines[0], lines[1]);
}

#[test]
fn user_function_returns_single_child() {
    let log = run_logging("define double(x) { x * 2 }\nprint double(21)");
    assert_eq!(log.entries(), vec![vec![Value::Number(42.0)]]);
}

#[test]
fn user_function_sees_declaration_scope_not_caller_scope() {
    let log = run_logging(
        "define k 10\ndefine f(x) { x + k }\ndefine run {\ndefine k 99\nprint f(1)\n}\nrun { }",
    );
    assert_eq!(log.entries(), vec![vec![Value::Number(11.0)]]);
}

#[test]
fn group_applies_cumulative_child_transform() {
    let scene = run("group {\ntranslate 1 0 0\ncube\ntranslate 1 0 0\ncube\n}");
    let group = &scene.children[0];
    assert_eq!(group.children.len(), 2);
    assert_eq!(group.children[0].transform.offset, Vector::new(1.0, 0.0, 0.0));
    assert_eq!(group.children[1].transform.offset, Vector::new(2.0, 0.0, 0.0));
}

#[test]
fn named_group_is_gathered() {
    let scene = run("group {\nname \"wheel\"\ncube\n}");
    assert!(scene.named_objects.contains_key("wheel"));
}

#[test]
fn csg_nodes_collect_mesh_children() {
    let scene = run("difference {\ncube\nsphere\n}");
    let node = &scene.children[0];
    assert!(matches!(node.kind, GeometryKind::Difference));
    assert_eq!(node.children.len(), 2);
    assert!(matches!(node.children[1].kind, GeometryKind::Sphere { .. }));
}

#[test]
fn sphere_bakes_current_detail() {
    let scene = run("detail 64\nsphere");
    assert!(matches!(
        scene.children[0].kind,
        GeometryKind::Sphere { segments: 64 }
    ));
}

#[test]
fn opacity_is_cumulative_through_nesting() {
    let scene = run("opacity 0.5\ngroup {\nopacity 0.5\ncube\n}");
    let group = &scene.children[0];
    assert!((group.material.opacity - 0.25).abs() < 1e-9);
}

#[test]
fn path_at_root_wraps_into_path_geometry() {
    let scene = run("circle");
    assert!(matches!(scene.children[0].kind, GeometryKind::Path { .. }));
}

#[test]
fn extrude_takes_path_children_and_along_option() {
    let scene = run("extrude {\ncircle\nalong square\n}");
    let GeometryKind::Extrude { shapes, along } = &scene.children[0].kind else {
        panic!("expected an extrusion");
    };
    assert_eq!(shapes.len(), 1);
    assert_eq!(along.len(), 1);
}

#[test]
fn camera_nodes_are_flattened_into_the_scene() {
    let scene = run("camera {\nposition 0 0 5\nfov 0.4\n}\ncube");
    assert_eq!(scene.cameras.len(), 1);
    assert_eq!(scene.children.len(), 2);
    let GeometryKind::Camera { camera } = &scene.cameras[0].kind else {
        panic!("expected a camera");
    };
    assert_eq!(camera.fov, Some(0.4));
}

#[test]
fn background_color_is_recorded() {
    let scene = run("background #ff0000");
    let Some(carve_geom::MaterialProperty::Color(color)) = scene.background else {
        panic!("expected a background color");
    };
    assert_eq!(color, carve_geom::Color::RED);
}

#[test]
fn if_else_takes_the_right_branch() {
    let log = run_logging("if 1 < 2 {\nprint \"yes\"\n} else {\nprint \"no\"\n}");
    assert_eq!(log.lines(), vec!["yes"]);
    let log = run_logging("if 1 > 2 {\nprint \"yes\"\n} else {\nprint \"no\"\n}");
    assert_eq!(log.lines(), vec!["no"]);
}

#[test]
fn scope_restores_user_symbols_after_loop() {
    // The loop variable and bindings made inside the body do not leak.
    let error = run_err("for i in 1 to 3 {\ndefine inner 1\n}\nprint inner");
    assert!(matches!(error.kind, RuntimeErrorKind::UnknownSymbol { .. }));
}

#[test]
fn caller_set_option_survives_scope_pop() {
    let log = run_logging(
        "define wheel {\noption spokes 4\nprint spokes\n}\nwheel { spokes 7 }\nwheel { }",
    );
    assert_eq!(log.lines(), vec!["7", "4"]);
}

#[test]
fn option_set_in_branch_is_retained_for_the_block() {
    let log = run_logging(
        "define blk {\nif true {\noption n 5\n}\nprint n\n}\nblk { }",
    );
    assert_eq!(log.lines(), vec!["5"]);
}

#[test]
fn option_outside_user_block_is_unknown_symbol() {
    let error = run_err("option size 1");
    let RuntimeErrorKind::UnknownSymbol { name, .. } = &error.kind else {
        panic!("expected unknown symbol, got {error:?}");
    };
    assert_eq!(name, "option");
}

#[test]
fn structural_equality_on_tuples() {
    let log = run_logging("print (1 2 3) = (1 2 3)\nprint (1 2) = (1 3)");
    assert_eq!(log.lines(), vec!["true", "false"]);
}

#[test]
fn float_equality_is_bit_identity() {
    // NaN equals itself by bit-identity, where IEEE `==` would say no.
    let log = run_logging("define nan 0 / 0\nprint nan = nan");
    assert_eq!(log.lines(), vec!["true"]);
    // Zero and negative zero have distinct bit patterns.
    let log = run_logging("print 0 <> -0\nprint (0 1) = (-0 1)");
    assert_eq!(log.lines(), vec!["true", "false"]);
}

#[test]
fn member_access_on_vectors_and_tuples() {
    let log = run_logging("define v (1 2 3)\nprint v.y\nprint v.count\nprint v.last");
    assert_eq!(log.lines(), vec!["2", "3", "3"]);
}

#[test]
fn unknown_member_has_suggestions() {
    let error = run_err("define v (1 2 3)\nprint v.cont");
    let RuntimeErrorKind::UnknownMember { name, .. } = &error.kind else {
        panic!("expected unknown member, got {error:?}");
    };
    assert_eq!(name, "cont");
    assert_eq!(error.suggestion().as_deref(), Some("count"));
}

#[test]
fn mesh_bounds_member() {
    let log = run_logging("define c cube { size 2 }\nprint c.bounds.size");
    assert_eq!(log.lines(), vec!["2 2 2"]);
}

#[test]
fn assert_failure_carries_its_message() {
    let error = run_err("assert(false \"boom\")");
    let RuntimeErrorKind::AssertionFailure { message } = &error.kind else {
        panic!("expected assertion failure, got {error:?}");
    };
    assert_eq!(message, "boom");
}

#[test]
fn unused_value_is_an_error() {
    // A cube body accepts no children.
    let error = run_err("cube {\nsphere\n}");
    assert!(matches!(error.kind, RuntimeErrorKind::UnusedValue { .. }));
}

#[test]
fn lexer_retouch_makes_spaced_call_after_operator() {
    let log = run_logging("define f(x) { x + 1 }\nprint 2 * f (3)");
    assert_eq!(log.entries(), vec![vec![Value::Number(8.0)]]);
}

#[test]
fn object_collects_definitions_in_order() {
    let log = run_logging(
        "define o object {\ndefine b 2\ndefine a 1\n}\nprint o.b\nprint o.count\nfor pair in o {\nprint pair.first\n}",
    );
    // Members read back; iteration is in lexicographic key order.
    assert_eq!(log.lines(), vec!["2", "2", "a", "b"]);
}

#[test]
fn text_value_carries_font_and_linespacing() {
    let scene = run("group {\ntext {\nlinespacing 1.5\n\"hello\"\n}\n}");
    let group = &scene.children[0];
    let GeometryKind::Text { text } = &group.children[0].kind else {
        panic!("expected a text node, got {:?}", group.children[0].kind);
    };
    assert_eq!(text.string, "hello");
    assert_eq!(text.linespacing, Some(1.5));
}

#[test]
fn bare_string_in_group_becomes_text() {
    let scene = run("group {\n\"label\"\n}");
    assert!(matches!(
        scene.children[0].children[0].kind,
        GeometryKind::Text { .. }
    ));
}

#[test]
fn vector_arithmetic_lifts_pointwise() {
    let log = run_logging("print (1 2 3) + (10 20 30)\nprint 2 * (1 2 3)");
    assert_eq!(log.lines(), vec!["11 22 33", "2 4 6"]);
}

#[test]
fn definitions_shadow_builtins_and_are_cleared_inside_blocks() {
    // A user define may shadow a built-in function outside a block, but a
    // block whose table provides the name clears the shadow.
    let log = run_logging("define pi 3\nprint pi");
    assert_eq!(log.lines(), vec!["3"]);
}

#[test]
fn light_kind_depends_on_placement() {
    let scene = run("light { }\nlight {\nposition 1 1 1\n}");
    let kinds: Vec<_> = scene
        .children
        .iter()
        .map(|node| match &node.kind {
            GeometryKind::Light { light } => light.kind,
            other => panic!("expected a light, got {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![carve_geom::LightKind::Ambient, carve_geom::LightKind::Point]
    );
}

#[test]
fn range_members() {
    let log = run_logging("define r 1 to 9 step 2\nprint r.start\nprint r.end\nprint r.step");
    assert_eq!(log.lines(), vec!["1", "9", "2"]);
}

#[test]
fn stepless_range_can_be_restepped_later() {
    let log = run_logging("define r 1 to 5\nfor i in r step 2 {\nprint i\n}");
    assert_eq!(log.lines(), vec!["1", "3", "5"]);
}

use approx::assert_relative_eq;
use fixture_engine::fixtures::{
    self, DovetailMountParams, DovetailPlaceholderParams, LedMountParams, RailInsertParams,
};
use fixture_engine::types::*;
use fixture_engine::Engine;
use fixture_types::{Axis, GeomKind, PlaneName, Point2D, Predicate, Query, Sense, TopoKind};
use geom_kernel::{KernelIntrospect, MockKernel};
use modeling_ops::{BooleanKind, OpError};

/// Create the 10 x 5 x 6 test block as a fixture definition.
fn block_def() -> FixtureDef {
    FixtureDef::new("block", "body").step(Step::Extrude {
        body: "body".to_string(),
        profile: ProfileSpec {
            plane: PlaneSpec::named(PlaneName::XY),
            outline: OutlineSpec::path(&[(10.0, 0.0), (10.0, 5.0), (0.0, 5.0)]),
            mirror: None,
        },
        distance: 3.0,
        symmetric: true,
    })
}

fn drilled_block_def() -> FixtureDef {
    block_def().step(Step::CutThroughAll {
        target: "body".to_string(),
        profile: ProfileSpec {
            plane: PlaneSpec::named(PlaneName::XY),
            outline: OutlineSpec::Circle {
                center: Point2D::new(5.0, 2.5),
                radius: 2.0,
            },
            mirror: None,
        },
    })
}

fn expect_step_failure(result: Result<FixtureOutput, EngineError>) -> (usize, Component, OpError) {
    match result {
        Err(EngineError::StepFailed {
            step,
            component,
            source,
            ..
        }) => (step, component, source),
        Err(other) => panic!("expected a step failure, got {other}"),
        Ok(out) => panic!("expected a step failure, got fixture {}", out.name),
    }
}

// ── Pipeline ───────────────────────────────────────────────────────────────

#[test]
fn drilled_block_builds() {
    let engine = Engine::default();
    let mut kernel = MockKernel::new();
    let out = engine.build(&mut kernel, &drilled_block_def()).unwrap();

    assert_eq!(out.name, "block");
    let extent = out.bbox.extent();
    assert_relative_eq!(extent[0], 10.0, epsilon = 1e-9);
    assert_relative_eq!(extent[1], 5.0, epsilon = 1e-9);
    assert_relative_eq!(extent[2], 6.0, epsilon = 1e-9);

    let cylinders: Vec<_> = kernel
        .compute_all_signatures(out.solid.handle(), TopoKind::Face)
        .into_iter()
        .filter(|(_, sig)| sig.kind == GeomKind::Cylindrical)
        .collect();
    assert_eq!(cylinders.len(), 1);
    assert_relative_eq!(cylinders[0].1.radius.unwrap(), 2.0, epsilon = 1e-9);
    assert_eq!(out.face_count, kernel.list_faces(out.solid.handle()).len());
}

#[test]
fn definition_loads_from_json() {
    let json = r#"{
        "name": "plate",
        "output": "plate",
        "steps": [
            {
                "type": "Extrude",
                "body": "plate",
                "profile": {
                    "plane": { "type": "Named", "name": "XY" },
                    "outline": { "type": "Rect", "width": 4.0, "height": 2.0 }
                },
                "distance": 1.0
            },
            {
                "type": "Fillet",
                "body": "plate",
                "select": {
                    "faces": { "type": "Extremal", "axis": "Z", "sense": "Max" },
                    "edges": { "type": "Parallel", "axis": "X" }
                },
                "radius": 0.25
            }
        ]
    }"#;
    let def = FixtureDef::from_json(json).unwrap();
    assert_eq!(def.steps.len(), 2);

    let mut kernel = MockKernel::new();
    let out = Engine::default().build(&mut kernel, &def).unwrap();
    assert_eq!(out.face_count, 8);
    assert!(out
        .bbox
        .approx_eq(&fixture_types::BoundingBox::new([-2.0, -1.0, 0.0], [2.0, 1.0, 1.0]), 1e-9));
}

#[test]
fn config_defaults_missing_fields() {
    let config = EngineConfig::from_json(r#"{ "threads": 2 }"#).unwrap();
    assert_eq!(config.threads, Some(2));
    assert_eq!(config.tolerance, fixture_types::Tolerance::default());
    assert!(matches!(
        EngineConfig::from_json("{ not json"),
        Err(EngineError::Parse(_))
    ));
}

// ── Failure attribution ────────────────────────────────────────────────────

#[test]
fn degenerate_profile_is_reported_by_profile_builder() {
    let def = FixtureDef::new("flat", "body").step(Step::Extrude {
        body: "body".to_string(),
        profile: ProfileSpec {
            plane: PlaneSpec::named(PlaneName::XY),
            outline: OutlineSpec::path(&[(1.0, 0.0)]),
            mirror: None,
        },
        distance: 1.0,
        symmetric: false,
    });
    let mut kernel = MockKernel::new();
    let (step, component, source) = expect_step_failure(Engine::default().build(&mut kernel, &def));
    assert_eq!(step, 0);
    assert_eq!(component, Component::ProfileBuilder);
    assert!(matches!(source, OpError::DegenerateProfile { points: 2, required: 3 }));
}

#[test]
fn oversized_fillet_is_reported_by_feature_applier() {
    let def = block_def().step(Step::Fillet {
        body: "body".to_string(),
        select: Query::edges_of(Predicate::max(Axis::Z), Predicate::min(Axis::Y)),
        radius: 7.5,
    });
    let mut kernel = MockKernel::new();
    let (step, component, source) = expect_step_failure(Engine::default().build(&mut kernel, &def));
    assert_eq!(step, 1);
    assert_eq!(component, Component::FeatureApplier);
    match source {
        OpError::InfeasibleFeature { size, .. } => assert_relative_eq!(size, 7.5),
        other => panic!("expected InfeasibleFeature, got {other:?}"),
    }
}

#[test]
fn missing_rank_is_reported_by_selector() {
    let def = block_def().step(Step::Chamfer {
        body: "body".to_string(),
        select: Query::faces(Predicate::rank(Axis::Z, Sense::Min, 3)),
        distance: 0.5,
    });
    let mut kernel = MockKernel::new();
    let (_, component, source) = expect_step_failure(Engine::default().build(&mut kernel, &def));
    assert_eq!(component, Component::Selector);
    assert!(matches!(source, OpError::SelectionOutOfRange { index: 3, count: 3 }));
}

#[test]
fn disjoint_cut_is_reported_by_boolean_compositor() {
    let def = block_def()
        .step(Step::Extrude {
            body: "far".to_string(),
            profile: ProfileSpec {
                plane: PlaneSpec::offset(PlaneName::XY, [100.0, 0.0, 0.0]),
                outline: OutlineSpec::circle(1.0),
                mirror: None,
            },
            distance: 1.0,
            symmetric: false,
        })
        .step(Step::Combine {
            target: "body".to_string(),
            tool: "far".to_string(),
            op: BooleanKind::Subtract,
        });
    let mut kernel = MockKernel::new();
    let (step, component, source) = expect_step_failure(Engine::default().build(&mut kernel, &def));
    assert_eq!(step, 2);
    assert_eq!(component, Component::BooleanCompositor);
    assert!(matches!(source, OpError::BooleanFailure { .. }));
}

#[test]
fn unknown_and_missing_bodies() {
    let mut kernel = MockKernel::new();
    let def = block_def().step(Step::Mirror {
        body: "ghost".to_string(),
        plane: PlaneName::YZ,
    });
    let err = Engine::default().build(&mut kernel, &def).unwrap_err();
    assert!(matches!(err, EngineError::UnknownBody { step: 1, ref body, .. } if body == "ghost"));

    let mut def = block_def();
    def.output = "nothing".to_string();
    let err = Engine::default().build(&mut kernel, &def).unwrap_err();
    assert!(matches!(err, EngineError::MissingOutput { .. }));
}

#[test]
fn mirror_and_translate_steps() {
    let def = block_def()
        .step(Step::Translate {
            body: "copy".to_string(),
            source: Some("body".to_string()),
            offset: [0.0, 0.0, 10.0],
        })
        .step(Step::Mirror {
            body: "body".to_string(),
            plane: PlaneName::YZ,
        });
    let mut kernel = MockKernel::new();
    let out = Engine::default().build(&mut kernel, &def).unwrap();
    assert!(out
        .bbox
        .approx_eq(&fixture_types::BoundingBox::new([-10.0, 0.0, -3.0], [10.0, 5.0, 3.0]), 1e-9));
}

// ── Built-in fixtures ──────────────────────────────────────────────────────

#[test]
fn rail_insert_builds() {
    let mut kernel = MockKernel::new();
    let def = fixtures::rail_insert(&RailInsertParams::default());
    let out = Engine::default().build(&mut kernel, &def).unwrap();

    let extent = out.bbox.extent();
    assert_relative_eq!(extent[0], 17.0, epsilon = 1e-6);
    assert_relative_eq!(extent[1], 30.0, epsilon = 1e-6);
    assert_relative_eq!(extent[2], 5.25, epsilon = 1e-6);
    assert!(out.face_count > 6);
}

#[test]
fn dovetail_mount_is_symmetric() {
    let mut kernel = MockKernel::new();
    let def = fixtures::dovetail_mount(&DovetailMountParams::default());
    let out = Engine::default().build(&mut kernel, &def).unwrap();

    assert!(out.bbox.approx_eq(&out.bbox.reflected(Axis::Y), 1e-6));
    assert_relative_eq!(out.bbox.max[1], 102.825, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.min[2], -6.0, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.max[2], 25.0, epsilon = 1e-6);
}

#[test]
fn two_piece_dovetail_keeps_one_slotted_half() {
    let mut kernel = MockKernel::new();
    let def = fixtures::dovetail_mount(&DovetailMountParams {
        two_piece: true,
        ..DovetailMountParams::default()
    });
    let out = Engine::default().build(&mut kernel, &def).unwrap();

    assert_eq!(out.name, "dovetail_mount_half");
    assert!(out.bbox.min[1] > -1e-6);
    assert_relative_eq!(out.bbox.max[1], 102.825, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.min[2], -6.0, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.max[2], 25.0, epsilon = 1e-6);

    // the slot wall is the lowest face along Y
    let slot_wall = kernel
        .compute_all_signatures(out.solid.handle(), TopoKind::Face)
        .into_iter()
        .filter(|(_, sig)| sig.kind == GeomKind::Planar)
        .map(|(_, sig)| sig.centroid[1])
        .fold(f64::INFINITY, f64::min);
    assert_relative_eq!(slot_wall, 2.5, epsilon = 1e-6);
}

#[test]
fn dovetail_placeholder_builds() {
    let mut kernel = MockKernel::new();
    let def = fixtures::dovetail_placeholder(&DovetailPlaceholderParams::default());
    let out = Engine::default().build(&mut kernel, &def).unwrap();

    assert!(out.bbox.approx_eq(&out.bbox.reflected(Axis::Y), 1e-6));
    assert_relative_eq!(out.bbox.max[0], 38.1, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.min[2], 0.0, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.max[2], 25.0, epsilon = 1e-6);
    assert!(out.bbox.max[1] <= 67.425 + 1e-6);
    let chamfers = kernel
        .compute_all_signatures(out.solid.handle(), TopoKind::Face)
        .into_iter()
        .filter(|(_, sig)| sig.kind == GeomKind::Planar)
        .filter(|(_, sig)| sig.centroid[2] > 0.0 && sig.centroid[2] < 2.0)
        .count();
    assert_eq!(chamfers, 2);
}

#[test]
fn led_mount_builds() {
    let mut kernel = MockKernel::new();
    let def = fixtures::led_mount(&LedMountParams::default());
    let out = Engine::default().build(&mut kernel, &def).unwrap();

    assert_relative_eq!(out.bbox.max[2], 49.0, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.min[2], -25.4, epsilon = 1e-6);
    assert_relative_eq!(out.bbox.min[1], -6.0, epsilon = 1e-6);
}

#[test]
fn catalog_builds_in_parallel_on_separate_kernels() {
    let engine = Engine::new(EngineConfig {
        threads: Some(2),
        ..EngineConfig::default()
    });
    let mut defs = fixtures::catalog();
    defs.push(block_def().step(Step::Fillet {
        body: "body".to_string(),
        select: Query::edges(Predicate::parallel(Axis::Z)),
        radius: 50.0,
    }));

    let results = engine.build_all(&defs, MockKernel::new).unwrap();
    assert_eq!(results.len(), defs.len());
    let printed = defs.len() - 1;
    for (result, def) in results.iter().zip(&defs[..printed]) {
        let (out, kernel) = result.as_ref().unwrap();
        assert_eq!(out.name, def.name);
        assert_eq!(out.id, def.id);
        assert_eq!(out.face_count, kernel.list_faces(out.solid.handle()).len());
    }
    assert!(matches!(
        results[printed],
        Err(EngineError::StepFailed {
            component: Component::FeatureApplier,
            ..
        })
    ));
}

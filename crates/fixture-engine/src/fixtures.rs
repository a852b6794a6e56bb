//! Built-in fixture recipes.
//!
//! Each recipe turns a parameter struct into a [`FixtureDef`]. The defaults
//! are the dimensions of the printed parts, in millimetres.

use fixture_types::{Axis, PlaneName, Predicate, Query, Sense};
use modeling_ops::{BooleanKind, MirrorAxis, MirrorMode};
use serde::{Deserialize, Serialize};

use crate::types::{FixtureDef, OutlineSpec, PlaneSpec, ProfileSpec, Step};

const BODY: &str = "body";

fn profile(plane: PlaneSpec, outline: OutlineSpec) -> ProfileSpec {
    ProfileSpec {
        plane,
        outline,
        mirror: None,
    }
}

fn fillet(select: Query, radius: f64) -> Step {
    Step::Fillet {
        body: BODY.to_string(),
        select,
        radius,
    }
}

fn subtract(tool: &str) -> Step {
    Step::Combine {
        target: BODY.to_string(),
        tool: tool.to_string(),
        op: BooleanKind::Subtract,
    }
}

/// Insert that holds a hex bolt head inside the channel of an extrusion
/// beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailInsertParams {
    /// Across-flats size of the bolt head pocket.
    pub bolt_head_diameter: f64,
    pub insert_length: f64,
    pub channel_width: f64,
    pub channel_height: f64,
    pub edge_fillet: f64,
    pub edge_chamfer: f64,
}

impl Default for RailInsertParams {
    fn default() -> Self {
        Self {
            bolt_head_diameter: 11.0,
            insert_length: 30.0,
            channel_width: 17.0,
            channel_height: 5.25,
            edge_fillet: 1.0,
            edge_chamfer: 1.0,
        }
    }
}

/// Trapezoid channel insert with a hex pocket cut through from below.
pub fn rail_insert(p: &RailInsertParams) -> FixtureDef {
    let half_base = p.channel_width / 2.0;
    // 45 degree walls
    let half_top = half_base - p.channel_height;

    let half = ProfileSpec {
        mirror: Some(MirrorMode::Solid(MirrorAxis::Y)),
        ..profile(
            PlaneSpec::named(PlaneName::XZ),
            OutlineSpec::path(&[
                (half_base, 0.0),
                (half_top, p.channel_height),
                (0.0, p.channel_height),
            ]),
        )
    };

    FixtureDef::new("rail_insert", BODY)
        .step(Step::Extrude {
            body: BODY.to_string(),
            profile: half,
            distance: p.insert_length / 2.0,
            symmetric: true,
        })
        .step(fillet(
            Query::edges_of(Predicate::min(Axis::Z), Predicate::parallel(Axis::Y)),
            p.edge_fillet,
        ))
        .step(Step::Chamfer {
            body: BODY.to_string(),
            select: Query::faces(Predicate::parallel(Axis::Z)),
            distance: p.edge_chamfer,
        })
        .step(Step::CutThroughAll {
            target: BODY.to_string(),
            profile: profile(
                PlaneSpec::OnFaces {
                    body: BODY.to_string(),
                    faces: Predicate::min(Axis::Z),
                },
                OutlineSpec::Polygon {
                    sides: 6,
                    diameter: p.bolt_head_diameter,
                    circumscribed: true,
                },
            ),
        })
}

/// Clamp that mounts an extrusion beam onto a machine ram dovetail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DovetailMountParams {
    pub dovetail_base_width: f64,
    pub dovetail_top_width: f64,
    pub dovetail_height: f64,
    pub claw_width: f64,
    /// Pitch of the extrusion beam grid.
    pub extrusion_unit: f64,
    /// Plate thickness a stock fastener reaches through.
    pub fastener_distance: f64,
    pub fastener_diameter: f64,
    /// Gap left between the two halves of a split clamp.
    pub slot_width: f64,
    /// Build one half of a split clamp instead of the one-piece part, so
    /// the claw spacing can be adjusted on the machine.
    pub two_piece: bool,
}

impl Default for DovetailMountParams {
    fn default() -> Self {
        Self {
            dovetail_base_width: 134.85,
            dovetail_top_width: 90.85,
            dovetail_height: 25.0,
            claw_width: 10.0,
            extrusion_unit: 25.4,
            fastener_distance: 6.0,
            fastener_diameter: 6.5,
            slot_width: 5.0,
            two_piece: false,
        }
    }
}

/// Dovetail clamp: a claw half with two fastener holes, rounded and either
/// mirrored into the one-piece part or slotted as one half of a split clamp.
pub fn dovetail_mount(p: &DovetailMountParams) -> FixtureDef {
    let base = p.dovetail_base_width / 2.0;
    let top = p.dovetail_top_width / 2.0;
    let reach = base + p.claw_width + p.extrusion_unit;
    let round = p.fastener_distance * 0.4;

    let claw = profile(
        PlaneSpec::named(PlaneName::YZ),
        OutlineSpec::path(&[
            (base, 0.0),
            (top, p.dovetail_height),
            (top + p.claw_width, p.dovetail_height),
            (base + p.claw_width, 0.0),
            (reach, 0.0),
            (reach, -p.fastener_distance),
            (0.0, -p.fastener_distance),
        ]),
    );

    let name = if p.two_piece {
        "dovetail_mount_half"
    } else {
        "dovetail_mount"
    };
    let mut def = FixtureDef::new(name, BODY).step(Step::Extrude {
        body: BODY.to_string(),
        profile: claw,
        distance: p.extrusion_unit / 2.0,
        symmetric: true,
    });

    let holes = [
        base + p.claw_width + p.extrusion_unit / 2.0,
        p.slot_width / 2.0 + p.extrusion_unit / 2.0,
    ];
    for (i, y) in holes.into_iter().enumerate() {
        let tool = format!("drill_{i}");
        def = def
            .step(Step::Extrude {
                body: tool.clone(),
                profile: profile(
                    PlaneSpec::offset(PlaneName::XY, [0.0, y, 0.0]),
                    OutlineSpec::circle(p.fastener_diameter / 2.0),
                ),
                distance: -p.fastener_distance,
                symmetric: false,
            })
            .step(subtract(&tool));
    }

    let def = def
        .step(fillet(
            Query::edges_of(Predicate::max(Axis::Y), Predicate::parallel(Axis::X)),
            round,
        ))
        .step(fillet(
            Query::edges_of(Predicate::max(Axis::Z), Predicate::parallel(Axis::X)),
            round,
        ));

    if !p.two_piece {
        return def.step(Step::Mirror {
            body: BODY.to_string(),
            plane: PlaneName::XZ,
        });
    }

    // half the slot width is cut from each half
    def.step(Step::Extrude {
        body: "slot".to_string(),
        profile: profile(
            PlaneSpec::offset(PlaneName::YZ, [0.0, -p.fastener_distance / 2.0, 0.0]),
            OutlineSpec::Rect {
                width: p.slot_width,
                height: p.fastener_distance,
            },
        ),
        distance: p.extrusion_unit,
        symmetric: true,
    })
    .step(subtract("slot"))
    .step(fillet(
        Query::edges_of(Predicate::min(Axis::Y), Predicate::parallel(Axis::X)),
        round,
    ))
}

/// Stand-in for the machine ram dovetail, measured off the machine. Used to
/// check a clamp against the part it grips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DovetailPlaceholderParams {
    pub dovetail_base_width: f64,
    pub dovetail_top_width: f64,
    pub dovetail_height: f64,
    /// Length along the ram.
    pub length: f64,
    pub edge_chamfer: f64,
}

impl Default for DovetailPlaceholderParams {
    fn default() -> Self {
        let mount = DovetailMountParams::default();
        Self {
            dovetail_base_width: mount.dovetail_base_width,
            dovetail_top_width: mount.dovetail_top_width,
            dovetail_height: mount.dovetail_height,
            length: mount.extrusion_unit * 3.0,
            edge_chamfer: 2.0,
        }
    }
}

pub fn dovetail_placeholder(p: &DovetailPlaceholderParams) -> FixtureDef {
    let half = profile(
        PlaneSpec::named(PlaneName::YZ),
        OutlineSpec::path(&[
            (p.dovetail_base_width / 2.0, 0.0),
            (p.dovetail_top_width / 2.0, p.dovetail_height),
            (0.0, p.dovetail_height),
        ]),
    );

    FixtureDef::new("dovetail_placeholder", BODY)
        .step(Step::Extrude {
            body: BODY.to_string(),
            profile: half,
            distance: p.length / 2.0,
            symmetric: true,
        })
        .step(Step::Chamfer {
            body: BODY.to_string(),
            select: Query::edges_of(Predicate::min(Axis::Z), Predicate::max(Axis::Y)),
            distance: p.edge_chamfer,
        })
        .step(Step::Mirror {
            body: BODY.to_string(),
            plane: PlaneName::XZ,
        })
}

/// Bracket holding a salvaged LED pod on an extrusion beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedMountParams {
    pub extrusion_unit: f64,
    pub fastener_distance: f64,
    pub fastener_diameter: f64,
    /// Usable thread depth of the pod mount.
    pub thread_depth: f64,
    pub mount_diameter: f64,
    /// Depth of the anti-rotation tab; the hole clears it.
    pub tab_depth: f64,
}

impl Default for LedMountParams {
    fn default() -> Self {
        Self {
            extrusion_unit: 25.4,
            fastener_distance: 6.0,
            fastener_diameter: 6.5,
            thread_depth: 4.5,
            mount_diameter: 20.0,
            tab_depth: 1.5,
        }
    }
}

pub fn led_mount(p: &LedMountParams) -> FixtureDef {
    let spin = p.mount_diameter + p.tab_depth;
    let wall = p.thread_depth - p.fastener_distance;
    let top = p.fastener_distance + spin * 2.0;
    let round = p.fastener_diameter * 0.4;

    let main = profile(
        PlaneSpec::named(PlaneName::YZ),
        OutlineSpec::path(&[
            (p.extrusion_unit, 0.0),
            (p.extrusion_unit, p.fastener_distance),
            (wall, p.fastener_distance),
            (wall, top),
            (-p.fastener_distance, top),
            (-p.fastener_distance, -p.extrusion_unit),
            (0.0, -p.extrusion_unit),
        ]),
    );
    let side_plate = profile(
        PlaneSpec::offset(PlaneName::YZ, [0.0, 0.0, spin]),
        OutlineSpec::path(&[
            (p.extrusion_unit, 0.0),
            (p.extrusion_unit, p.fastener_distance),
            (wall, top),
            (-p.fastener_distance, top),
            (-p.fastener_distance, 0.0),
        ]),
    );
    let drill = |body: &str, plane: PlaneSpec, radius: f64, depth: f64| Step::Extrude {
        body: body.to_string(),
        profile: profile(plane, OutlineSpec::circle(radius)),
        distance: depth,
        symmetric: false,
    };

    FixtureDef::new("led_mount", BODY)
        .step(Step::Extrude {
            body: BODY.to_string(),
            profile: main,
            distance: spin + p.fastener_distance,
            symmetric: true,
        })
        // keep within the beam's own corner radius
        .step(fillet(
            Query::edges_of(
                Predicate::all([
                    Predicate::parallel(Axis::Z),
                    Predicate::rank(Axis::Z, Sense::Max, 1),
                ]),
                Predicate::min(Axis::Y),
            ),
            1.0,
        ))
        // supports the pod
        .step(fillet(
            Query::edges_of(
                Predicate::all([
                    Predicate::parallel(Axis::Z),
                    Predicate::rank(Axis::Z, Sense::Min, 1),
                ]),
                Predicate::min(Axis::Y),
            ),
            5.0,
        ))
        .step(Step::Extrude {
            body: "side_plate".to_string(),
            profile: side_plate,
            distance: p.fastener_distance,
            symmetric: false,
        })
        .step(Step::Combine {
            target: BODY.to_string(),
            tool: "side_plate".to_string(),
            op: BooleanKind::Union,
        })
        .step(drill(
            "pod_hole",
            PlaneSpec::offset(
                PlaneName::XZ,
                [0.0, p.fastener_distance + spin, p.fastener_distance - p.thread_depth],
            ),
            spin / 2.0,
            p.thread_depth,
        ))
        .step(subtract("pod_hole"))
        .step(drill(
            "top_fastener",
            PlaneSpec::offset(PlaneName::XY, [0.0, p.extrusion_unit / 2.0, 0.0]),
            p.fastener_diameter / 2.0,
            p.fastener_distance,
        ))
        .step(subtract("top_fastener"))
        .step(drill(
            "front_fastener",
            PlaneSpec::offset(PlaneName::XZ, [0.0, -p.extrusion_unit / 2.0, 0.0]),
            p.fastener_diameter / 2.0,
            p.fastener_distance,
        ))
        .step(subtract("front_fastener"))
        .step(fillet(
            Query::edges_of(Predicate::min(Axis::X), Predicate::max(Axis::Z)),
            spin + p.fastener_diameter,
        ))
        // print bed adhesion
        .step(fillet(
            Query::edges_of(Predicate::min(Axis::Z), Predicate::parallel(Axis::X)),
            round,
        ))
        .step(fillet(
            Query::edges_of(Predicate::max(Axis::Z), Predicate::min(Axis::Y)),
            round,
        ))
        .step(fillet(
            Query::edges_of(Predicate::max(Axis::Y), Predicate::min(Axis::Z)),
            round,
        ))
}

/// All built-in fixtures with default parameters.
pub fn catalog() -> Vec<FixtureDef> {
    vec![
        rail_insert(&RailInsertParams::default()),
        dovetail_mount(&DovetailMountParams::default()),
        dovetail_mount(&DovetailMountParams {
            two_piece: true,
            ..DovetailMountParams::default()
        }),
        led_mount(&LedMountParams::default()),
        dovetail_placeholder(&DovetailPlaceholderParams::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture_types::Point2D;

    #[test]
    fn dovetail_defaults_place_holes_on_the_plate() {
        let def = dovetail_mount(&DovetailMountParams::default());
        let centers: Vec<[f64; 3]> = def
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Extrude {
                    profile:
                        ProfileSpec {
                            plane: PlaneSpec::Named { offset, .. },
                            outline: OutlineSpec::Circle { .. },
                            ..
                        },
                    ..
                } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(centers.len(), 2);
        assert!((centers[0][1] - 90.125).abs() < 1e-9);
        assert!((centers[1][1] - 15.2).abs() < 1e-9);
    }

    #[test]
    fn params_fill_missing_fields_from_defaults() {
        let p: RailInsertParams = serde_json::from_str(r#"{ "insert_length": 40 }"#).unwrap();
        assert_eq!(p.insert_length, 40.0);
        assert_eq!(p.channel_width, 17.0);
    }

    #[test]
    fn recipes_round_trip_through_json() {
        for def in catalog() {
            let json = serde_json::to_string(&def).unwrap();
            let back = FixtureDef::from_json(&json).unwrap();
            assert_eq!(back.id, def.id);
            assert_eq!(back.output, def.output);
            let kinds = |d: &FixtureDef| d.steps.iter().map(Step::name).collect::<Vec<_>>();
            assert_eq!(kinds(&back), kinds(&def));
        }
    }

    #[test]
    fn point_helper_builds_closed_paths() {
        match OutlineSpec::path(&[(1.0, 0.0), (1.0, 1.0)]) {
            OutlineSpec::Path { start, points, closed } => {
                assert!(start.is_none());
                assert!(closed);
                assert_eq!(points[1], Point2D::new(1.0, 1.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

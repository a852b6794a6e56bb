use fixture_types::{BoundingBox, PlaneName, Point2D, Predicate, Query, Tolerance};
use modeling_ops::{BooleanKind, MirrorMode, OpError, Solid};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fixture recipe: named bodies built by an ordered list of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDef {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub steps: Vec<Step>,
    /// Body holding the finished fixture once all steps ran.
    pub output: String,
}

impl FixtureDef {
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            steps: Vec::new(),
            output: output.into(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where a profile is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaneSpec {
    /// A named plane, optionally offset in its own frame and rotated.
    Named {
        name: PlaneName,
        #[serde(default)]
        offset: [f64; 3],
        #[serde(default)]
        rotate: [f64; 3],
    },
    /// On the coplanar faces of an existing body picked by `faces`.
    OnFaces { body: String, faces: Predicate },
}

impl PlaneSpec {
    pub fn named(name: PlaneName) -> Self {
        PlaneSpec::Named {
            name,
            offset: [0.0; 3],
            rotate: [0.0; 3],
        }
    }

    pub fn offset(name: PlaneName, offset: [f64; 3]) -> Self {
        PlaneSpec::Named {
            name,
            offset,
            rotate: [0.0; 3],
        }
    }
}

fn closed_default() -> bool {
    true
}

/// The boundary drawn on the plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutlineSpec {
    /// Polyline from `start` (plane origin when absent) through `points`.
    Path {
        #[serde(default)]
        start: Option<Point2D>,
        points: Vec<Point2D>,
        #[serde(default = "closed_default")]
        closed: bool,
    },
    Rect { width: f64, height: f64 },
    Circle {
        #[serde(default)]
        center: Point2D,
        radius: f64,
    },
    Polygon {
        sides: usize,
        diameter: f64,
        #[serde(default)]
        circumscribed: bool,
    },
}

impl OutlineSpec {
    /// Closed polyline starting at the plane origin.
    pub fn path(points: &[(f64, f64)]) -> Self {
        OutlineSpec::Path {
            start: None,
            points: points.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            closed: true,
        }
    }

    pub fn circle(radius: f64) -> Self {
        OutlineSpec::Circle {
            center: Point2D::ORIGIN,
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub plane: PlaneSpec,
    pub outline: OutlineSpec,
    #[serde(default)]
    pub mirror: Option<MirrorMode>,
}

/// One pipeline step. Steps name the bodies they read and write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Step {
    /// Sweep a profile into a new body (replacing any body of that name).
    Extrude {
        body: String,
        profile: ProfileSpec,
        distance: f64,
        #[serde(default)]
        symmetric: bool,
    },
    /// Union a body with its reflection through a named plane at the origin.
    Mirror { body: String, plane: PlaneName },
    /// Move `source` (or `body` itself) by `offset` into `body`.
    Translate {
        body: String,
        #[serde(default)]
        source: Option<String>,
        offset: [f64; 3],
    },
    /// Combine `tool` into `target`. The tool body is consumed.
    Combine {
        target: String,
        tool: String,
        op: BooleanKind,
    },
    /// Cut a profile through all of `target`.
    CutThroughAll { target: String, profile: ProfileSpec },
    Fillet {
        body: String,
        select: Query,
        radius: f64,
    },
    Chamfer {
        body: String,
        select: Query,
        distance: f64,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Extrude { .. } => "extrude",
            Step::Mirror { .. } => "mirror",
            Step::Translate { .. } => "translate",
            Step::Combine { .. } => "combine",
            Step::CutThroughAll { .. } => "cut_through_all",
            Step::Fillet { .. } => "fillet",
            Step::Chamfer { .. } => "chamfer",
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tolerances used by geometric selection.
    pub tolerance: Tolerance,
    /// Worker threads for `build_all`. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A finished fixture.
#[derive(Debug)]
pub struct FixtureOutput {
    pub id: Uuid,
    pub name: String,
    pub solid: Solid,
    pub face_count: usize,
    pub edge_count: usize,
    pub bbox: BoundingBox,
}

/// Pipeline component a step failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    ProfileBuilder,
    SweepEngine,
    BooleanCompositor,
    Selector,
    FeatureApplier,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Component::ProfileBuilder => "profile builder",
            Component::SweepEngine => "sweep engine",
            Component::BooleanCompositor => "boolean compositor",
            Component::Selector => "selector",
            Component::FeatureApplier => "feature applier",
        };
        f.write_str(name)
    }
}

/// Errors from the fixture engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("fixture {fixture}: step {step} failed in {component}: {source}")]
    StepFailed {
        fixture: String,
        step: usize,
        component: Component,
        #[source]
        source: OpError,
    },

    #[error("fixture {fixture}: step {step} names unknown body {body:?}")]
    UnknownBody {
        fixture: String,
        step: usize,
        body: String,
    },

    #[error("fixture {fixture}: output body {body:?} was never built")]
    MissingOutput { fixture: String, body: String },

    #[error("invalid engine configuration: {reason}")]
    Config { reason: String },

    #[error("failed to parse definition: {0}")]
    Parse(#[from] serde_json::Error),
}

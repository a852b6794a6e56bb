use std::collections::HashMap;

use fixture_types::{Tolerance, TopoKind, Workplane};
use modeling_ops::kernel_ext;
use modeling_ops::{
    apply_chamfer, apply_fillet, boolean, build, extrude, extrude_through_all, run_query, select,
    workplane_on, BooleanKind, KernelBundle, OpError, Profile, Solid,
};
use tracing::{debug, info, instrument};

use crate::types::{
    Component, EngineConfig, EngineError, FixtureDef, FixtureOutput, OutlineSpec, PlaneSpec,
    ProfileSpec, Step,
};

/// Named bodies of one fixture while its steps run.
struct Workshop<'a> {
    fixture: &'a str,
    step: usize,
    bodies: HashMap<String, Solid>,
    tol: Tolerance,
}

impl Workshop<'_> {
    fn failed(&self, component: Component) -> impl FnOnce(OpError) -> EngineError + '_ {
        move |source| EngineError::StepFailed {
            fixture: self.fixture.to_string(),
            step: self.step,
            component,
            source,
        }
    }

    fn unknown(&self, body: &str) -> EngineError {
        EngineError::UnknownBody {
            fixture: self.fixture.to_string(),
            step: self.step,
            body: body.to_string(),
        }
    }

    fn take(&mut self, body: &str) -> Result<Solid, EngineError> {
        self.bodies.remove(body).ok_or_else(|| self.unknown(body))
    }

    fn get(&self, body: &str) -> Result<&Solid, EngineError> {
        self.bodies.get(body).ok_or_else(|| self.unknown(body))
    }

    fn put(&mut self, body: &str, solid: Solid) {
        self.bodies.insert(body.to_string(), solid);
    }
}

/// Run every step of `def` on `kb` and return the output body.
///
/// Steps run strictly in order; the first failure aborts the fixture.
#[instrument(skip_all, fields(fixture = %def.name))]
pub fn build_fixture(
    kb: &mut dyn KernelBundle,
    def: &FixtureDef,
    config: &EngineConfig,
) -> Result<FixtureOutput, EngineError> {
    let mut shop = Workshop {
        fixture: &def.name,
        step: 0,
        bodies: HashMap::new(),
        tol: config.tolerance,
    };

    for (index, step) in def.steps.iter().enumerate() {
        shop.step = index;
        debug!(step = index, kind = step.name(), "running step");
        run_step(kb, &mut shop, step)?;
    }

    let solid = shop
        .bodies
        .remove(&def.output)
        .ok_or_else(|| EngineError::MissingOutput {
            fixture: def.name.clone(),
            body: def.output.clone(),
        })?;
    let introspect = kb.as_introspect();
    let (face_count, edge_count) = kernel_ext::topology_counts(introspect, &solid);
    let bbox = kernel_ext::solid_bbox(introspect, &solid).map_err(|_| {
        EngineError::MissingOutput {
            fixture: def.name.clone(),
            body: def.output.clone(),
        }
    })?;
    info!(face_count, edge_count, "fixture built");

    Ok(FixtureOutput {
        id: def.id,
        name: def.name.clone(),
        solid,
        face_count,
        edge_count,
        bbox,
    })
}

fn run_step(kb: &mut dyn KernelBundle, shop: &mut Workshop<'_>, step: &Step) -> Result<(), EngineError> {
    match step {
        Step::Extrude {
            body,
            profile,
            distance,
            symmetric,
        } => {
            let profile = make_profile(kb, shop, profile)?;
            let solid = extrude(kb, &profile, *distance, *symmetric)
                .map_err(shop.failed(Component::SweepEngine))?;
            shop.put(body, solid);
        }
        Step::Mirror { body, plane } => {
            let solid = shop.take(body)?;
            let normal = plane.normal_axis().unit();
            let mirrored = boolean::mirror_union(kb, solid, [0.0; 3], normal)
                .map_err(shop.failed(Component::BooleanCompositor))?;
            shop.put(body, mirrored);
        }
        Step::Translate {
            body,
            source,
            offset,
        } => {
            let from = source.as_deref().unwrap_or(body);
            let moved = boolean::translate(kb, shop.get(from)?, *offset)
                .map_err(shop.failed(Component::BooleanCompositor))?;
            shop.put(body, moved);
        }
        Step::Combine { target, tool, op } => {
            let a = shop.take(target)?;
            let b = shop.take(tool)?;
            let combined = boolean::combine(kb, a, b, *op)
                .map_err(shop.failed(Component::BooleanCompositor))?;
            shop.put(target, combined);
        }
        Step::CutThroughAll { target, profile } => {
            let profile = make_profile(kb, shop, profile)?;
            let tool = extrude_through_all(kb, &profile, shop.get(target)?)
                .map_err(shop.failed(Component::SweepEngine))?;
            let solid = shop.take(target)?;
            let cut = boolean::combine(kb, solid, tool, BooleanKind::Subtract)
                .map_err(shop.failed(Component::BooleanCompositor))?;
            shop.put(target, cut);
        }
        Step::Fillet {
            body,
            select: query,
            radius,
        } => {
            let solid = shop.take(body)?;
            let selection = run_query(kb.as_introspect(), &solid, query, &shop.tol)
                .map_err(shop.failed(Component::Selector))?;
            let rounded = apply_fillet(kb, solid, &selection, *radius)
                .map_err(shop.failed(Component::FeatureApplier))?;
            shop.put(body, rounded);
        }
        Step::Chamfer {
            body,
            select: query,
            distance,
        } => {
            let solid = shop.take(body)?;
            let selection = run_query(kb.as_introspect(), &solid, query, &shop.tol)
                .map_err(shop.failed(Component::Selector))?;
            let beveled = apply_chamfer(kb, solid, &selection, *distance)
                .map_err(shop.failed(Component::FeatureApplier))?;
            shop.put(body, beveled);
        }
    }
    Ok(())
}

fn make_profile(
    kb: &dyn KernelBundle,
    shop: &Workshop<'_>,
    spec: &ProfileSpec,
) -> Result<Profile, EngineError> {
    let plane = match &spec.plane {
        PlaneSpec::Named {
            name,
            offset,
            rotate,
        } => Workplane::named(*name).transformed(*offset, *rotate),
        PlaneSpec::OnFaces { body, faces } => {
            let solid = shop.get(body)?;
            let introspect = kb.as_introspect();
            select(introspect, solid, TopoKind::Face, faces, &shop.tol)
                .and_then(|sel| workplane_on(introspect, solid, &sel))
                .map_err(shop.failed(Component::Selector))?
        }
    };

    if spec.mirror.is_some() && !matches!(spec.outline, OutlineSpec::Path { .. }) {
        return Err(shop.failed(Component::ProfileBuilder)(OpError::InvalidProfile {
            reason: "only path outlines can be mirrored".to_string(),
        }));
    }

    let profile = match &spec.outline {
        OutlineSpec::Path {
            start,
            points,
            closed,
        } => build(plane, *start, points, *closed, spec.mirror),
        OutlineSpec::Rect { width, height } => Profile::rect(plane, *width, *height),
        OutlineSpec::Circle { center, radius } => Profile::circle(plane, *center, *radius),
        OutlineSpec::Polygon {
            sides,
            diameter,
            circumscribed,
        } => Profile::regular_polygon(plane, *sides, *diameter, *circumscribed),
    }
    .map_err(shop.failed(Component::ProfileBuilder))?;

    Ok(profile)
}

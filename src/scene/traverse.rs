//! The two passes a frame runs over the tree.
//!
//! `prepare` walks visible nodes from the root and records where each collider sits in world
//! space. Probes are then resolved with `collisions_with` against the whole tree, and the
//! `render` pass paints children in order so that later siblings land on top.

use crate::assets::ImageStatus;
use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::SceneResult;
use crate::math::{Matrix3, Vec3};
use crate::render::Canvas;
use crate::scene::graph::Scene;
use crate::scene::node::{NodeId, NodeKind, Paint, Property};
use crate::scene::shapes::{UNIT_SQUARE, unit_square_contains};

/// World-space position of a collider, captured during the prepare pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionProbe {
    pub vector: Vec3,
    pub target: NodeId,
}

impl Scene {
    fn visible_children(&self, id: NodeId) -> Vec<NodeId> {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Group(children)) => children
                .iter()
                .copied()
                .filter(|c| self.get(*c).is_some_and(|n| n.entity().visible()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Collects a probe for every visible collider below `id`. `outer` is the transform of
    /// the space `id` lives in.
    pub fn prepare(&self, id: NodeId, outer: &Matrix3, probes: &mut Vec<CollisionProbe>) {
        let Some(node) = self.get(id) else {
            return;
        };
        let world = *outer * *node.entity().matrix();
        match node.kind() {
            NodeKind::Group(_) => {
                for child in self.visible_children(id) {
                    self.prepare(child, &world, probes);
                }
            }
            NodeKind::Collider(_) => probes.push(CollisionProbe {
                vector: world.apply(Vec3::point(Vec2::ZERO)),
                target: id,
            }),
            _ => {}
        }
    }

    /// Nodes under `v`, which is expressed in the space `id` lives in. Groups report matches
    /// in child order.
    pub fn collisions_with(&self, id: NodeId, v: Vec3) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let local = node.entity().inverse_matrix().apply(v);
        let hit = match node.kind() {
            NodeKind::Group(_) => {
                return self
                    .visible_children(id)
                    .into_iter()
                    .flat_map(|child| self.collisions_with(child, local))
                    .collect();
            }
            NodeKind::Rectangle | NodeKind::Image(_) => unit_square_contains(local),
            NodeKind::Circle(circle) => circle.contains(local),
            NodeKind::Polygon(polygon) => polygon.contains(local),
            NodeKind::Entity | NodeKind::Path(_) | NodeKind::Text(_) | NodeKind::Collider(_) => {
                false
            }
        };
        if hit { vec![id] } else { Vec::new() }
    }

    /// Nodes under a scene-space point, in paint order.
    pub fn hit_test(&self, point: Vec2) -> Vec<NodeId> {
        self.collisions_with(self.root(), Vec3::point(point))
    }

    /// Stores `hits` on the collider `target`. Returns whether the set changed; only a change
    /// invalidates.
    pub fn deliver_collisions(&mut self, target: NodeId, hits: Vec<NodeId>) -> SceneResult<bool> {
        let changed = match &mut self.node_mut(target)?.kind {
            NodeKind::Collider(collider) => {
                let changed = collider.collisions != hits;
                collider.collisions = hits;
                changed
            }
            _ => return Ok(false),
        };
        self.notify(target, Property::Collisions);
        if changed {
            self.invalidate(target);
        }
        Ok(changed)
    }

    /// Paints `id` and its visible descendants under the canvas's current transform.
    pub fn render(&mut self, canvas: &mut dyn Canvas, id: NodeId) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        node.run_scheduled(canvas);
        let matrix = node.entity().matrix().to_affine();
        let paint = node.paint.unwrap_or_default();

        if let NodeKind::Group(_) = node.kind {
            canvas.save();
            canvas.transform(matrix);
            let mut result = Ok(());
            for child in self.visible_children(id) {
                result = self.render(canvas, child);
                if result.is_err() {
                    break;
                }
            }
            canvas.restore();
            return result;
        }

        match &mut node.kind {
            NodeKind::Entity | NodeKind::Collider(_) | NodeKind::Group(_) => Ok(()),
            NodeKind::Rectangle => {
                draw_shape(canvas, matrix, &paint, |c| c.rect(UNIT_SQUARE));
                Ok(())
            }
            NodeKind::Circle(circle) => {
                draw_shape(canvas, matrix, &paint, |c| circle.trace(c));
                Ok(())
            }
            NodeKind::Polygon(polygon) => {
                draw_shape(canvas, matrix, &paint, |c| polygon.trace(c));
                Ok(())
            }
            NodeKind::Path(path) => {
                draw_shape(canvas, matrix, &paint, |c| c.append_path(path.path()));
                Ok(())
            }
            NodeKind::Image(image) => {
                if let Some(bitmap) = image.bitmap.as_ref()
                    && image.status == ImageStatus::Success
                {
                    canvas.save();
                    canvas.set_global_alpha(paint.opacity);
                    canvas.transform(matrix);
                    canvas.draw_image(bitmap, UNIT_SQUARE);
                    canvas.restore();
                }
                Ok(())
            }
            NodeKind::Text(text) => {
                canvas.save();
                canvas.transform(matrix);
                paint.apply(canvas);
                let result = text.render(canvas, paint.border_width > 0.0);
                canvas.restore();
                result
            }
        }
    }
}

fn draw_shape(
    canvas: &mut dyn Canvas,
    matrix: Affine,
    paint: &Paint,
    trace: impl FnOnce(&mut dyn Canvas),
) {
    canvas.save();
    canvas.transform(matrix);
    paint.apply(canvas);
    canvas.begin_path();
    trace(&mut *canvas);
    canvas.fill();
    canvas.stroke();
    canvas.restore();
}

#[cfg(test)]
#[path = "../../tests/unit/scene/traverse.rs"]
mod tests;

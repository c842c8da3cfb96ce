use std::sync::Arc;

use crate::assets::{Bitmap, BitmapLoader, ImageStatus, PendingLoad};
use crate::foundation::core::{Color, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::math::{Matrix3, Vec3};
use crate::render::Canvas;
use crate::scene::node::{Entity, Node, NodeId, NodeKind, Paint, Property};
use crate::scene::shapes::{Circle, Collider, ImageShape, PathShape, Polygon};
use crate::scene::text::{HorizontalAlignment, Overflow, TextShape};

pub type Listener = Box<dyn FnMut(NodeId, Property)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One arena cell. `generation` advances each time the slot is vacated.
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena owning every node of one scene. Node 0 is the root group.
///
/// Mutations go through `Scene` so that change notifications and invalidation bubbling
/// stay consistent. Invalidations that reach the root mark the scene dirty; a view turns a
/// dirty scene into a frame request.
pub struct Scene {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    dirty: bool,
    invalidations: u64,
    loader: Option<Arc<dyn BitmapLoader>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.len())
            .field("root", &self.root)
            .field("listeners", &self.listeners.len())
            .field("dirty", &self.dirty)
            .field("invalidations", &self.invalidations)
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                generation: 0,
                node: Some(Node::new(NodeKind::Group(Vec::new()))),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            listeners: Vec::new(),
            next_subscription: 0,
            dirty: false,
            invalidations: 0,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn BitmapLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn set_loader(&mut self, loader: Arc<dyn BitmapLoader>) {
        self.loader = Some(loader);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn node(&self, id: NodeId) -> SceneResult<&Node> {
        self.get(id)
            .ok_or_else(|| SceneError::validation(format!("unknown node {id}")))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or_else(|| SceneError::validation(format!("unknown node {id}")))
    }

    pub fn entity(&self, id: NodeId) -> SceneResult<&Entity> {
        Ok(self.node(id)?.entity())
    }

    pub fn parent(&self, id: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> SceneResult<&[NodeId]> {
        match &self.node(id)?.kind {
            NodeKind::Group(children) => Ok(children),
            other => Err(kind_mismatch(id, other, "group")),
        }
    }

    /// Inserts a detached node, reusing the slot of a removed one when available.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(Node::new(kind));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index];
            slot.node = node;
            return NodeId::new(index, slot.generation);
        }
        self.nodes.push(Slot {
            generation: 0,
            node,
        });
        NodeId::new(self.nodes.len() - 1, 0)
    }

    /// Number of allocated slots, live or vacant.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn vacate(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .nodes
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)?;
        let node = slot.node.take()?;
        // A slot whose generation would wrap is retired instead of reused.
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(id.index);
        }
        Some(node)
    }

    pub fn create_entity(&mut self) -> NodeId {
        self.create(NodeKind::Entity)
    }

    pub fn create_group(&mut self) -> NodeId {
        self.create(NodeKind::Group(Vec::new()))
    }

    pub fn create_rectangle(&mut self) -> NodeId {
        self.create(NodeKind::Rectangle)
    }

    pub fn create_circle(&mut self) -> NodeId {
        self.create(NodeKind::Circle(Circle::default()))
    }

    pub fn create_polygon(&mut self, vertices: Vec<Vec2>) -> SceneResult<NodeId> {
        Ok(self.create(NodeKind::Polygon(Polygon::new(vertices)?)))
    }

    pub fn create_path(&mut self, data: &str) -> SceneResult<NodeId> {
        Ok(self.create(NodeKind::Path(PathShape::parse(data)?)))
    }

    pub fn create_image(&mut self) -> NodeId {
        self.create(NodeKind::Image(ImageShape::default()))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(TextShape::new(text)))
    }

    pub fn create_collider(&mut self) -> NodeId {
        self.create(NodeKind::Collider(Collider::default()))
    }

    /// Appends `child` to the group `parent`.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        if parent == child {
            return Err(SceneError::validation(format!(
                "cannot add node {child} to itself"
            )));
        }
        if child == self.root {
            return Err(SceneError::validation("the scene root cannot be re-parented"));
        }
        if let Some(existing) = self.node(child)?.parent {
            return Err(SceneError::validation(format!(
                "node {child} already belongs to {existing}"
            )));
        }
        self.children(parent)?;
        if self.ancestors(parent).any(|a| a == child) {
            return Err(SceneError::validation(format!(
                "adding {child} under {parent} would create a cycle"
            )));
        }

        self.node_mut(child)?.parent = Some(parent);
        if let NodeKind::Group(children) = &mut self.node_mut(parent)?.kind {
            children.push(child);
        }
        self.notify(parent, Property::Children);
        self.invalidate(parent);
        Ok(())
    }

    /// Detaches `id` from its parent and drops it with its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> SceneResult<()> {
        if id == self.root {
            return Err(SceneError::validation("the scene root cannot be removed"));
        }
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            if let NodeKind::Group(children) = &mut self.node_mut(parent)?.kind {
                children.retain(|c| *c != id);
            }
            self.notify(parent, Property::Children);
            self.invalidate(parent);
        }

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.vacate(next)
                && let NodeKind::Group(children) = node.kind
            {
                stack.extend(children);
            }
        }
        Ok(())
    }

    /// Parent, grandparent, ... up to the topmost node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(|n| n.parent), move |p| {
            self.get(*p).and_then(|n| n.parent)
        })
    }

    pub fn subscribe(&mut self, listener: impl FnMut(NodeId, Property) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub(crate) fn notify(&mut self, id: NodeId, property: Property) {
        for (_, listener) in &mut self.listeners {
            listener(id, property);
        }
    }

    /// Bubbles an invalidation from `id` to the topmost ancestor. Reaching the root marks the
    /// scene dirty.
    pub fn invalidate(&mut self, id: NodeId) {
        let top = self.ancestors(id).last().unwrap_or(id);
        if top == self.root && self.contains(id) {
            self.dirty = true;
            self.invalidations += 1;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Invalidations that reached the root since the scene was created.
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations
    }

    fn update_transform(
        &mut self,
        id: NodeId,
        property: Property,
        f: impl FnOnce(&Entity) -> (Vec2, f64, Vec2),
    ) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        let (location, rotation, scale) = f(&node.entity);
        node.entity.set_transform(location, rotation, scale)?;
        self.notify(id, property);
        self.notify(id, Property::Matrix);
        self.invalidate(id);
        Ok(())
    }

    pub fn set_location(&mut self, id: NodeId, location: Vec2) -> SceneResult<()> {
        self.update_transform(id, Property::Location, |e| {
            (location, e.rotation_angle(), e.scale())
        })
    }

    /// Rotation in degrees.
    pub fn set_rotation_angle(&mut self, id: NodeId, angle: f64) -> SceneResult<()> {
        self.update_transform(id, Property::RotationAngle, |e| {
            (e.location(), angle, e.scale())
        })
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) -> SceneResult<()> {
        self.update_transform(id, Property::Scale, |e| {
            (e.location(), e.rotation_angle(), scale)
        })
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> SceneResult<()> {
        self.node_mut(id)?.entity.set_visible(visible);
        self.notify(id, Property::Visible);
        self.invalidate(id);
        Ok(())
    }

    /// Moves along the node's own rotated axes.
    pub fn move_by(&mut self, id: NodeId, delta: Vec2) -> SceneResult<()> {
        let entity = self.entity(id)?;
        let location = entity.location() + entity.rotated_delta(delta);
        self.set_location(id, location)
    }

    /// Maps `p` from the node's parent space to world space.
    pub fn to_world(&self, id: NodeId, p: Vec2) -> SceneResult<Vec2> {
        self.node(id)?;
        let v = self
            .ancestors(id)
            .filter_map(|a| self.get(a))
            .fold(Vec3::point(p), |v, n| n.entity.matrix().apply(v));
        Ok(v.xy())
    }

    /// Inverse of [`Scene::to_world`].
    pub fn from_world(&self, id: NodeId, p: Vec2) -> SceneResult<Vec2> {
        self.node(id)?;
        let inverses: Vec<Matrix3> = self
            .ancestors(id)
            .filter_map(|a| self.get(a))
            .map(|n| *n.entity.inverse_matrix())
            .collect();
        let v = inverses
            .iter()
            .rev()
            .fold(Vec3::point(p), |v, m| m.apply(v));
        Ok(v.xy())
    }

    /// Queues `f` to run against the canvas at the start of the node's next render.
    pub fn schedule(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Canvas) + 'static,
    ) -> SceneResult<()> {
        self.node_mut(id)?.scheduled.push(Box::new(f));
        Ok(())
    }

    pub fn test_collision(&self, id: NodeId, collisions: &[NodeId]) -> bool {
        collisions.contains(&id)
    }

    fn update_paint(
        &mut self,
        id: NodeId,
        property: Property,
        f: impl FnOnce(&mut Paint),
    ) -> SceneResult<()> {
        let node = self.node_mut(id)?;
        let Some(paint) = node.paint.as_mut() else {
            return Err(SceneError::validation(format!(
                "node {id} is a {}, which has no paint attributes",
                node.kind.name()
            )));
        };
        f(paint);
        self.notify(id, property);
        self.invalidate(id);
        Ok(())
    }

    pub fn set_color(&mut self, id: NodeId, color: Color) -> SceneResult<()> {
        self.update_paint(id, Property::Color, |p| p.color = color)
    }

    pub fn set_border_color(&mut self, id: NodeId, color: Color) -> SceneResult<()> {
        self.update_paint(id, Property::BorderColor, |p| p.border_color = color)
    }

    pub fn set_border_width(&mut self, id: NodeId, width: f64) -> SceneResult<()> {
        self.update_paint(id, Property::BorderWidth, |p| p.border_width = width)
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f64) -> SceneResult<()> {
        self.update_paint(id, Property::Opacity, |p| p.opacity = opacity)
    }

    fn update_kind<T>(
        &mut self,
        id: NodeId,
        property: Property,
        f: impl FnOnce(&mut NodeKind) -> SceneResult<T>,
    ) -> SceneResult<T> {
        let out = f(&mut self.node_mut(id)?.kind)?;
        self.notify(id, property);
        self.invalidate(id);
        Ok(out)
    }

    pub fn circle(&self, id: NodeId) -> SceneResult<&Circle> {
        match &self.node(id)?.kind {
            NodeKind::Circle(c) => Ok(c),
            other => Err(kind_mismatch(id, other, "circle")),
        }
    }

    /// Start angle in degrees.
    pub fn set_begin(&mut self, id: NodeId, degrees: f64) -> SceneResult<()> {
        self.update_kind(id, Property::Begin, |k| match k {
            NodeKind::Circle(c) => c.set_begin_degrees(degrees),
            other => Err(kind_mismatch(id, other, "circle")),
        })
    }

    /// End angle in degrees.
    pub fn set_end(&mut self, id: NodeId, degrees: f64) -> SceneResult<()> {
        self.update_kind(id, Property::End, |k| match k {
            NodeKind::Circle(c) => c.set_end_degrees(degrees),
            other => Err(kind_mismatch(id, other, "circle")),
        })
    }

    pub fn set_vertices(&mut self, id: NodeId, vertices: Vec<Vec2>) -> SceneResult<()> {
        let polygon = Polygon::new(vertices)?;
        self.update_kind(id, Property::Vertices, |k| match k {
            NodeKind::Polygon(p) => {
                *p = polygon;
                Ok(())
            }
            other => Err(kind_mismatch(id, other, "polygon")),
        })
    }

    pub fn set_path_data(&mut self, id: NodeId, data: &str) -> SceneResult<()> {
        let shape = PathShape::parse(data)?;
        self.update_kind(id, Property::PathData, |k| match k {
            NodeKind::Path(p) => {
                *p = shape;
                Ok(())
            }
            other => Err(kind_mismatch(id, other, "path")),
        })
    }

    pub fn image(&self, id: NodeId) -> SceneResult<&ImageShape> {
        match &self.node(id)?.kind {
            NodeKind::Image(img) => Ok(img),
            other => Err(kind_mismatch(id, other, "image")),
        }
    }

    fn image_mut(&mut self, id: NodeId) -> SceneResult<&mut ImageShape> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Image(img) => Ok(img),
            other => Err(kind_mismatch(id, other, "image")),
        }
    }

    /// Starts loading `source` in the background. The image invalidates once it has loaded.
    pub fn set_source(&mut self, id: NodeId, source: impl Into<String>) -> SceneResult<()> {
        let source = source.into();
        let loader = self.loader.clone();
        let img = self.image_mut(id)?;
        img.source = source.clone();
        img.bitmap = None;
        img.pending = match &loader {
            Some(loader) if !source.is_empty() => {
                Some(PendingLoad::spawn(loader.clone(), source.clone()))
            }
            _ => None,
        };
        img.status = if source.is_empty() {
            ImageStatus::Empty
        } else if img.pending.is_some() {
            ImageStatus::Loading
        } else {
            tracing::warn!(node = %id, source = %source, "no bitmap loader configured");
            ImageStatus::Error
        };
        self.notify(id, Property::Source);
        self.notify(id, Property::Status);
        Ok(())
    }

    /// Installs an already decoded bitmap, bypassing the loader.
    pub fn set_bitmap(&mut self, id: NodeId, bitmap: Bitmap) -> SceneResult<()> {
        let img = self.image_mut(id)?;
        img.pending = None;
        self.finish_load(id, Ok(bitmap));
        Ok(())
    }

    fn finish_load(&mut self, id: NodeId, result: SceneResult<Bitmap>) {
        let Ok(img) = self.image_mut(id) else {
            return;
        };
        match result {
            Ok(bitmap) => {
                img.bitmap = Some(bitmap);
                img.status = ImageStatus::Success;
                self.notify(id, Property::Status);
                self.notify(id, Property::OriginalSize);
                self.invalidate(id);
            }
            Err(err) => {
                tracing::warn!(node = %id, source = %img.source, error = %err, "image load failed");
                img.status = ImageStatus::Error;
                self.notify(id, Property::Status);
            }
        }
    }

    fn loading_images(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot.node.as_ref().map(|n| &n.kind) {
                Some(NodeKind::Image(img)) if img.pending.is_some() => {
                    Some(NodeId::new(i, slot.generation))
                }
                _ => None,
            })
            .collect()
    }

    /// Applies finished bitmap loads without blocking. Returns how many completed.
    pub fn poll_images(&mut self) -> usize {
        let mut completed = 0;
        for id in self.loading_images() {
            let result = match self.image_mut(id) {
                Ok(img) => img.pending.as_ref().and_then(PendingLoad::try_take),
                Err(_) => None,
            };
            if let Some(result) = result {
                if let Ok(img) = self.image_mut(id) {
                    img.pending = None;
                }
                self.finish_load(id, result);
                completed += 1;
            }
        }
        completed
    }

    /// Blocks until every in-flight bitmap load has finished. Returns how many completed.
    pub fn await_images(&mut self) -> usize {
        let mut completed = 0;
        for id in self.loading_images() {
            let pending = match self.image_mut(id) {
                Ok(img) => img.pending.take(),
                Err(_) => None,
            };
            if let Some(pending) = pending {
                let result = pending.wait();
                self.finish_load(id, result);
                completed += 1;
            }
        }
        completed
    }

    pub fn text(&self, id: NodeId) -> SceneResult<&TextShape> {
        match &self.node(id)?.kind {
            NodeKind::Text(t) => Ok(t),
            other => Err(kind_mismatch(id, other, "text")),
        }
    }

    fn update_text(
        &mut self,
        id: NodeId,
        property: Property,
        f: impl FnOnce(&mut TextShape),
    ) -> SceneResult<()> {
        self.update_kind(id, property, |k| match k {
            NodeKind::Text(t) => {
                f(t);
                Ok(())
            }
            other => Err(kind_mismatch(id, other, "text")),
        })
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> SceneResult<()> {
        let text = text.into();
        self.update_text(id, Property::Text, |t| t.set_text(text))
    }

    pub fn set_font_family(&mut self, id: NodeId, family: impl Into<String>) -> SceneResult<()> {
        let family = family.into();
        self.update_text(id, Property::FontFamily, |t| t.set_font_family(family))
    }

    pub fn set_bold(&mut self, id: NodeId, bold: bool) -> SceneResult<()> {
        self.update_text(id, Property::Bold, |t| t.set_bold(bold))
    }

    pub fn set_italic(&mut self, id: NodeId, italic: bool) -> SceneResult<()> {
        self.update_text(id, Property::Italic, |t| t.set_italic(italic))
    }

    pub fn set_horizontal_alignment(
        &mut self,
        id: NodeId,
        alignment: HorizontalAlignment,
    ) -> SceneResult<()> {
        self.update_text(id, Property::HorizontalAlignment, |t| {
            t.set_alignment(alignment)
        })
    }

    pub fn set_overflow(&mut self, id: NodeId, overflow: Overflow) -> SceneResult<()> {
        self.update_text(id, Property::Overflow, |t| t.set_overflow(overflow))
    }

    /// Layout width in ems; non-positive means unbounded.
    pub fn set_width(&mut self, id: NodeId, width: f64) -> SceneResult<()> {
        if width.is_nan() {
            return Err(SceneError::validation("text width must not be NaN"));
        }
        self.update_text(id, Property::Width, |t| t.set_width(width))
    }

    pub fn collisions(&self, id: NodeId) -> SceneResult<&[NodeId]> {
        match &self.node(id)?.kind {
            NodeKind::Collider(c) => Ok(c.collisions()),
            other => Err(kind_mismatch(id, other, "collider")),
        }
    }
}

fn kind_mismatch(id: NodeId, actual: &NodeKind, expected: &str) -> SceneError {
    SceneError::validation(format!(
        "node {id} is a {}, not a {expected}",
        actual.name()
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;

use crate::foundation::core::{Color, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::math::{Matrix3, Vec3};
use crate::render::Canvas;
use crate::scene::shapes::{Circle, Collider, ImageShape, PathShape, Polygon};
use crate::scene::text::TextShape;

/// Handle of a node in a [`crate::scene::Scene`] arena.
///
/// Slots of removed nodes are reused; the generation tells a stale handle apart from the
/// node that took its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            g => write!(f, "#{}v{g}", self.index),
        }
    }
}

/// Observable attributes. Listeners receive one of these after every successful mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Location,
    RotationAngle,
    Scale,
    Visible,
    Matrix,
    Children,
    Color,
    BorderColor,
    BorderWidth,
    Opacity,
    Begin,
    End,
    Vertices,
    PathData,
    Source,
    Status,
    OriginalSize,
    Text,
    FontFamily,
    Bold,
    Italic,
    HorizontalAlignment,
    Overflow,
    Width,
    Collisions,
}

/// Local transform attributes shared by every node.
#[derive(Clone, Debug)]
pub struct Entity {
    location: Vec2,
    rotation_angle: f64,
    scale: Vec2,
    visible: bool,
    matrix: Matrix3,
    inverse_matrix: Matrix3,
}

impl Default for Entity {
    fn default() -> Self {
        Self {
            location: Vec2::ZERO,
            rotation_angle: 0.0,
            scale: Vec2::new(1.0, 1.0),
            visible: true,
            matrix: Matrix3::IDENTITY,
            inverse_matrix: Matrix3::IDENTITY,
        }
    }
}

impl Entity {
    pub fn location(&self) -> Vec2 {
        self.location
    }

    /// Rotation in degrees.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// `T(location) · R(rotation_angle) · S(scale)`.
    pub fn matrix(&self) -> &Matrix3 {
        &self.matrix
    }

    pub fn inverse_matrix(&self) -> &Matrix3 {
        &self.inverse_matrix
    }

    pub fn compose(location: Vec2, rotation_angle: f64, scale: Vec2) -> Matrix3 {
        Matrix3::translation(location)
            * Matrix3::rotation(rotation_angle)
            * Matrix3::scaling(scale)
    }

    /// Commits a new transform; on error nothing changes.
    pub(crate) fn set_transform(
        &mut self,
        location: Vec2,
        rotation_angle: f64,
        scale: Vec2,
    ) -> SceneResult<()> {
        if !location.is_finite() {
            return Err(SceneError::validation(format!(
                "location must be finite, got ({}, {})",
                location.x, location.y
            )));
        }
        if !rotation_angle.is_finite() {
            return Err(SceneError::validation(format!(
                "rotation angle must be finite, got {rotation_angle}"
            )));
        }
        if !scale.is_finite() {
            return Err(SceneError::validation(format!(
                "scale must be finite, got ({}, {})",
                scale.x, scale.y
            )));
        }
        let matrix = Self::compose(location, rotation_angle, scale);
        let inverse_matrix = matrix.invert().map_err(|_| {
            SceneError::validation(format!(
                "scale ({}, {}) makes the transform singular",
                scale.x, scale.y
            ))
        })?;

        self.location = location;
        self.rotation_angle = rotation_angle;
        self.scale = scale;
        self.matrix = matrix;
        self.inverse_matrix = inverse_matrix;
        Ok(())
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// `delta` expressed in the parent frame after turning it by the rotation angle.
    pub fn rotated_delta(&self, delta: Vec2) -> Vec2 {
        Matrix3::rotation(self.rotation_angle)
            .apply(Vec3::direction(delta))
            .xy()
    }
}

/// Paint attributes carried by drawable kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub border_color: Color,
    pub border_width: f64,
    pub opacity: f64,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::TRANSPARENT,
            border_color: Color::BLACK,
            border_width: 0.01,
            opacity: 1.0,
        }
    }
}

impl Paint {
    /// Fill, stroke, line width and global alpha in one go.
    pub fn apply(&self, canvas: &mut dyn Canvas) {
        canvas.set_fill(self.color);
        canvas.set_stroke(self.border_color);
        canvas.set_line_width(self.border_width);
        canvas.set_global_alpha(self.opacity);
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Entity,
    Group(Vec<NodeId>),
    Circle(Circle),
    Polygon(Polygon),
    Rectangle,
    Image(ImageShape),
    Path(PathShape),
    Text(TextShape),
    Collider(Collider),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Group(_) => "group",
            Self::Circle(_) => "circle",
            Self::Polygon(_) => "polygon",
            Self::Rectangle => "rectangle",
            Self::Image(_) => "image",
            Self::Path(_) => "path",
            Self::Text(_) => "text",
            Self::Collider(_) => "collider",
        }
    }

    /// Kinds that carry [`Paint`].
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            Self::Circle(_)
                | Self::Polygon(_)
                | Self::Rectangle
                | Self::Image(_)
                | Self::Path(_)
                | Self::Text(_)
        )
    }
}

pub type ScheduledFn = Box<dyn FnOnce(&mut dyn Canvas)>;

pub struct Node {
    pub(crate) entity: Entity,
    pub(crate) paint: Option<Paint>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) scheduled: Vec<ScheduledFn>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        let paint = kind.is_shape().then(Paint::default);
        Self {
            entity: Entity::default(),
            paint,
            parent: None,
            kind,
            scheduled: Vec::new(),
        }
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn paint(&self) -> Option<&Paint> {
        self.paint.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Runs and clears the one-shot closures queued by [`crate::scene::Scene::schedule`].
    pub(crate) fn run_scheduled(&mut self, canvas: &mut dyn Canvas) {
        for f in std::mem::take(&mut self.scheduled) {
            f(canvas);
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("entity", &self.entity)
            .field("paint", &self.paint)
            .field("parent", &self.parent)
            .field("kind", &self.kind)
            .field("scheduled", &self.scheduled.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;

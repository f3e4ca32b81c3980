//! Path layouts used to place generated zettelkasten nodes around a root.

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Upper bound on the nodes one layout may place.
pub const MAX_PATH_LENGTH: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZetPathError {
    #[error("invalid ZetPath style: {0}")]
    UnknownStyle(String),
}

/// One placement produced by a layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathNode {
    pub offset: Vec2,
    /// Multiplier of the root node's scale.
    pub scale: f32,
    /// Index into the same path; `None` is the root.
    pub parent: Option<usize>,
    /// `offset` is measured from the parent rather than from the root.
    pub relative_to_parent: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralOptions {
    pub curl: f32,
    pub path_distance: f32,
    pub path_length: usize,
    pub scale: f32,
}

impl Default for SpiralOptions {
    fn default() -> Self {
        Self {
            curl: 0.2,
            path_distance: 1.0,
            path_length: 64,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchingOptions {
    pub factor: usize,
    pub path_distance: f32,
    pub path_length: usize,
    pub scale: f32,
}

impl Default for BranchingOptions {
    fn default() -> Self {
        Self {
            factor: 4,
            path_distance: 1.0,
            path_length: 64,
            scale: 0.98,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialOptions {
    pub depth: f32,
    pub path_distance: f32,
    pub path_length: usize,
    pub scale: f32,
}

impl Default for RadialOptions {
    fn default() -> Self {
        Self {
            depth: 8.0,
            path_distance: 5.0,
            path_length: 64,
            scale: 0.8,
        }
    }
}

/// Per-style options; the factory picks the block for the requested style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZetPathOptions {
    pub spiral: SpiralOptions,
    pub branching: BranchingOptions,
    pub radial: RadialOptions,
}

impl ZetPathOptions {
    /// Sets every style's length, clamped to [`MAX_PATH_LENGTH`].
    pub fn with_path_length(mut self, path_length: usize) -> Self {
        let path_length = path_length.min(MAX_PATH_LENGTH);
        self.spiral.path_length = path_length;
        self.branching.path_length = path_length;
        self.radial.path_length = path_length;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZetPath {
    Spiral(SpiralOptions),
    Branching(BranchingOptions),
    Radial(RadialOptions),
    /// No layout; callers scatter nodes themselves.
    Empty,
}

impl ZetPath {
    pub const STYLE_NAMES: [&'static str; 4] = ["Radial", "Spiral", "Branching", "Random"];

    /// Builds the layout for `style_name`. The flag is set when placement is
    /// left to the caller (the `Random` style).
    pub fn create(style_name: &str, options: &ZetPathOptions) -> Result<(Self, bool), ZetPathError> {
        let path = match style_name.to_ascii_lowercase().as_str() {
            "random" => return Ok((Self::Empty, true)),
            "spiral" => Self::Spiral(options.spiral),
            "branching" => Self::Branching(options.branching),
            "radial" => Self::Radial(options.radial),
            _ => return Err(ZetPathError::UnknownStyle(style_name.to_owned())),
        };
        Ok((path, false))
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Self::Spiral(_) => "Spiral",
            Self::Branching(_) => "Branching",
            Self::Radial(_) => "Radial",
            Self::Empty => "Random",
        }
    }

    pub fn generate_path(&self) -> Vec<PathNode> {
        let path = match self {
            Self::Spiral(options) => spiral_path(options),
            Self::Branching(options) => branching_path(options),
            Self::Radial(options) => radial_path(options),
            Self::Empty => Vec::new(),
        };
        debug!(style = self.style_name(), nodes = path.len(), "generated ZetPath");
        path
    }
}

fn spiral_path(options: &SpiralOptions) -> Vec<PathNode> {
    let target_distance = options.path_distance * options.scale;
    let increment = 0.1 + options.curl.abs() * 0.3;
    let direction = if options.curl == 0.0 {
        0.0
    } else {
        options.curl.signum()
    };

    let path_length = options.path_length.min(MAX_PATH_LENGTH);
    let mut path = Vec::with_capacity(path_length);
    let mut angle = 0.0_f32;
    let mut radius = target_distance;

    // Each step hangs off the previous one so the run curls into a chain.
    for index in 0..path_length {
        let offset = vec2(angle.cos(), angle.sin()) * radius;
        path.push(PathNode {
            offset,
            scale: options.scale,
            parent: index.checked_sub(1),
            relative_to_parent: true,
        });

        angle += increment * direction;
        radius += increment;

        let current_distance = offset.length();
        if current_distance > 0.0 {
            radius *= target_distance / current_distance;
        }
    }

    path
}

fn branching_path(options: &BranchingOptions) -> Vec<PathNode> {
    let factor = options.factor;
    let path_length = options.path_length.min(MAX_PATH_LENGTH);
    if factor < 2 || path_length < 2 {
        return Vec::new();
    }

    let total_depth = path_length.ilog(factor) as usize;
    let angle_delta = TAU / factor as f32;

    fn grow(
        path: &mut Vec<PathNode>,
        options: &BranchingOptions,
        total_depth: usize,
        angle_delta: f32,
        depth: usize,
        parent: Option<usize>,
        angle: f32,
    ) {
        if depth == 0 {
            return;
        }

        let level = (total_depth - depth + 1) as i32;
        let factor = options.factor as f32;
        for branch in 0..options.factor {
            let branch_angle = angle + (branch as f32 - (factor - 1.0) / 2.0) * angle_delta;
            let radius = options.path_distance * level as f32;
            path.push(PathNode {
                offset: vec2(branch_angle.cos(), branch_angle.sin()) * radius,
                scale: options.scale.powi(level),
                parent,
                relative_to_parent: false,
            });

            let index = path.len() - 1;
            grow(
                path,
                options,
                total_depth,
                angle_delta,
                depth - 1,
                Some(index),
                branch_angle,
            );
        }
    }

    let mut path = Vec::new();
    grow(
        &mut path,
        options,
        total_depth,
        angle_delta,
        total_depth,
        None,
        0.0,
    );
    path
}

fn radial_ring(count: usize, spacing: f32, scale: f32, parent: Option<usize>) -> Vec<PathNode> {
    (0..count)
        .map(|index| {
            let angle = (TAU * index as f32) / count as f32;
            PathNode {
                offset: vec2(angle.cos(), angle.sin()) * spacing,
                scale,
                parent,
                relative_to_parent: true,
            }
        })
        .collect()
}

fn radial_path(options: &RadialOptions) -> Vec<PathNode> {
    let branches = (options.depth.max(0.0).floor() as usize).min(8);
    if branches == 0 {
        return Vec::new();
    }

    let path_length = options.path_length.min(MAX_PATH_LENGTH);
    let per_branch = (path_length / branches).min(50);
    let spacing = options.path_distance.max(1.0);
    let max_length = path_length * branches;

    let mut path = Vec::new();
    let mut scale = options.scale;
    let mut layer: Vec<Option<usize>> = vec![None];

    for _ in 0..branches.saturating_sub(1) {
        if path.len() >= max_length {
            break;
        }

        scale = (scale * options.scale).max(0.1);
        let mut next_layer = Vec::new();
        for &parent in &layer {
            if path.len() >= max_length {
                break;
            }

            let ring = radial_ring(per_branch, spacing, scale, parent);
            let room = max_length - path.len();
            for node in ring.into_iter().take(room) {
                path.push(node);
                next_layer.push(Some(path.len() - 1));
            }
        }
        layer = next_layer;
    }

    path
}

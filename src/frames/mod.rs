//! Reference frame catalog and rotation resolver.
//!
//! The catalog holds a small fixed table of built-in inertial frames plus
//! any frames defined through kernel-pool variables. Frames form a graph
//! rooted at J2000: every entry names a base frame and the Euler angles that
//! carry base-frame vector components into the frame. Resolving a rotation
//! between two frames composes through the root,
//! `R(from → to) = to_root(to)ᵀ · to_root(from)`, so new kernel-defined
//! frames extend the graph without new composition code.
//!
//! Kernel-defined frames follow the TKFRAME pool convention:
//!
//! ```text
//! FRAME_ROVER          = 1400001
//! FRAME_1400001_NAME   = 'ROVER'
//! FRAME_1400001_BASE   = 1
//! FRAME_1400001_ANGLES = ( 30.0, 0.0, 0.0 )      (degrees)
//! FRAME_1400001_AXES   = ( 3, 2, 3 )
//! ```
//!
//! The catalog keeps a [`Watcher`] per defining variable; when a definition
//! is reloaded, the cached composed rotations are dropped and the frame is
//! re-resolved on its next use. Resolution never guesses: an unresolvable
//! id is [`SpiceError::UnknownFrame`], not an approximation.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use ahash::RandomState;
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{FrameId, RADEG, RADSEC};
use crate::errors::SpiceError;
use crate::kernel_pool::{KernelPool, Watcher};

pub const FRAME_J2000: FrameId = 1;
pub const FRAME_B1950: FrameId = 2;
pub const FRAME_FK4: FrameId = 3;
pub const FRAME_GALACTIC: FrameId = 4;
pub const FRAME_ECLIPJ2000: FrameId = 5;
pub const FRAME_ECLIPB1950: FrameId = 6;

/// Designated root of the frame graph.
const FRAME_ROOT: FrameId = FRAME_J2000;

/// Safety cap on base-chain length (mirrors the classic 20-step limit of
/// iterative frame transformation loops).
const MAX_CHAIN_DEPTH: usize = 20;

struct BuiltinFrame {
    name: &'static str,
    id: FrameId,
    base: FrameId,
    /// Euler angles in arcseconds, applied about `axes` (1 = X, 2 = Y,
    /// 3 = Z) with the first-listed angle outermost, carrying base-frame
    /// components into this frame.
    angles_arcsec: [f64; 3],
    axes: [usize; 3],
}

const BUILTIN_FRAMES: [BuiltinFrame; 6] = [
    BuiltinFrame {
        name: "J2000",
        id: FRAME_J2000,
        base: FRAME_J2000,
        angles_arcsec: [0.0, 0.0, 0.0],
        axes: [3, 2, 3],
    },
    // IAU 1976 precession angles evaluated at B1950 (zeta, -theta, z).
    BuiltinFrame {
        name: "B1950",
        id: FRAME_B1950,
        base: FRAME_J2000,
        angles_arcsec: [1152.84248596724, -1002.26108439117, 1153.04066200330],
        axes: [3, 2, 3],
    },
    // B1950 plus the 0.525" FK4 equinox correction.
    BuiltinFrame {
        name: "FK4",
        id: FRAME_FK4,
        base: FRAME_B1950,
        angles_arcsec: [0.525, 0.0, 0.0],
        axes: [3, 2, 3],
    },
    // Classic galactic pole/node orientation with respect to FK4
    // (327 deg, 62.6 deg, 282.25 deg).
    BuiltinFrame {
        name: "GALACTIC",
        id: FRAME_GALACTIC,
        base: FRAME_FK4,
        angles_arcsec: [1_177_200.0, 225_360.0, 1_016_100.0],
        axes: [3, 1, 3],
    },
    // Mean obliquity of the ecliptic at J2000.
    BuiltinFrame {
        name: "ECLIPJ2000",
        id: FRAME_ECLIPJ2000,
        base: FRAME_J2000,
        angles_arcsec: [84_381.448, 0.0, 0.0],
        axes: [1, 2, 3],
    },
    // Mean obliquity of the ecliptic at B1950.
    BuiltinFrame {
        name: "ECLIPB1950",
        id: FRAME_ECLIPB1950,
        base: FRAME_B1950,
        angles_arcsec: [84_404.836, 0.0, 0.0],
        axes: [1, 2, 3],
    },
];

fn builtin_by_id(id: FrameId) -> Option<&'static BuiltinFrame> {
    BUILTIN_FRAMES.iter().find(|frame| frame.id == id)
}

fn builtin_by_name(name: &str) -> Option<&'static BuiltinFrame> {
    BUILTIN_FRAMES.iter().find(|frame| frame.name == name)
}

/// Coordinate (passive) rotation about one axis (1 = X, 2 = Y, 3 = Z):
/// the matrix that re-expresses vector components in a frame rotated by
/// `alpha`, i.e. the transpose of the active rotation.
///
/// Axes reaching this function have been validated by the definition
/// constructors.
fn rotmt(alpha: f64, axis: usize) -> Matrix3<f64> {
    let axis = match axis {
        1 => Vector3::x_axis(),
        2 => Vector3::y_axis(),
        3 => Vector3::z_axis(),
        _ => unreachable!("frame definition axes are validated at construction"),
    };
    Rotation3::from_axis_angle(&axis, -alpha).into()
}

/// Definition of a constant-offset (inertial-class) frame: a name, a base
/// frame, and the Euler angle/axis triplet relating the two.
///
/// Equality and hash are keyed on the resolved **name** only, so a
/// definition built by [`InertialFrameDef::builtin`] compares equal to one
/// spelled out field by field for the same frame.
#[derive(Debug, Clone)]
pub struct InertialFrameDef {
    name: String,
    base: FrameId,
    /// Angles in radians, first-listed angle outermost.
    angles: [f64; 3],
    axes: [usize; 3],
}

impl InertialFrameDef {
    pub fn new(
        name: impl Into<String>,
        base: FrameId,
        angles: [f64; 3],
        axes: [usize; 3],
    ) -> Result<Self, SpiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "frame name must not be empty".into(),
            ));
        }
        if axes.iter().any(|&axis| !(1..=3).contains(&axis)) {
            return Err(SpiceError::InvalidArgument(format!(
                "frame {name} axes must be 1, 2 or 3, got {axes:?}"
            )));
        }
        Ok(InertialFrameDef {
            name,
            base,
            angles,
            axes,
        })
    }

    /// Resolve `name` against the built-in frame table.
    pub fn builtin(name: &str) -> Result<Self, SpiceError> {
        let frame = builtin_by_name(name).ok_or_else(|| {
            SpiceError::InvalidArgument(format!("{name} is not a built-in frame"))
        })?;
        InertialFrameDef::new(
            frame.name,
            frame.base,
            frame.angles_arcsec.map(|a| a * RADSEC),
            frame.axes,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> FrameId {
        self.base
    }

    /// Rotation carrying base-frame vector components into this frame:
    /// `[a0]_ax0 · [a1]_ax1 · [a2]_ax2`, the first-listed angle outermost.
    fn defining_rotation(&self) -> Matrix3<f64> {
        rotmt(self.angles[0], self.axes[0])
            * rotmt(self.angles[1], self.axes[1])
            * rotmt(self.angles[2], self.axes[2])
    }
}

impl PartialEq for InertialFrameDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for InertialFrameDef {}

impl Hash for InertialFrameDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// The frame catalog: built-in table, resolved kernel-pool frames, watchers
/// and the composed-rotation cache.
#[derive(Debug, Default)]
pub struct FrameCatalog {
    kernel_frames: HashMap<FrameId, InertialFrameDef, RandomState>,
    kernel_watchers: HashMap<FrameId, Vec<Watcher>, RandomState>,
    cache: HashMap<(FrameId, FrameId), Matrix3<f64>, RandomState>,
}

impl FrameCatalog {
    pub fn new() -> Self {
        FrameCatalog::default()
    }

    /// Map a frame name to its integer id.
    ///
    /// Built-in names resolve from the fixed table; other names are looked
    /// up as `FRAME_<NAME>` pool variables. Unrecognized names map to the
    /// reserved root/default id 0 — a safe fallback, never an error. Note
    /// that 0 itself is not a resolvable frame.
    pub fn frame_number_of(&self, pool: &KernelPool, name: &str) -> FrameId {
        if let Some(frame) = builtin_by_name(name) {
            return frame.id;
        }
        pool.get_numeric(&format!("FRAME_{name}"))
            .and_then(|values| values.first().copied())
            .map_or(0, |id| id as FrameId)
    }

    /// Number of frames in the built-in table.
    pub fn builtin_count(&self) -> usize {
        BUILTIN_FRAMES.len()
    }

    /// Compute the rotation carrying vector components from frame `from` to
    /// frame `to`.
    ///
    /// Both ids must resolve — out-of-catalog ids (0, negative, or beyond
    /// the highest assigned id) fail with [`SpiceError::UnknownFrame`].
    /// `from == to` is the identity. Unrelated frames compose through the
    /// root. Results are cached per `(from, to)` pair; the cache is dropped
    /// whenever a watched kernel definition changes.
    pub fn rotation_between(
        &mut self,
        pool: &KernelPool,
        from: FrameId,
        to: FrameId,
    ) -> Result<Matrix3<f64>, SpiceError> {
        self.refresh(pool);

        if !self.is_known(pool, from)? {
            return Err(SpiceError::UnknownFrame(from));
        }
        if !self.is_known(pool, to)? {
            return Err(SpiceError::UnknownFrame(to));
        }
        if from == to {
            return Ok(Matrix3::identity());
        }
        if let Some(cached) = self.cache.get(&(from, to)) {
            return Ok(*cached);
        }

        let rotation = self.to_root(pool, to)?.transpose() * self.to_root(pool, from)?;
        self.cache.insert((from, to), rotation);
        Ok(rotation)
    }

    /// Drop cached rotations and resolved definitions whose pool variables
    /// changed since the last check. [`FrameCatalog::rotation_between`]
    /// calls this automatically; loaders may call it eagerly after bulk
    /// pool updates.
    pub fn refresh(&mut self, pool: &KernelPool) {
        let mut stale = Vec::new();
        for (id, watchers) in self.kernel_watchers.iter_mut() {
            let mut changed = false;
            for watcher in watchers.iter_mut() {
                changed |= pool.has_changed(watcher);
            }
            if changed {
                stale.push(*id);
            }
        }

        if !stale.is_empty() {
            // Compositions may chain through a stale frame: drop them all.
            self.cache.clear();
            for id in stale {
                self.kernel_frames.remove(&id);
                self.kernel_watchers.remove(&id);
            }
        }
    }

    fn is_known(&mut self, pool: &KernelPool, id: FrameId) -> Result<bool, SpiceError> {
        if id < 1 {
            return Ok(false);
        }
        if builtin_by_id(id).is_some() {
            return Ok(true);
        }
        self.ensure_kernel_frame(pool, id)
    }

    /// Resolve a kernel-pool frame definition for `id`, registering watchers
    /// on its defining variables. Returns `false` when the pool holds no
    /// complete definition.
    fn ensure_kernel_frame(&mut self, pool: &KernelPool, id: FrameId) -> Result<bool, SpiceError> {
        if self.kernel_frames.contains_key(&id) {
            return Ok(true);
        }

        let name_var = format!("FRAME_{id}_NAME");
        let base_var = format!("FRAME_{id}_BASE");
        let angles_var = format!("FRAME_{id}_ANGLES");
        let axes_var = format!("FRAME_{id}_AXES");

        let (Some(names), Some(bases), Some(angles), Some(axes)) = (
            pool.get_text(&name_var),
            pool.get_numeric(&base_var),
            pool.get_numeric(&angles_var),
            pool.get_numeric(&axes_var),
        ) else {
            return Ok(false);
        };

        let name = names.first().cloned().ok_or_else(|| {
            SpiceError::InvalidArgument(format!("{name_var} must hold a frame name"))
        })?;
        let base = bases.first().copied().ok_or_else(|| {
            SpiceError::InvalidArgument(format!("{base_var} must hold a frame id"))
        })? as FrameId;
        if angles.len() != 3 || axes.len() != 3 {
            return Err(SpiceError::InvalidArgument(format!(
                "{angles_var} and {axes_var} must each hold three values"
            )));
        }

        let def = InertialFrameDef::new(
            name.clone(),
            base,
            [
                angles[0] * RADEG,
                angles[1] * RADEG,
                angles[2] * RADEG,
            ],
            [axes[0] as usize, axes[1] as usize, axes[2] as usize],
        )?;

        let mut watchers = Vec::with_capacity(5);
        for var in [
            name_var,
            base_var,
            angles_var,
            axes_var,
            format!("FRAME_{name}"),
        ] {
            watchers.push(pool.watch(&var)?);
        }

        self.kernel_frames.insert(id, def);
        self.kernel_watchers.insert(id, watchers);
        Ok(true)
    }

    /// Rotation carrying vector components from frame `id` to the root,
    /// composed by climbing the base chain.
    fn to_root(&mut self, pool: &KernelPool, id: FrameId) -> Result<Matrix3<f64>, SpiceError> {
        let mut rotation = Matrix3::identity();
        let mut current = id;

        for _ in 0..MAX_CHAIN_DEPTH {
            if current == FRAME_ROOT {
                return Ok(rotation);
            }

            let (base, defining) = if let Some(frame) = builtin_by_id(current) {
                let def = InertialFrameDef::new(
                    frame.name,
                    frame.base,
                    frame.angles_arcsec.map(|a| a * RADSEC),
                    frame.axes,
                )?;
                (frame.base, def.defining_rotation())
            } else if self.ensure_kernel_frame(pool, current)? {
                let def = &self.kernel_frames[&current];
                (def.base(), def.defining_rotation())
            } else {
                return Err(SpiceError::UnknownFrame(current));
            };

            // The defining rotation carries base → frame; invert to climb.
            rotation = defining.transpose() * rotation;
            current = base;
        }

        Err(SpiceError::InvalidArgument(format!(
            "frame {id} base chain exceeds {MAX_CHAIN_DEPTH} hops"
        )))
    }
}

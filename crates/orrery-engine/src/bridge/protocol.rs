//! SharedArrayBuffer layout for the renderer.
//! Must stay in sync with TypeScript `protocol.ts`.
//!
//! Layout (all values in f32 / 4 bytes):
//! ```text
//! [Header: 8 floats]
//! [Bodies: max_bodies × 8 floats]
//! [Orbit vertices: max_path_vertices × 4 floats]
//! ```
//!
//! The buffer is rebuilt from each published snapshot, so the renderer never
//! sees positions from two different instants.

use bytemuck::{Pod, Zeroable};

use crate::bodies::BODY_COUNT;
use crate::device::QualitySettings;
use crate::store::OrbitSnapshot;

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 8;

/// Header field indices.
pub const HEADER_PROTOCOL_VERSION: usize = 0;
pub const HEADER_REVISION: usize = 1;
pub const HEADER_BODY_COUNT: usize = 2;
pub const HEADER_PATH_VERTEX_COUNT: usize = 3;
pub const HEADER_SELECTED: usize = 4;
pub const HEADER_FLAGS: usize = 5;
pub const HEADER_SPEED: usize = 6;
pub const HEADER_SPHERE_SEGMENTS: usize = 7;

/// Header flag bits.
pub const FLAG_ORBITS_VISIBLE: u32 = 1;
pub const FLAG_LABELS_VISIBLE: u32 = 1 << 1;
pub const FLAG_PAUSED: u32 = 1 << 2;
pub const FLAG_CINEMATIC: u32 = 1 << 3;

pub const PROTOCOL_VERSION: f32 = 1.0;

/// Per-body render data. 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    pub body_id: f32,
    /// Heliocentric ecliptic position (AU).
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub display_radius: f32,
    /// 1.0 when the position is a substitute.
    pub stale: f32,
    /// 1.0 for the selected body.
    pub selected: f32,
    pub _pad: f32,
}

impl BodyInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// One orbit line vertex. Vertices of one body are contiguous.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PathVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub body_id: f32,
}

impl PathVertex {
    pub const FLOATS: usize = 4;
}

/// Section sizes and offsets for a buffer of the given capacities.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    pub max_bodies: usize,
    pub max_path_vertices: usize,
    pub body_data_offset: usize,
    pub path_data_offset: usize,
    pub buffer_total_floats: usize,
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    pub fn new(max_bodies: usize, max_path_vertices: usize) -> Self {
        let body_data_offset = HEADER_FLOATS;
        let path_data_offset = body_data_offset + max_bodies * BodyInstance::FLOATS;
        let buffer_total_floats = path_data_offset + max_path_vertices * PathVertex::FLOATS;
        Self {
            max_bodies,
            max_path_vertices,
            body_data_offset,
            path_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    /// Room for every body and the densest orbit lines.
    pub fn for_quality(settings: &QualitySettings) -> Self {
        Self::new(BODY_COUNT, BODY_COUNT * settings.orbit_samples as usize)
    }
}

/// Flat f32 buffer the renderer reads without copying.
pub struct PositionBuffer {
    layout: ProtocolLayout,
    data: Vec<f32>,
    revision: u64,
}

impl PositionBuffer {
    pub fn new(layout: ProtocolLayout) -> Self {
        let mut data = vec![0.0; layout.buffer_total_floats];
        data[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        Self {
            layout,
            data,
            revision: 0,
        }
    }

    pub fn layout(&self) -> &ProtocolLayout {
        &self.layout
    }

    /// Grow to a larger layout. Never shrinks, so pointers handed out for
    /// the larger buffer stay meaningful until the next resize.
    pub fn ensure_layout(&mut self, layout: ProtocolLayout) {
        if layout.buffer_total_floats > self.layout.buffer_total_floats {
            log::debug!("Position buffer grows to {} bytes", layout.buffer_total_bytes);
            self.data = vec![0.0; layout.buffer_total_floats];
            self.data[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
            self.layout = layout;
            self.revision = 0;
        }
    }

    /// Force the next `write_snapshot` to rewrite, e.g. after a settings change.
    pub fn invalidate(&mut self) {
        self.revision = 0;
    }

    /// Rewrite the buffer from `snapshot`. A snapshot already written is
    /// skipped. Returns true if the buffer changed.
    pub fn write_snapshot(&mut self, snapshot: &OrbitSnapshot, settings: &QualitySettings) -> bool {
        if snapshot.revision == self.revision && self.revision != 0 {
            return false;
        }
        self.revision = snapshot.revision;

        let bodies = &mut self.data[self.layout.body_data_offset..self.layout.path_data_offset];
        let instances: &mut [BodyInstance] = bytemuck::cast_slice_mut(bodies);
        let mut body_count = 0;
        for (slot, planet) in instances.iter_mut().zip(&snapshot.planets) {
            let p = planet.position.as_vec3();
            *slot = BodyInstance {
                body_id: planet.body.id() as f32,
                x: p.x,
                y: p.y,
                z: p.z,
                display_radius: planet.body.info().display_radius,
                stale: if planet.stale { 1.0 } else { 0.0 },
                selected: if snapshot.selected == Some(planet.body) { 1.0 } else { 0.0 },
                _pad: 0.0,
            };
            body_count += 1;
        }

        let paths = &mut self.data[self.layout.path_data_offset..];
        let vertices: &mut [PathVertex] = bytemuck::cast_slice_mut(paths);
        let mut vertex_count = 0;
        if snapshot.orbits_visible {
            let points = snapshot
                .orbit_paths
                .iter()
                .flat_map(|path| path.points.iter().map(move |p| (path.body, p)));
            for (slot, (body, point)) in vertices.iter_mut().zip(points) {
                let p = point.as_vec3();
                *slot = PathVertex {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    body_id: body.id() as f32,
                };
                vertex_count += 1;
            }
        }

        let mut flags = 0;
        if snapshot.orbits_visible {
            flags |= FLAG_ORBITS_VISIBLE;
        }
        if snapshot.labels_visible {
            flags |= FLAG_LABELS_VISIBLE;
        }
        if snapshot.is_paused() {
            flags |= FLAG_PAUSED;
        }
        if snapshot.is_cinematic() {
            flags |= FLAG_CINEMATIC;
        }

        self.data[HEADER_REVISION] = snapshot.revision as f32;
        self.data[HEADER_BODY_COUNT] = body_count as f32;
        self.data[HEADER_PATH_VERTEX_COUNT] = vertex_count as f32;
        self.data[HEADER_SELECTED] = snapshot.selected.map_or(-1.0, |b| b.id() as f32);
        self.data[HEADER_FLAGS] = flags as f32;
        self.data[HEADER_SPEED] = snapshot.speed as f32;
        self.data[HEADER_SPHERE_SEGMENTS] = settings.sphere_segments as f32;
        true
    }

    pub fn body_count(&self) -> u32 {
        self.data[HEADER_BODY_COUNT] as u32
    }

    pub fn path_vertex_count(&self) -> u32 {
        self.data[HEADER_PATH_VERTEX_COUNT] as u32
    }

    pub fn bodies(&self) -> &[BodyInstance] {
        let end = self.layout.body_data_offset + self.body_count() as usize * BodyInstance::FLOATS;
        bytemuck::cast_slice(&self.data[self.layout.body_data_offset..end])
    }

    pub fn header(&self) -> &[f32] {
        &self.data[..HEADER_FLOATS]
    }

    /// Raw pointer to the whole buffer for SharedArrayBuffer reads.
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    pub fn len_floats(&self) -> usize {
        self.data.len()
    }
}

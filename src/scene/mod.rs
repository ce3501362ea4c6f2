pub mod factory;
pub mod sync;

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::render::Vertex;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self { min: first, max: first };
        for p in iter {
            aabb.min = aabb.min.min(p);
            aabb.max = aabb.max.max(p);
        }
        Some(aabb)
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// The owned 3D representation of one equipment item. Created and destroyed
/// exclusively by the reconciliation engine; everyone else reads.
pub struct SceneObject {
    pub tag: String,
    pub kind: String,
    pub sistema: String,
    pub color: [f32; 4],
    /// World-space triangles, the CPU source of truth for picking and for
    /// the GPU upload.
    pub triangles: Vec<[Vec3; 3]>,
    pub aabb: Aabb,
    pub visible: bool,
    /// Built lazily before the first draw; dropped with the object, which
    /// releases the GPU buffers.
    pub gpu_mesh: Option<GpuMesh>,
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl SceneObject {
    /// Rebuild the GPU vertex buffer from the CPU triangle list. Flat shaded:
    /// every vertex of a triangle carries the face normal.
    pub fn rebuild_gpu_mesh(&mut self, device: &wgpu::Device) {
        if self.triangles.is_empty() {
            self.gpu_mesh = None;
            return;
        }

        let mut vertices = Vec::with_capacity(self.triangles.len() * 3);
        for tri in &self.triangles {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            for v in tri {
                vertices.push(Vertex {
                    position: (*v).into(),
                    normal: normal.into(),
                    color: self.color,
                });
            }
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("equipment_vb"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        self.gpu_mesh = Some(GpuMesh {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        });
    }
}

/// All objects owned by the reconciliation engine, plus the persistent ground
/// plane whose scene membership follows the terrain layer.
pub struct SceneSet {
    pub objects: Vec<SceneObject>,
    pub ground: SceneObject,
    pub ground_in_scene: bool,
}

impl SceneSet {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            ground: factory::build_ground(),
            ground_in_scene: true,
        }
    }

    pub fn object_by_tag(&self, tag: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.tag == tag)
    }

    /// Upload any objects whose GPU mesh is missing (fresh from reconciliation).
    pub fn upload_missing(&mut self, device: &wgpu::Device) {
        for obj in &mut self.objects {
            if obj.gpu_mesh.is_none() {
                obj.rebuild_gpu_mesh(device);
            }
        }
        if self.ground.gpu_mesh.is_none() {
            self.ground.rebuild_gpu_mesh(device);
        }
    }
}

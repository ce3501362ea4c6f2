use glam::{Mat4, Vec2, Vec3};

use crate::scene::{Aabb, SceneObject};

/// A ray in 3D space with origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray from screen coordinates (pixels) through the camera.
    /// `screen_pos` is in pixels from top-left, `screen_size` is viewport
    /// width/height.
    pub fn from_screen(screen_pos: Vec2, screen_size: Vec2, view_proj: Mat4) -> Self {
        // Convert screen coords to NDC (-1..1)
        let ndc_x = (2.0 * screen_pos.x / screen_size.x) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen_pos.y / screen_size.y); // Y is flipped

        let inv_vp = view_proj.inverse();

        let near_point = inv_vp.project_point3(Vec3::new(ndc_x, ndc_y, -1.0));
        let far_point = inv_vp.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));

        let direction = (far_point - near_point).normalize();

        Self { origin: near_point, direction }
    }

    /// Intersect ray with a triangle (Möller–Trumbore algorithm).
    /// Returns distance along ray if hit, None if miss.
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let a = edge1.dot(h);

        if a.abs() < 1e-7 {
            return None; // Parallel to triangle
        }

        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t > 1e-7 { Some(t) } else { None }
    }

    /// Slab test against an axis-aligned box. Returns the entry distance
    /// (0.0 when the origin is inside), None on a miss.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv = self.direction.recip();
        let t1 = (aabb.min - self.origin) * inv;
        let t2 = (aabb.max - self.origin) * inv;

        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        if t_max < t_min.max(0.0) {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Pick the nearest visible equipment object hit by the ray and return its
/// identity tag. Every pickable object carries its tag directly, so there is
/// no ancestor chain to resolve. Shared by click selection and hover polling.
pub fn pick_equipment<'a>(ray: &Ray, objects: &'a [SceneObject]) -> Option<&'a str> {
    let mut closest: Option<(f32, &str)> = None;

    for obj in objects {
        if !obj.visible {
            continue;
        }
        // Cheap reject: an AABB entry farther than the best triangle hit so
        // far cannot improve on it.
        match ray.intersect_aabb(&obj.aabb) {
            Some(entry) if closest.is_none_or(|(best, _)| entry < best) => {}
            _ => continue,
        }
        for tri in &obj.triangles {
            if let Some(t) = ray.intersect_triangle(tri[0], tri[1], tri[2])
                && closest.is_none_or(|(best, _)| t < best)
            {
                closest = Some((t, obj.tag.as_str()));
            }
        }
    }

    closest.map(|(_, tag)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColorMode, Equipment, NOT_APPLICABLE};
    use crate::scene::factory;
    use approx::assert_relative_eq;

    fn object_at(tag: &str, position: Vec3) -> SceneObject {
        let item = Equipment {
            tag: tag.to_string(),
            name: tag.to_string(),
            kind: "Building".to_string(),
            sistema: "GA".to_string(),
            area: "Área 31".to_string(),
            position,
            rotation: None,
            color: [0.5, 0.5, 0.5],
            size: Some(Vec3::splat(2.0)),
            product: NOT_APPLICABLE.to_string(),
            operational_state: NOT_APPLICABLE.to_string(),
        };
        factory::build_object(&item, ColorMode::Equipamento)
    }

    fn ray_along_z() -> Ray {
        Ray { origin: Vec3::new(0.0, 0.0, 20.0), direction: Vec3::NEG_Z }
    }

    #[test]
    fn empty_candidate_set_yields_none() {
        assert!(pick_equipment(&ray_along_z(), &[]).is_none());
    }

    #[test]
    fn invisible_objects_are_ignored() {
        let mut obj = object_at("A", Vec3::ZERO);
        obj.visible = false;
        assert!(pick_equipment(&ray_along_z(), &[obj]).is_none());
    }

    #[test]
    fn nearest_object_wins() {
        let near = object_at("near", Vec3::new(0.0, 0.0, 10.0));
        let far = object_at("far", Vec3::ZERO);
        let objects = vec![far, near];
        assert_eq!(pick_equipment(&ray_along_z(), &objects), Some("near"));
    }

    #[test]
    fn ray_misses_offset_object() {
        let obj = object_at("A", Vec3::new(50.0, 0.0, 0.0));
        assert!(pick_equipment(&ray_along_z(), &[obj]).is_none());
    }

    #[test]
    fn aabb_slab_test() {
        let aabb = Aabb { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) };
        let ray = ray_along_z();
        let t = ray.intersect_aabb(&aabb).expect("hit");
        assert_relative_eq!(t, 19.0, epsilon = 1e-4);

        // Origin inside the box.
        let inside = Ray { origin: Vec3::ZERO, direction: Vec3::X };
        assert_eq!(inside.intersect_aabb(&aabb), Some(0.0));
    }

    #[test]
    fn screen_center_ray_passes_through_the_target() {
        let eye = Vec3::new(0.0, 5.0, 10.0);
        let target = Vec3::ZERO;
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 500.0);
        let ray = Ray::from_screen(
            Vec2::new(640.0, 360.0),
            Vec2::new(1280.0, 720.0),
            proj * view,
        );

        let expected = (target - eye).normalize();
        assert_relative_eq!(ray.direction.x, expected.x, epsilon = 1e-3);
        assert_relative_eq!(ray.direction.y, expected.y, epsilon = 1e-3);
        assert_relative_eq!(ray.direction.z, expected.z, epsilon = 1e-3);
    }
}

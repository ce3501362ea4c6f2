use glam::{EulerRot, Quat, Vec3};

use crate::model::{ColorMode, Equipment, NOT_APPLICABLE};
use super::{Aabb, SceneObject};

pub const GROUND_TAG: &str = "terrain-ground-plane";
const GROUND_EXTENT: f32 = 50.0;
// Sand color, matching the plant's dry dock surroundings.
const GROUND_COLOR: [f32; 4] = [0.902, 0.847, 0.690, 1.0];

const CYLINDER_SEGMENTS: usize = 16;

/// Build the owned scene object for one equipment item: resolve its color for
/// the active color mode, build kind-appropriate geometry, place it in world
/// space. Deterministic for a given (item, color mode).
pub fn build_object(item: &Equipment, color_mode: ColorMode) -> SceneObject {
    let color = equipment_color(item, color_mode);
    let size = item.size.unwrap_or_else(|| default_size(&item.kind));

    let mut triangles = match item.kind.as_str() {
        "Tank" => cylinder(size.x * 0.5, size.y, Vec3::Y),
        "Pipe" => cylinder(size.y * 0.5, size.x, Vec3::X),
        "Valve" => cylinder(size.x * 0.5, size.y, Vec3::Z),
        _ => cuboid(size),
    };

    let rotation = item
        .rotation
        .map(|r| Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z))
        .unwrap_or(Quat::IDENTITY);
    for tri in &mut triangles {
        for v in tri.iter_mut() {
            *v = rotation * *v + item.position;
        }
    }

    let aabb = Aabb::from_points(triangles.iter().flatten().copied())
        .unwrap_or(Aabb { min: item.position, max: item.position });

    SceneObject {
        tag: item.tag.clone(),
        kind: item.kind.clone(),
        sistema: item.sistema.clone(),
        color,
        triangles,
        aabb,
        visible: true,
        gpu_mesh: None,
    }
}

/// The persistent ground plane. Built once; the terrain layer only toggles
/// its scene membership.
pub fn build_ground() -> SceneObject {
    let e = GROUND_EXTENT;
    let corners = [
        Vec3::new(-e, 0.0, -e),
        Vec3::new(e, 0.0, -e),
        Vec3::new(e, 0.0, e),
        Vec3::new(-e, 0.0, e),
    ];
    let triangles = vec![
        [corners[0], corners[2], corners[1]],
        [corners[0], corners[3], corners[2]],
    ];
    let aabb = Aabb::from_points(corners).expect("ground corners");

    SceneObject {
        tag: GROUND_TAG.to_string(),
        kind: "Terrain".to_string(),
        sistema: String::new(),
        color: GROUND_COLOR,
        triangles,
        aabb,
        visible: true,
        gpu_mesh: None,
    }
}

fn default_size(kind: &str) -> Vec3 {
    match kind {
        "Building" => Vec3::new(5.0, 6.0, 5.0),
        "Crane" => Vec3::new(2.0, 10.0, 2.0),
        "Tank" => Vec3::new(4.0, 5.0, 4.0),
        "Pipe" => Vec3::new(8.0, 0.6, 0.6),
        "Valve" => Vec3::new(0.8, 0.8, 0.8),
        "Barge" | "Ship" => Vec3::new(12.0, 3.0, 5.0),
        _ => Vec3::new(2.0, 2.0, 2.0),
    }
}

/// Box centered at the origin.
fn cuboid(size: Vec3) -> Vec<[Vec3; 3]> {
    let h = size * 0.5;
    let p = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);

    // One quad per face, counter-clockwise seen from outside.
    let faces = [
        [p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)], // +Z
        [p(1.0, -1.0, -1.0), p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0)], // -Z
        [p(1.0, -1.0, 1.0), p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)], // +X
        [p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, 1.0, -1.0)], // -X
        [p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0), p(-1.0, 1.0, -1.0)], // +Y
        [p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(-1.0, -1.0, 1.0)], // -Y
    ];

    let mut triangles = Vec::with_capacity(12);
    for q in faces {
        triangles.push([q[0], q[1], q[2]]);
        triangles.push([q[0], q[2], q[3]]);
    }
    triangles
}

/// Cylinder centered at the origin with the given axis, including caps.
fn cylinder(radius: f32, length: f32, axis: Vec3) -> Vec<[Vec3; 3]> {
    // Build around Y, then rotate onto the requested axis.
    let half = length * 0.5;
    let ring = |y: f32| -> Vec<Vec3> {
        (0..CYLINDER_SEGMENTS)
            .map(|i| {
                let a = (i as f32) / (CYLINDER_SEGMENTS as f32) * std::f32::consts::TAU;
                Vec3::new(a.cos() * radius, y, a.sin() * radius)
            })
            .collect()
    };
    let bottom = ring(-half);
    let top = ring(half);

    let mut triangles = Vec::with_capacity(CYLINDER_SEGMENTS * 4);
    for i in 0..CYLINDER_SEGMENTS {
        let j = (i + 1) % CYLINDER_SEGMENTS;
        // Side quad.
        triangles.push([bottom[i], top[i], top[j]]);
        triangles.push([bottom[i], top[j], bottom[j]]);
        // Caps fan around the axis points.
        triangles.push([Vec3::new(0.0, half, 0.0), top[j], top[i]]);
        triangles.push([Vec3::new(0.0, -half, 0.0), bottom[i], bottom[j]]);
    }

    let rotation = Quat::from_rotation_arc(Vec3::Y, axis.normalize());
    if rotation != Quat::IDENTITY {
        for tri in &mut triangles {
            for v in tri.iter_mut() {
                *v = rotation * *v;
            }
        }
    }
    triangles
}

/// Map '0'-'9' and 'A'-'Z' (case-insensitive) to 0..=35; anything else to 0.
fn char_value(c: char) -> u32 {
    match c.to_ascii_uppercase() {
        d @ '0'..='9' => d as u32 - '0' as u32,
        l @ 'A'..='Z' => l as u32 - 'A' as u32 + 10,
        _ => 0,
    }
}

/// Resolve the rendered color of an equipment item for the active color mode.
pub fn equipment_color(item: &Equipment, color_mode: ColorMode) -> [f32; 4] {
    let base = [item.color[0], item.color[1], item.color[2], 1.0];

    match color_mode {
        ColorMode::Equipamento => base,
        ColorMode::EstadoOperacional => match item.operational_state.as_str() {
            "operando" => [1.0, 0.0, 0.0, 1.0],
            "não operando" => [0.0, 1.0, 0.0, 1.0],
            "manutenção" => [1.0, 1.0, 0.0, 1.0],
            "em falha" => [0.855, 0.439, 0.839, 1.0], // orchid
            _ => base,
        },
        ColorMode::Produto => {
            if item.product != NOT_APPLICABLE && item.product.chars().count() >= 3 {
                let mut chars = item.product.chars();
                let r = char_value(chars.next().unwrap_or('0')) as f32 / 35.0;
                let g = char_value(chars.next().unwrap_or('0')) as f32 / 35.0;
                let b = char_value(chars.next().unwrap_or('0')) as f32 / 35.0;
                [r, g, b, 1.0]
            } else {
                base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn item(kind: &str) -> Equipment {
        Equipment {
            tag: "EQ-01".to_string(),
            name: "Equipamento 01".to_string(),
            kind: kind.to_string(),
            sistema: "GA".to_string(),
            area: "Área 31".to_string(),
            position: Vec3::new(10.0, 1.0, -4.0),
            rotation: None,
            color: [0.2, 0.4, 0.6],
            size: None,
            product: NOT_APPLICABLE.to_string(),
            operational_state: NOT_APPLICABLE.to_string(),
        }
    }

    #[test]
    fn object_is_centered_on_its_position() {
        for kind in ["Building", "Tank", "Pipe", "Valve", "Crane"] {
            let obj = build_object(&item(kind), ColorMode::Equipamento);
            assert!(!obj.triangles.is_empty(), "{kind} produced no geometry");
            let center = obj.aabb.center();
            assert_relative_eq!(center.x, 10.0, epsilon = 1e-4);
            assert_relative_eq!(center.y, 1.0, epsilon = 1e-4);
            assert_relative_eq!(center.z, -4.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn rotation_is_applied_around_the_position() {
        let mut it = item("Pipe");
        it.rotation = Some(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let obj = build_object(&it, ColorMode::Equipamento);

        // A pipe runs along X; rotated a quarter turn it should extend in Z.
        let size = obj.aabb.size();
        assert!(size.z > size.x);
    }

    #[test]
    fn base_color_mode_uses_dataset_color() {
        let obj = build_object(&item("Tank"), ColorMode::Equipamento);
        assert_eq!(obj.color, [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn operational_state_palette() {
        let mut it = item("Tank");
        it.operational_state = "operando".to_string();
        assert_eq!(equipment_color(&it, ColorMode::EstadoOperacional), [1.0, 0.0, 0.0, 1.0]);

        it.operational_state = "não operando".to_string();
        assert_eq!(equipment_color(&it, ColorMode::EstadoOperacional), [0.0, 1.0, 0.0, 1.0]);

        it.operational_state = "manutenção".to_string();
        assert_eq!(equipment_color(&it, ColorMode::EstadoOperacional), [1.0, 1.0, 0.0, 1.0]);

        // Unknown or not-applicable states fall back to the base color.
        it.operational_state = NOT_APPLICABLE.to_string();
        assert_eq!(equipment_color(&it, ColorMode::EstadoOperacional), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn product_color_is_procedural() {
        let mut it = item("Tank");
        it.product = "ZZ0".to_string();
        let c = equipment_color(&it, ColorMode::Produto);
        assert_relative_eq!(c[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(c[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(c[2], 0.0, epsilon = 1e-6);

        // Too short or not applicable: base color.
        it.product = "A".to_string();
        assert_eq!(equipment_color(&it, ColorMode::Produto), [0.2, 0.4, 0.6, 1.0]);
        it.product = NOT_APPLICABLE.to_string();
        assert_eq!(equipment_color(&it, ColorMode::Produto), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn ground_lies_on_the_xz_plane() {
        let ground = build_ground();
        assert_eq!(ground.tag, GROUND_TAG);
        assert_eq!(ground.aabb.min.y, 0.0);
        assert_eq!(ground.aabb.max.y, 0.0);
    }
}

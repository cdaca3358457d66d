//! CPU mirror of the vertex-stage noise and displacement.
//!
//! The GPU evaluates [`NOISE_WGSL`](crate::shader_utils::NOISE_WGSL) once per
//! vertex per frame. The functions here follow the same arithmetic step for
//! step, which makes the displacement inspectable from tests and tools.

use glam::{Vec3, Vec4};

/// Time divisor applied before advecting the noise field.
pub const TIME_DIVISOR: f32 = 50.0;
/// Speed at which the slowed-down time advects the noise field.
pub const ADVECTION_SPEED: f32 = 5.0;
/// Scale applied to object-space positions before sampling noise.
pub const POSITION_FREQUENCY: f32 = 0.5;

/// Gradient lattice step. `floor(j * GRADIENT_STEP)` must land in 0..7 for
/// every `j` in 0..49, so this has to round up from 1/7 the way the WGSL
/// literal does.
const GRADIENT_STEP: f32 = 1.0 / 7.0;

#[allow(clippy::excessive_precision)]
const INV_SQRT_A: f32 = 1.792_842_914_001_59;
#[allow(clippy::excessive_precision)]
const INV_SQRT_B: f32 = 0.853_734_720_953_14;

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute4(x: Vec4) -> Vec4 {
    mod289_4(((x * 34.0) + 1.0) * x)
}

fn taylor_inv_sqrt4(r: Vec4) -> Vec4 {
    Vec4::splat(INV_SQRT_A) - INV_SQRT_B * r
}

/// WGSL `step(edge, x)`.
fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

/// 3D simplex noise, roughly in [-1, 1].
pub fn snoise(v: Vec3) -> f32 {
    let c: (f32, f32) = (1.0 / 6.0, 1.0 / 3.0);

    // First corner
    let mut i = (v + Vec3::splat(v.dot(Vec3::splat(c.1)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(c.0)));

    // Other corners
    let g = Vec3::new(step(x0.y, x0.x), step(x0.z, x0.y), step(x0.x, x0.z));
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let x1 = x0 - i1 + c.0;
    let x2 = x0 - i2 + c.1;
    let x3 = x0 - 0.5;

    // Permutations
    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients
    let n_ = GRADIENT_STEP;
    let ns = Vec3::new(n_ * 2.0, n_ * 0.5 - 1.0, n_);

    let j = p - 49.0 * (p * ns.z * ns.z).floor();

    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + ns.y;
    let y = y_ * ns.x + ns.y;
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + 1.0;
    let s1 = b1.floor() * 2.0 + 1.0;
    let sh = -Vec4::new(step(h.x, 0.0), step(h.y, 0.0), step(h.z, 0.0), step(h.w, 0.0));

    // xzyw swizzles
    let a0 = Vec4::new(b0.x, b0.z, b0.y, b0.w)
        + Vec4::new(s0.x, s0.z, s0.y, s0.w) * Vec4::new(sh.x, sh.x, sh.y, sh.y);
    let a1 = Vec4::new(b1.x, b1.z, b1.y, b1.w)
        + Vec4::new(s1.x, s1.z, s1.y, s1.w) * Vec4::new(sh.z, sh.z, sh.w, sh.w);

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    // Normalize gradients
    let norm = taylor_inv_sqrt4(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix final noise value
    let mut m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
        .max(Vec4::ZERO);
    m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Noise sample the displacement step takes for an object-space position.
pub fn displacement_noise(position: Vec3, time: f32) -> f32 {
    let update_time = time / TIME_DIVISOR;
    snoise(position * POSITION_FREQUENCY + update_time * ADVECTION_SPEED)
}

/// Displaced object-space position: `position * (n * distort^2 + radius)`.
pub fn displace(position: Vec3, time: f32, radius: f32, distort: f32) -> Vec3 {
    let n = displacement_noise(position, time);
    position * (n * distort * distort + radius)
}

/// HSV to RGB, matching [`COLOR_WGSL`](crate::shader_utils::COLOR_WGSL).
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let c = v * s;
    let hp = h * 6.0;
    let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
    let m = v - c;

    let rgb = if hp < 1.0 {
        Vec3::new(c, x, 0.0)
    } else if hp < 2.0 {
        Vec3::new(x, c, 0.0)
    } else if hp < 3.0 {
        Vec3::new(0.0, c, x)
    } else if hp < 4.0 {
        Vec3::new(0.0, x, c)
    } else if hp < 5.0 {
        Vec3::new(x, 0.0, c)
    } else {
        Vec3::new(c, 0.0, x)
    };

    rgb + Vec3::splat(m)
}

/// Per-vertex tint written by the optional noise tint patch.
pub fn noise_tint(position: Vec3, time: f32, distort: f32) -> Vec3 {
    let n = displacement_noise(position, time);
    let hue = (n * distort * 0.3 + time / TIME_DIVISOR).fract();
    // fract keeps negatives negative in Rust; WGSL's fract is x - floor(x).
    let hue = if hue < 0.0 { hue + 1.0 } else { hue };
    hsv_to_rgb(hue, 0.2, 1.0)
}

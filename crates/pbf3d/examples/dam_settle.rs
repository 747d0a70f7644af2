//! Drop a dam block and print settling statistics.

use glam::Vec3;
use pbf3d::{BoundingBox, FluidParams, FluidSim3D, FluidVolume};

fn main() {
    println!("=== DAM SETTLE ===\n");

    let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(2.0)).unwrap();
    let volume = FluidVolume {
        min: Vec3::new(0.725, 0.5, 0.725),
        max: Vec3::new(1.275, 1.05, 1.275),
        particle_count: 1000,
        color: [0.1, 0.4, 0.9, 1.0],
    };
    let mut sim = FluidSim3D::new(&[volume], bounds, FluidParams::default())
        .expect("valid configuration");

    println!("Particles: {}", sim.particle_count());
    println!(
        "Rest density: {}, h: {}\n",
        sim.params.rest_density, sim.params.smoothing_radius
    );

    let dt = 1.0 / 60.0;
    let gravity = Vec3::new(0.0, -9.8, 0.0);

    for frame in 0..600 {
        sim.step(gravity, dt);

        if frame % 30 == 0 {
            let n = sim.particle_count() as f32;
            let avg_vel: Vec3 =
                sim.particles.velocity.iter().fold(Vec3::ZERO, |a, &b| a + b) / n;
            let max_vel = sim
                .particles
                .velocity
                .iter()
                .map(|v| v.length())
                .fold(0.0f32, f32::max);
            let avg_density = sim.particles.density.iter().sum::<f32>() / n;
            let avg_y = sim.particles.position.iter().map(|p| p.y).sum::<f32>() / n;
            let slow = sim
                .particles
                .velocity
                .iter()
                .filter(|v| v.length() < 0.1)
                .count();

            println!(
                "F{:3}: avgVel=({:6.3},{:6.3},{:6.3}), |max|={:7.3}, density={:7.1}, avg_y={:.3}, slow={}",
                frame, avg_vel.x, avg_vel.y, avg_vel.z, max_vel, avg_density, avg_y, slow
            );
        }
    }

    let n = sim.particle_count() as f32;
    let avg_vel: Vec3 = sim.particles.velocity.iter().fold(Vec3::ZERO, |a, &b| a + b) / n;
    println!(
        "\nFinal avg velocity: ({:.6}, {:.6}, {:.6})",
        avg_vel.x, avg_vel.y, avg_vel.z
    );
}

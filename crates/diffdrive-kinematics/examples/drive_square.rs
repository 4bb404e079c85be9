use diffdrive_kinematics::*;

fn main() {
    let (wheel_distance, axial_distance, alpha) = (0.5, 0.2, 1.0);
    let drive = match DifferentialDrive::new(wheel_distance, axial_distance, alpha) {
        Ok(drive) => drive,
        Err(e) => {
            eprintln!("Failed to initialize kinematics: {}", e);
            return;
        }
    };

    // Straight legs, then pivot turns sized so one leg of turning is a quarter turn.
    let straight = WheelSpeeds::new(0.5, 0.5);
    let pivot_rate = core::f64::consts::FRAC_PI_2; // rad/s
    let pivot_speed = pivot_rate * (2.0 * wheel_distance + axial_distance) / (4.0 * alpha);
    let pivot = WheelSpeeds::new(pivot_speed, -pivot_speed);

    let dt = 0.1;
    let steps_per_leg = 10;
    let mut pose = Pose::default();

    println!("Simulating a square with {}", drive);
    println!("  Straight: {} -> {}", straight, drive.forward_kinematics(straight));
    println!("  Pivot:    {} -> {}", pivot, drive.forward_kinematics(pivot));

    for leg in 0..4 {
        for speeds in [straight, pivot] {
            for _ in 0..steps_per_leg {
                match drive.integrate_wheel_speeds(pose, speeds, dt) {
                    Ok(next) => pose = next,
                    Err(e) => {
                        eprintln!("Error during leg {}: {}", leg + 1, e);
                        return;
                    }
                }
            }
        }
        println!(
            "Leg {}: Pose: {} (heading {:.2} rad, {:?})",
            leg + 1,
            pose,
            pose.heading(),
            Quaternion::from_yaw(pose.theta)
        );
    }

    println!("\nFinal Pose: {:?}", pose);
}

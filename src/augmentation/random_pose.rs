extern crate nalgebra as na;
extern crate rand;
extern crate rand_distr;

use na::{Vector3, UnitQuaternion};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use color_eyre::eyre::{Result, bail};

use crate::augmentation::{Transform, state::SampleRandomState};
use crate::data::Data;
use crate::numerics::pose::Pose;
use crate::Float;

fn symmetric<R: Rng + ?Sized>(rng: &mut R, bound: Float) -> Float {
    match bound.abs() {
        b if b > 0.0 => Uniform::new_inclusive(-b,b).sample(rng),
        _ => 0.0
    }
}

/**
 * Perturbs the pose a depth map is rendered from.
 *
 * `Uniform` offsets the camera by up to +-range_translation along each camera axis and rotates it
 * by up to +-range_rotation degrees about each axis (roll, pitch, yaw).
 * `Disabled` returns the stored pose untouched and never samples.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub enum PoseRandomizer {
    Disabled,
    Uniform {
        range_translation: [Float;3],
        range_rotation: Float
    }
}

impl PoseRandomizer {
    pub fn uniform(range_translation: [Float;3], range_rotation: Float) -> PoseRandomizer {
        PoseRandomizer::Uniform{range_translation,range_rotation}
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Pose {
        match self {
            PoseRandomizer::Disabled => Pose::identity(),
            PoseRandomizer::Uniform{range_translation,range_rotation} => {
                let translation = Vector3::<Float>::new(
                    symmetric(rng,range_translation[0]),
                    symmetric(rng,range_translation[1]),
                    symmetric(rng,range_translation[2]));
                let bound = range_rotation.to_radians();
                let roll = symmetric(rng,bound);
                let pitch = symmetric(rng,bound);
                let yaw = symmetric(rng,bound);
                Pose::new(translation,UnitQuaternion::from_euler_angles(roll,pitch,yaw))
            }
        }
    }

    pub fn randomize(&self, state: &SampleRandomState, pose: &Pose) -> Pose {
        match self {
            PoseRandomizer::Disabled => *pose,
            PoseRandomizer::Uniform{..} => pose.compose(&state.pose_delta)
        }
    }
}

impl Transform for PoseRandomizer {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data> {
        match src {
            Data::Pose(pose) => Ok(Data::Pose(self.randomize(state,&pose))),
            other => bail!("pose randomization applied to {:?}", other.data_type())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn stored() -> Pose {
        Pose::new(Vector3::new(10.0,-2.0,0.5),UnitQuaternion::from_euler_angles(0.1,-0.3,1.2))
    }

    #[test]
    fn disabled_is_identity() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut state = SampleRandomState::identity();
        state.pose_delta = PoseRandomizer::uniform([1.0,1.0,1.0],10.0).draw(&mut rng);
        let out = PoseRandomizer::Disabled.apply(&state,Data::Pose(stored())).unwrap().into_pose().unwrap();
        assert_eq!(out,stored());
        assert_eq!(PoseRandomizer::Disabled.draw(&mut rng),Pose::identity());
    }

    #[test]
    fn perturbation_is_bounded() {
        let randomizer = PoseRandomizer::uniform([0.6,1.3,0.7],3.0);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..500 {
            let delta = randomizer.draw(&mut rng);
            assert!(delta.translation[0].abs() <= 0.6);
            assert!(delta.translation[1].abs() <= 1.3);
            assert!(delta.translation[2].abs() <= 0.7);
            let (r,p,y) = delta.rotation.euler_angles();
            for a in [r,p,y] {
                assert!(a.abs() <= (3.0 as Float).to_radians() + 1e-9);
            }
        }
    }

    #[test]
    fn original_pose_is_not_modified() {
        let randomizer = PoseRandomizer::uniform([0.6,1.3,0.7],3.0);
        let mut rng = SmallRng::seed_from_u64(9);
        let mut state = SampleRandomState::identity();
        state.pose_delta = randomizer.draw(&mut rng);
        let pose = stored();
        let moved = randomizer.randomize(&state,&pose);
        assert_ne!(moved,pose);
        assert_eq!(pose,stored());
        let offset = (moved.translation - pose.translation).norm();
        assert!((offset - state.pose_delta.translation.norm()).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_pose_data() {
        let state = SampleRandomState::identity();
        assert!(PoseRandomizer::Disabled.apply(&state,Data::Gray(crate::image::Image::zeros(1,1))).is_err());
    }
}

extern crate rand;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::augmentation::{photometric::ColorJitter, geometric::Flip2d, random_pose::PoseRandomizer};
use crate::numerics::{mix_seed, pose::Pose};
use crate::Float;

/**
 * Everything random about one sample, drawn once and passed to every modality creator.
 */
#[derive(Debug,Clone,PartialEq)]
pub struct SampleRandomState {
    pub brightness: Float,
    pub contrast: Float,
    pub saturation: Float,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Perturbation in the camera frame, composed onto the stored pose.
    pub pose_delta: Pose
}

impl SampleRandomState {

    /**
     * No jitter, no flip, no pose perturbation.
     */
    pub fn identity() -> SampleRandomState {
        SampleRandomState {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            flip_horizontal: false,
            flip_vertical: false,
            pose_delta: Pose::identity()
        }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R, color_jitter: &ColorJitter, flip: &Flip2d, random_pose: &PoseRandomizer) -> SampleRandomState {
        let (brightness, contrast, saturation) = color_jitter.draw(rng);
        let (flip_horizontal, flip_vertical) = flip.draw(rng);
        let pose_delta = random_pose.draw(rng);
        SampleRandomState{brightness,contrast,saturation,flip_horizontal,flip_vertical,pose_delta}
    }

    pub fn from_seed(seed: u64, color_jitter: &ColorJitter, flip: &Flip2d, random_pose: &PoseRandomizer) -> SampleRandomState {
        let mut rng = SmallRng::seed_from_u64(seed);
        SampleRandomState::draw(&mut rng,color_jitter,flip,random_pose)
    }
}

/**
 * Seed of one sample, independent of the order in which samples are fetched.
 */
pub fn seed_for(base_seed: u64, epoch: u64, index: usize) -> u64 {
    mix_seed(mix_seed(base_seed ^ mix_seed(epoch)) ^ index as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::ValueRange;

    fn transforms(jitter: Float) -> (ColorJitter, Flip2d, PoseRandomizer) {
        (ColorJitter::new(jitter), Flip2d::new(0.5,0.0).unwrap(), PoseRandomizer::uniform([0.6,1.3,0.7],3.0))
    }

    #[test]
    fn same_seed_same_state() {
        let (jitter, flip, pose) = transforms(0.1);
        let seed = seed_for(7,0,123);
        assert_eq!(SampleRandomState::from_seed(seed,&jitter,&flip,&pose),SampleRandomState::from_seed(seed,&jitter,&flip,&pose));
    }

    #[test]
    fn seeds_differ_across_indices_and_epochs() {
        assert_ne!(seed_for(0,0,1),seed_for(0,0,2));
        assert_ne!(seed_for(0,0,1),seed_for(0,1,1));
        assert_ne!(seed_for(0,0,1),seed_for(1,0,1));
    }

    #[test]
    fn jitter_factors_stay_in_range() {
        for &j in &[0.0,0.1,0.5,1.5] {
            let (jitter, flip, pose) = transforms(j);
            let range = ValueRange::new((1.0 as Float-j).max(0.0),1.0+j).unwrap();
            for index in 0..200 {
                let state = SampleRandomState::from_seed(seed_for(3,0,index),&jitter,&flip,&pose);
                for f in [state.brightness,state.contrast,state.saturation] {
                    assert!(range.contains(f), "factor {} outside {:?}", f, range);
                }
                assert!(!state.flip_vertical);
            }
        }
    }

    #[test]
    fn both_flip_outcomes_occur() {
        let (jitter, flip, pose) = transforms(0.1);
        let flips = (0..200).map(|i| SampleRandomState::from_seed(seed_for(0,0,i),&jitter,&flip,&pose).flip_horizontal).collect::<Vec<bool>>();
        assert!(flips.iter().any(|&f| f));
        assert!(flips.iter().any(|&f| !f));
    }
}

use color_eyre::eyre::Result;

use crate::data::Data;
use self::state::SampleRandomState;

pub mod state;
pub mod photometric;
pub mod geometric;
pub mod random_pose;

/**
 * A pipeline stage. Every random decision is read from the sample state so that all modalities
 * of one sample see the same draw.
 */
pub trait Transform {
    fn apply(&self, state: &SampleRandomState, src: Data) -> Result<Data>;
}

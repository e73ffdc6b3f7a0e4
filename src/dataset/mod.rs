extern crate rand;

use std::cell::RefCell;
use std::collections::BTreeMap;
use rand::{SeedableRng, rngs::SmallRng};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use tracing::{debug, warn};

use crate::augmentation::{Transform, geometric::{Flip2d, Resize}, photometric::ColorJitter, random_pose::PoseRandomizer, state::{SampleRandomState, seed_for}};
use crate::coords::CoordinateEncoder;
use crate::data::Data;
use crate::geometry::{ProjectionSetup, visibility::VisibilityFilter};
use crate::image::{Image, color::ColorImage, resize::Interpolation};
use crate::io::{RecordKey, RecordKind, RecordStore, record::SampleReader};
use crate::normalization::{DepthNormalization, ValueRange};
use crate::numerics::pose::Pose;
use crate::synthesis::DepthSynthesizer;
use crate::Float;
use self::config::{DatasetParameters, GtPosePolicy, MinibatchConfig, Modality};
use self::tensor::Tensor;

pub mod config;
pub mod tensor;

/**
 * Training draws fresh augmentation per sample; validation is deterministic and unaugmented.
 */
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Mode {
    Train,
    Validation
}

/// Named channel first tensors of one sample, keyed by modality name.
pub type Sample = BTreeMap<String,Tensor>;

/**
 * An indexable source of samples.
 */
pub trait SampleSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Result<Sample>;
}

pub type BoxedStore = Box<dyn RecordStore + Send + Sync>;

type CreateFn = fn(&DepthCompletionDataset, &SampleContext, &MinibatchConfig) -> Result<Tensor>;

struct MinibatchEntry {
    modality: Modality,
    config: MinibatchConfig,
    create: CreateFn
}

/**
 * Everything one sample's modality creators share. Dropped once the sample is assembled.
 */
struct SampleContext<'a> {
    store: &'a dyn RecordStore,
    sample: usize,
    state: &'a SampleRandomState,
    /// augmented colour image per link
    rgb: RefCell<BTreeMap<usize,ColorImage>>
}

impl<'a> SampleContext<'a> {
    fn reader(&self) -> SampleReader<'a> {
        SampleReader::new(self.store,self.sample)
    }
}

pub struct DepthCompletionDataset {
    mode: Mode,
    parameters: DatasetParameters,
    stores: Vec<BoxedStore>,
    /// (store, store local sample) per global index
    index: Vec<(usize,usize)>,
    entries: Vec<MinibatchEntry>,
    output_size: (usize,usize),
    color_jitter: ColorJitter,
    flip: Flip2d,
    random_pose: PoseRandomizer,
    synthesizer: DepthSynthesizer,
    coords: CoordinateEncoder,
    epoch: u64
}

impl DepthCompletionDataset {
    pub fn new(mode: Mode, parameters: DatasetParameters, stores: Vec<BoxedStore>) -> Result<DepthCompletionDataset> {
        parameters.validate()?;
        let parameters = parameters.with_position()?;
        let output_size = parameters.output_size()?;

        let (color_jitter, flip, random_pose) = match mode {
            Mode::Train => (
                ColorJitter::new(parameters.jitter),
                Flip2d::new(parameters.hflip_rate,parameters.vflip_rate)?,
                PoseRandomizer::uniform(parameters.pose_translation_range,parameters.pose_rotation_range)),
            Mode::Validation => (ColorJitter::disabled(),Flip2d::disabled(),PoseRandomizer::Disabled)
        };
        let synthesizer = DepthSynthesizer::new(VisibilityFilter::new(parameters.visibility_filter_radius,parameters.visibility_filter_threshold));
        let coords = CoordinateEncoder::new(output_size.0,output_size.1)?;

        let mut index = Vec::<(usize,usize)>::new();
        for (s, store) in stores.iter().enumerate() {
            let kept = (0..store.len()).filter(|i| match parameters.use_mods {
                Some((remainder, modulus)) => i % modulus == remainder,
                None => true
            });
            index.extend(kept.map(|i| (s,i)));
        }
        if index.is_empty() {
            warn!(stores = stores.len(), "dataset has no samples");
        }

        let entries = parameters.minibatch.iter().map(|(&modality, config)| MinibatchEntry {
            modality,
            config: config.clone(),
            create: creator(modality)
        }).collect::<Vec<MinibatchEntry>>();

        debug!(?mode, samples = index.len(), modalities = entries.len(), "created dataset");
        Ok(DepthCompletionDataset{mode,parameters,stores,index,entries,output_size,color_jitter,flip,random_pose,synthesizer,coords,epoch: 0})
    }

    pub fn train(parameters: DatasetParameters, stores: Vec<BoxedStore>) -> Result<DepthCompletionDataset> {
        DepthCompletionDataset::new(Mode::Train,parameters,stores)
    }

    pub fn validation(parameters: DatasetParameters, stores: Vec<BoxedStore>) -> Result<DepthCompletionDataset> {
        DepthCompletionDataset::new(Mode::Validation,parameters,stores)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn parameters(&self) -> &DatasetParameters {
        &self.parameters
    }

    /// (height, width) of the image modalities.
    pub fn output_size(&self) -> (usize,usize) {
        self.output_size
    }

    /**
     * Changes the augmentation draws of every sample. Draws stay a function of (seed, epoch, index).
     */
    pub fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    /// (store, store local sample) a global index resolves to.
    pub fn locate(&self, index: usize) -> Result<(usize,usize)> {
        self.index.get(index).copied().ok_or_else(|| eyre!("sample index {} out of range for {} samples", index, self.index.len()))
    }

    pub fn sample_state(&self, index: usize) -> SampleRandomState {
        match self.mode {
            Mode::Validation => SampleRandomState::identity(),
            Mode::Train => {
                let mut rng = SmallRng::seed_from_u64(seed_for(self.parameters.seed,self.epoch,index));
                SampleRandomState::draw(&mut rng,&self.color_jitter,&self.flip,&self.random_pose)
            }
        }
    }

    /**
     * Builds sample `index` with an explicit random state.
     */
    pub fn get_with_state(&self, index: usize, state: &SampleRandomState) -> Result<Sample> {
        let (s, sample) = self.locate(index)?;
        debug!(index, store = s, sample, flip = state.flip_horizontal, "creating sample");
        let context = SampleContext{store: self.stores[s].as_ref(), sample, state, rgb: RefCell::new(BTreeMap::new())};
        let mut out = Sample::new();
        for entry in &self.entries {
            let tensor = (entry.create)(self,&context,&entry.config).wrap_err_with(|| format!("failed to create {} for sample {}", entry.modality, index))?;
            out.insert(entry.modality.name().to_string(),tensor);
        }
        Ok(out)
    }

    fn augmented_rgb(&self, context: &SampleContext, config: &MinibatchConfig) -> Result<ColorImage> {
        if let Some(rgb) = context.rgb.borrow().get(&config.link) {
            return Ok(rgb.clone());
        }
        let (height, width) = self.output_size;
        let src = Data::Color(context.reader().color(config.link)?);
        let jittered = self.color_jitter.apply(context.state,src)?;
        let resized = Resize::new(height,width,Interpolation::Bilinear)?.apply(context.state,jittered)?;
        let flipped = self.flip.apply(context.state,resized)?.into_color()?;
        context.rgb.borrow_mut().insert(config.link,flipped.clone());
        Ok(flipped)
    }

    /**
     * Camera, shape and depth range a depth modality is rendered with. Intrinsics are rescaled
     * from the size they were calibrated for to the modality's shape.
     */
    fn projection(&self, context: &SampleContext, config: &MinibatchConfig, kind: RecordKind) -> Result<ProjectionSetup> {
        let (camera, source_size) = context.reader().intrinsic(config.link)?;
        let (height, width) = config.shape;
        let camera = match source_size {
            Some((h, w)) if h > 0 && w > 0 => camera.scaled(width as Float/w as Float,height as Float/h as Float),
            Some(size) => bail!("intrinsics declare an empty source size {:?}", size),
            None => camera
        };
        let recorded = self.recorded_depth_range(context,config,kind)?;
        let depth_range = config.depth_range(recorded)?;
        Ok(ProjectionSetup{camera,height,width,depth_range})
    }

    fn recorded_depth_range(&self, context: &SampleContext, config: &MinibatchConfig, kind: RecordKind) -> Result<Option<ValueRange>> {
        match config.range {
            Some(_) => Ok(None),
            None => Ok(context.store.attributes(&RecordKey::new(kind,context.sample,config.link))?.depth_range)
        }
    }

    fn finish_depth(&self, context: &SampleContext, setup: &ProjectionSetup, config: &MinibatchConfig, depth: Image) -> Result<Tensor> {
        let flipped = self.flip.apply(context.state,Data::Depth(depth))?;
        let normalized = DepthNormalization::new(setup.depth_range)?.apply(context.state,flipped)?.into_image()?;
        Tensor::from_channels(&[&normalized.buffer],config.element_type)
    }

    fn create_rgb(&self, context: &SampleContext, config: &MinibatchConfig) -> Result<Tensor> {
        let rgb = self.augmented_rgb(context,config)?;
        Tensor::from_channels(&[rgb.red(),rgb.green(),rgb.blue()],config.element_type)
    }

    fn create_gray(&self, context: &SampleContext, config: &MinibatchConfig) -> Result<Tensor> {
        let gray = Data::Color(self.augmented_rgb(context,config)?).to_mono()?.into_image()?;
        Tensor::from_channels(&[&gray.buffer],config.element_type)
    }

    fn create_sparse_depth(&self, context: &SampleContext, config: &MinibatchConfig) -> Result<Tensor> {
        let setup = self.projection(context,config,RecordKind::Voxels)?;
        let pose = self.effective_pose(context,config)?;
        let depth = self.synthesizer.sparse(context.store,context.sample,config.link,&setup,&pose)?;
        self.finish_depth(context,&setup,config,depth)
    }

    fn create_gt_depth(&self, context: &SampleContext, config: &MinibatchConfig) -> Result<Tensor> {
        let setup = self.projection(context,config,RecordKind::Points)?;
        let pose = match self.parameters.gt_pose_policy {
            GtPosePolicy::Stored => context.reader().pose(config.link)?,
            GtPosePolicy::MirrorSparse => self.effective_pose(context,config)?
        };
        let depth = self.synthesizer.dense(context.store,context.sample,config.link,&setup,&pose)?;
        self.finish_depth(context,&setup,config,depth)
    }

    fn create_position(&self, _context: &SampleContext, _config: &MinibatchConfig) -> Result<Tensor> {
        Ok(self.coords.encode())
    }

    /**
     * Stored pose with the sample's perturbation applied. Equals the stored pose in validation.
     */
    fn effective_pose(&self, context: &SampleContext, config: &MinibatchConfig) -> Result<Pose> {
        let stored = context.reader().pose(config.link)?;
        self.random_pose.apply(context.state,Data::Pose(stored))?.into_pose()
    }
}

fn creator(modality: Modality) -> CreateFn {
    match modality {
        Modality::Rgb => DepthCompletionDataset::create_rgb,
        Modality::Gray => DepthCompletionDataset::create_gray,
        Modality::SparseDepth => DepthCompletionDataset::create_sparse_depth,
        Modality::GtDepth => DepthCompletionDataset::create_gt_depth,
        Modality::Position => DepthCompletionDataset::create_position
    }
}

impl SampleSource for DepthCompletionDataset {
    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let state = self.sample_state(index);
        self.get_with_state(index,&state)
    }
}

pub mod clip_tuner;
pub mod curve;
pub mod emitter;
pub mod keys;
pub mod model_tuner;
pub mod registry;

pub use crate::domain::model::{Mode, TuneReport, TunedModel};
pub use crate::domain::ports::PatchableModel;
pub use crate::domain::schema::NodeDescriptor;
pub use crate::utils::error::Result;

/// Host menu category both nodes register under.
pub const NODE_CATEGORY: &str = "SDXL/Tuners";

/// A tuner node: declares its inputs and rewrites a cloned host model.
pub trait TunerNode {
    type Weights;

    fn descriptor(&self) -> NodeDescriptor;

    /// Clone `model`, patch the clone according to `weights` and return it.
    fn tune<M: PatchableModel>(&self, model: &M, weights: &Self::Weights) -> TunedModel<M>;
}

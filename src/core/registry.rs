use crate::core::clip_tuner::ClipTuner;
use crate::core::model_tuner::ModelTuner;
use crate::core::TunerNode;
use crate::domain::schema::NodeDescriptor;

/// Descriptors for every node this crate provides, in registration order.
pub fn node_registry() -> Vec<NodeDescriptor> {
    vec![ClipTuner.descriptor(), ModelTuner.descriptor()]
}

pub fn find_node(id: &str) -> Option<NodeDescriptor> {
    node_registry().into_iter().find(|d| d.id == id)
}

//! Tool descriptors: the static, data-driven description of each target
//! tool. Adding a target is a descriptor entry, never a code branch.

mod definition;
mod loader;

pub use definition::{
    AgentRules, DeliveryStrategy, Detection, JsonDelivery, ManifestKind, ManifestRules,
    Placement, RuleRules, ToolDescriptor,
};
pub use loader::DescriptorSet;

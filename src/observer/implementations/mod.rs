// Model receivers grouped by the app they react to

pub mod applications;
pub mod conversations;
pub mod pickups;

pub use applications::*;
pub use conversations::*;
pub use pickups::*;

use crate::observer::pipeline::ObserverPipeline;
use crate::observer::traits::ObserverBox;

/// Register every receiver with the pipeline
pub fn register_all(pipeline: &mut ObserverPipeline) {
    // Conversations
    pipeline.register_observer(ObserverBox::PreSave(Box::new(CreateThreadParticipant)));
    pipeline.register_observer(ObserverBox::PostSave(Box::new(MarkAsRead)));
    pipeline.register_observer(ObserverBox::PostSave(Box::new(NotifyParticipants)));
    pipeline.register_observer(ObserverBox::PostSave(Box::new(MessageCreated)));
    pipeline.register_observer(ObserverBox::PostSave(Box::new(ReactionCreated)));
    pipeline.register_observer(ObserverBox::PostSave(Box::new(SetConversationUpdatedAtOnCreate)));
    pipeline.register_observer(ObserverBox::PreDelete(Box::new(SetConversationUpdatedAtOnDelete)));

    // Pickups
    pipeline.register_observer(ObserverBox::PreSave(Box::new(SendMessageOnCancelledPickup)));

    // Applications
    pipeline.register_observer(ObserverBox::PostSave(Box::new(ApplicationCreated)));
    pipeline.register_observer(ObserverBox::PreSave(Box::new(ApplicationStatusChanged)));
}

//! Events emitted by the context engine
//!
//! Listener notification is a fire-and-forget side channel, not part of
//! the transactional contract: a committed update stays committed even
//! if nobody is subscribed.

use specflow_types::{ContextId, UpdateId, UpdateKind};

/// Events broadcast after context mutations commit
#[derive(Debug, Clone)]
pub enum ContextEvent {
    /// A context was created
    Created { context_id: ContextId },

    /// A batch of updates committed
    Updated {
        context_id: ContextId,
        update_ids: Vec<UpdateId>,
        kinds: Vec<UpdateKind>,
    },

    /// A consistency sweep found violations and flagged the context
    InconsistencyFlagged {
        context_id: ContextId,
        violation_count: usize,
    },
}

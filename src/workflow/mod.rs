pub mod interaction_flow;
pub mod post_ctx;

pub use interaction_flow::InteractionFlow;
pub use post_ctx::PostCtx;

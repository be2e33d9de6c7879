//! Process-wide render context with an explicit init-once guard.
//!
//! Widgets that need a render context ask for the shared one. The first
//! request creates it; every later request gets the same instance, even when
//! first requests race on different threads. The check-and-set runs under a
//! `parking_lot` mutex, so creation happens at most once.
//!
//! Teardown is explicit: [`release_shared_context()`] drops the process-wide
//! reference and the context goes away once the last handle is dropped.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::{ContextConfig, RenderContext};

/// A handle to the shared render context.
pub type SharedContext = Arc<Mutex<RenderContext>>;

struct Shared {
    config: ContextConfig,
    context: SharedContext,
}

static SHARED: Mutex<Option<Shared>> = parking_lot::const_mutex(None);

/// Returns the shared context, creating it with `config` on first use.
///
/// Later calls return the existing context; a differing `config` is ignored
/// and logged.
pub fn shared_context(config: &ContextConfig) -> SharedContext {
    let mut slot = SHARED.lock();
    if let Some(shared) = slot.as_ref() {
        if shared.config != *config {
            tracing::debug!(
                "shared render context already running at {} Hz / {} samples; requested config ignored",
                shared.config.sample_rate,
                shared.config.block_size
            );
        }
        return Arc::clone(&shared.context);
    }

    let context = Arc::new(Mutex::new(RenderContext::new(*config)));
    *slot = Some(Shared {
        config: *config,
        context: Arc::clone(&context),
    });
    tracing::info!("shared render context initialised");
    context
}

/// Returns the shared context if it has been created.
pub fn try_shared_context() -> Option<SharedContext> {
    SHARED.lock().as_ref().map(|shared| Arc::clone(&shared.context))
}

/// Drops the process-wide reference to the shared context.
///
/// Outstanding handles stay usable; the next [`shared_context()`] call
/// creates a fresh context. Returns `false` if there was nothing to release.
pub fn release_shared_context() -> bool {
    let released = SHARED.lock().take();
    if let Some(shared) = &released {
        tracing::info!(
            "shared render context released ({} handles outstanding)",
            Arc::strong_count(&shared.context) - 1
        );
    }
    released.is_some()
}

/// Renders one block of a shared context without blocking (render thread).
///
/// If the control domain holds the lock, the block is silent and `false`
/// is returned.
pub fn render_shared(context: &Mutex<RenderContext>, inputs: &[&[f32]], output: &mut [f32]) -> bool {
    match context.try_lock() {
        Some(mut ctx) => {
            ctx.render_block(inputs, output);
            true
        }
        None => {
            output.fill(0.0);
            false
        }
    }
}

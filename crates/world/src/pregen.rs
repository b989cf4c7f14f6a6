//! Background pregeneration on a single worker thread.
//!
//! The worker builds each missing chunk without holding the world lock and
//! only takes a short write lock to insert it, so the render thread can keep
//! reading the world while pregeneration runs.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crate::chunk::Chunk;
use crate::world::{PregenBounds, World, WorldError};

/// World shared between the game loop and the pregeneration thread.
pub type SharedWorld = Arc<RwLock<World>>;

/// Handle to a running pregeneration thread.
///
/// Dropping the handle detaches the thread; there is no cancellation.
#[derive(Debug)]
pub struct PregenHandle {
    thread: JoinHandle<usize>,
    done: Arc<AtomicUsize>,
    total: usize,
}

impl PregenHandle {
    /// Coordinates visited so far and the total in bounds.
    pub fn progress(&self) -> (usize, usize) {
        (self.done.load(Ordering::Acquire), self.total)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the thread and return how many chunks it created.
    pub fn join(self) -> Result<usize, WorldError> {
        self.thread.join().map_err(|_| WorldError::PregenPanicked)
    }
}

/// Start pregenerating every chunk in `bounds` on a background thread.
pub fn spawn_pregeneration(
    world: SharedWorld,
    bounds: PregenBounds,
) -> Result<PregenHandle, WorldError> {
    let done = Arc::new(AtomicUsize::new(0));
    let progress = Arc::clone(&done);
    let total = bounds.len();

    let thread = std::thread::Builder::new()
        .name("world-pregen".into())
        .spawn(move || {
            let _span = tracing::info_span!("pregenerate").entered();
            tracing::info!(min = %bounds.min(), max = %bounds.max(), "world pregeneration bounds");
            let mut created = 0;
            for coord in bounds.coords() {
                if !world.read().contains(coord) {
                    let chunk = Chunk::new(coord);
                    if world.write().insert_if_absent(chunk) {
                        created += 1;
                    }
                }
                progress.fetch_add(1, Ordering::Release);
            }
            tracing::info!(created, total = world.read().chunk_count(), "chunks pregenerated");
            created
        })?;

    Ok(PregenHandle {
        thread,
        done,
        total,
    })
}

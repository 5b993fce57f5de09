//! A fixed-slot background thread pool (§4.10) used by the path tracer to
//! hand off whole tiles without blocking the scheduling thread. Workers are
//! detached once launched: the pool never joins a thread, only polls status.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Result, VkdtError};

pub type WorkerId = usize;

pub const DEFAULT_WORK_SLOT_COUNT: usize = 4;

const STATUS_AVAILABLE: u8 = 1;
const STATUS_RUNNING: u8 = 2;
const STATUS_AWAITING_PICKUP: u8 = 4;

struct Slot<O> {
    status: AtomicU8,
    output: Mutex<Option<O>>,
}

impl<O> Default for Slot<O> {
    fn default() -> Self {
        Self {
            status: AtomicU8::new(STATUS_AVAILABLE),
            output: Mutex::new(None),
        }
    }
}

/// A pool of `num_work_slots` background workers producing `O` on
/// completion. `O` is carried by value rather than through a scratch-memory
/// byte buffer; the closure passed to `launch_job` captures whatever input
/// it needs.
pub struct WorkGroup<O> {
    slots: Vec<Arc<Slot<O>>>,
    rotating_launch_index: Mutex<usize>,
}

impl<O: Send + 'static> WorkGroup<O> {
    pub fn new(num_work_slots: usize) -> Self {
        Self {
            slots: (0..num_work_slots).map(|_| Arc::new(Slot::default())).collect(),
            rotating_launch_index: Mutex::new(0),
        }
    }

    /// Starts `work` on the next available slot, rotating the search start
    /// point each call so no slot is starved. Returns `None` if every slot is
    /// busy or awaiting pickup.
    pub fn launch_job(&self, work: impl FnOnce() -> O + Send + 'static) -> Option<WorkerId> {
        let num_slots = self.slots.len();
        let mut rotating_index = self.rotating_launch_index.lock().unwrap();

        for i in 0..num_slots {
            let slot_index = (*rotating_index + i) % num_slots;
            let slot = &self.slots[slot_index];
            if slot
                .status
                .compare_exchange(
                    STATUS_AVAILABLE,
                    STATUS_RUNNING,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                *rotating_index = (slot_index + 1) % num_slots;
                drop(rotating_index);

                let slot = Arc::clone(slot);
                std::thread::spawn(move || {
                    let result = work();
                    *slot.output.lock().unwrap() = Some(result);
                    slot.status.store(STATUS_AWAITING_PICKUP, Ordering::Release);
                });
                return Some(slot_index);
            }
        }
        None
    }

    /// Every slot currently holding a completed, unclaimed result.
    pub fn waiting_workers(&self) -> Vec<WorkerId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.status.load(Ordering::Acquire) == STATUS_AWAITING_PICKUP)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn num_workers_available(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status.load(Ordering::Acquire) == STATUS_AVAILABLE)
            .count()
    }

    /// Takes the output out of `id`'s slot if it is awaiting pickup, leaving
    /// the slot's status untouched -- the caller must still call
    /// `mark_available` once done with the result.
    pub fn worker_output(&self, id: WorkerId) -> Option<O> {
        let slot = &self.slots[id];
        if slot.status.load(Ordering::Acquire) != STATUS_AWAITING_PICKUP {
            return None;
        }
        slot.output.lock().unwrap().take()
    }

    /// Hands `id`'s slot back to the pool. Errors if the slot was not
    /// awaiting pickup.
    pub fn mark_available(&self, id: WorkerId) -> Result<()> {
        let slot = &self.slots[id];
        match slot.status.compare_exchange(
            STATUS_AWAITING_PICKUP,
            STATUS_AVAILABLE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(()),
            Err(_) => Err(VkdtError::ConcurrencyViolation { slot: id }),
        }
    }
}

impl<O: Send + 'static> Default for WorkGroup<O> {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_SLOT_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn job_completes_and_becomes_available_again_after_pickup() {
        let group: WorkGroup<i32> = WorkGroup::new(2);
        let id = group.launch_job(|| 1 + 1).expect("a slot should be free");

        let mut output = None;
        for _ in 0..200 {
            if group.waiting_workers().contains(&id) {
                output = group.worker_output(id);
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(output, Some(2));
        group.mark_available(id).unwrap();
        assert_eq!(group.num_workers_available(), 2);
    }

    #[test]
    fn all_slots_busy_returns_none() {
        let group: WorkGroup<()> = WorkGroup::new(1);
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let b = Arc::clone(&barrier);
        let id = group.launch_job(move || {
            b.wait();
        });
        assert!(id.is_some());
        assert!(group.launch_job(|| {}).is_none());
        barrier.wait();
    }

    #[test]
    fn picking_up_a_slot_twice_without_relaunch_errors() {
        let group: WorkGroup<i32> = WorkGroup::new(1);
        let id = group.launch_job(|| 5).unwrap();
        for _ in 0..200 {
            if group.waiting_workers().contains(&id) {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        group.mark_available(id).unwrap();
        assert!(matches!(
            group.mark_available(id),
            Err(VkdtError::ConcurrencyViolation { slot: 0 })
        ));
    }
}

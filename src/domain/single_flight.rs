use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single slot job state: at most one download runs at a time.
///
/// A second caller is rejected, never queued.
#[derive(Clone, Debug, Default)]
pub struct SingleFlight(Arc<AtomicBool>);

impl SingleFlight {
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit(self.0.clone()))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held for the whole download, the slot is released on drop.
#[derive(Debug)]
pub struct FlightPermit(Arc<AtomicBool>);

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::SingleFlight;

    #[test]
    fn should_reject_second_acquire_while_held() {
        let guard = SingleFlight::default();
        let permit = guard.try_acquire().unwrap();
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn should_share_state_between_clones() {
        let guard = SingleFlight::default();
        let other = guard.clone();
        let _permit = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }

    #[tokio::test]
    async fn should_release_when_task_fails() {
        let guard = SingleFlight::default();
        let cloned = guard.clone();
        let res = tokio::spawn(async move {
            let _permit = cloned.try_acquire().unwrap();
            panic!("download exploded");
        })
        .await;
        assert!(res.is_err());
        assert!(!guard.is_busy());
    }

    #[tokio::test]
    async fn should_grant_a_single_permit_under_contention() {
        let guard = SingleFlight::default();
        let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(16));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let guard = guard.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                let permit = guard.try_acquire();
                // keep permits alive until every task tried
                barrier.wait().await;
                permit.is_some()
            }));
        }
        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 1);
    }
}

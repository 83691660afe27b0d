//! Отслеживание идентификаторов, которые сейчас конструируются (per thread).

use std::cell::RefCell;

use crate::errors::{ContainerError, ContainerResult};

thread_local! {
    static IN_PROGRESS: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// RAII frame of the resolution stack.
///
/// Entering an identifier that is already on the stack for the same
/// container fails before any construction guard is taken, which turns a
/// would-be deadlock into `CyclicDependency`. A stack deeper than the limit
/// fails with `DepthExceeded`.
#[derive(Debug)]
pub(crate) struct ResolutionFrame {
    _private: (),
}

impl ResolutionFrame {
    pub(crate) fn enter(container: u64, id: &str, max_depth: usize) -> ContainerResult<Self> {
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            let chain: Vec<&str> = stack
                .iter()
                .filter(|(owner, _)| *owner == container)
                .map(|(_, entry)| entry.as_str())
                .collect();

            if let Some(start) = chain.iter().position(|entry| *entry == id) {
                let mut cycle: Vec<String> = chain[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(id.to_string());
                return Err(ContainerError::cyclic(cycle));
            }

            if chain.len() >= max_depth {
                let mut path: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
                path.push(id.to_string());
                return Err(ContainerError::depth_exceeded(path, max_depth));
            }

            stack.push((container, id.to_string()));
            Ok(Self { _private: () })
        })
    }
}

impl Drop for ResolutionFrame {
    fn drop(&mut self) {
        IN_PROGRESS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentry_is_cycle() {
        let _a = ResolutionFrame::enter(1, "A", 16).unwrap();
        let _b = ResolutionFrame::enter(1, "B", 16).unwrap();

        let err = ResolutionFrame::enter(1, "A", 16).unwrap_err();
        assert_eq!(
            err,
            ContainerError::cyclic(vec!["A".into(), "B".into(), "A".into()])
        );
    }

    #[test]
    fn test_frames_are_scoped_per_container() {
        let _outer = ResolutionFrame::enter(1, "A", 16).unwrap();
        let inner = ResolutionFrame::enter(2, "A", 16);
        assert!(inner.is_ok());
    }

    #[test]
    fn test_frame_is_released_on_drop() {
        {
            let _a = ResolutionFrame::enter(3, "A", 16).unwrap();
        }
        assert!(ResolutionFrame::enter(3, "A", 16).is_ok());
    }

    #[test]
    fn test_depth_limit() {
        let _a = ResolutionFrame::enter(4, "A", 2).unwrap();
        let _b = ResolutionFrame::enter(4, "B", 2).unwrap();
        let err = ResolutionFrame::enter(4, "C", 2).unwrap_err();
        assert_eq!(
            err,
            ContainerError::depth_exceeded(vec!["A".into(), "B".into(), "C".into()], 2)
        );
    }
}

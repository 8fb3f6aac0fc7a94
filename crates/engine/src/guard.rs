// m13 - REST facade for live debugging sessions
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::sync::Arc;

use parking_lot::Mutex;

/// The single exclusive domain around a debugging engine.
///
/// The engine is not reentrant and changes state on its own, so every reader,
/// every control action and every event pump goes through the same lock. A
/// closure passed to [`EngineGuard::with`] sees the engine either fully before
/// or fully after any other holder's changes.
#[derive(Debug)]
pub struct EngineGuard<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for EngineGuard<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E> EngineGuard<E> {
    /// Take ownership of `engine`
    pub fn new(engine: E) -> Self {
        Self { inner: Arc::new(Mutex::new(engine)) }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }

    /// Run `f` with shared read access; still exclusive against every other holder
    pub fn read<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        let engine = self.inner.lock();
        f(&engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_engine() {
        let guard = EngineGuard::new(0u32);
        let other = guard.clone();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = other.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        guard.with(|n| *n += 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(guard.read(|n| *n), 8000);
    }

    #[test]
    fn test_guard_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineGuard<crate::SandboxEngine>>();
    }
}

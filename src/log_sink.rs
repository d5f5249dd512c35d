use once_cell::sync::OnceCell;
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, thiserror::Error)]
#[error("Couldn't write dumps to {path}: {source}")]
pub struct SaveError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

#[derive(Default)]
struct Buffer {
    text: String,
    generation: u64,
}

type Waker = Box<dyn Fn() + Send + Sync>;

/// Append-only text shared by the relays and the UI.
///
/// Lines are appended whole under a single lock: readers never see
/// a partial line.
#[derive(Clone, Default)]
pub struct LogSink {
    buffer: Arc<Mutex<Buffer>>,
    waker: Arc<OnceCell<Waker>>,
}

impl LogSink {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the function called after each change, e.g. to request a repaint.
    ///
    /// Only the first waker is kept.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        if self.waker.set(Box::new(waker)).is_err() {
            log::warn!("Log sink waker already set");
        }
    }

    fn wake(&self) {
        if let Some(waker) = self.waker.get() {
            waker();
        }
    }

    pub fn append(&self, line: &str) {
        {
            let mut buffer = self.lock();
            buffer.text.push_str(line);
            buffer.generation += 1;
        }

        self.wake();
    }

    pub fn clear(&self) {
        {
            let mut buffer = self.lock();
            buffer.text.clear();
            buffer.generation += 1;
        }

        self.wake();
    }

    pub fn snapshot(&self) -> String {
        self.lock().text.clone()
    }

    /// Returns the text and its generation if it changed since `generation`.
    pub fn snapshot_if_changed(&self, generation: u64) -> Option<(u64, String)> {
        let buffer = self.lock();
        (buffer.generation != generation).then(|| (buffer.generation, buffer.text.clone()))
    }

    #[cfg(test)]
    pub fn lines(&self) -> usize {
        self.lock().text.matches('\n').count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().text.is_empty()
    }

    /// Writes the current text verbatim to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let text = self.snapshot();
        std::fs::write(path, text.as_bytes()).map_err(|source| SaveError {
            path: path.display().to_string(),
            source,
        })?;

        log::info!("Saved {} bytes of dumps to {}", text.len(), path.display());

        Ok(())
    }
}

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// Transfer progress of one file inside a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub file: PathBuf,
    pub sent: u64,
    pub total: u64,
}

/// Receives [`ProgressEvent`]s while a file is streamed.
///
/// Invoked on the thread performing the upload, in the middle of the blocking send.
pub trait ProgressObserver: Send + Sync {
    fn progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

// Wraps a file reader and reports each chunk handed to the transport
pub(crate) struct ProgressReader<R> {
    inner: io::Take<R>,
    file: PathBuf,
    sent: u64,
    total: u64,
    started: bool,
    finished: bool,
    observers: Arc<[Arc<dyn ProgressObserver>]>,
}

impl<R: Read> ProgressReader<R> {
    pub(crate) fn new(
        inner: R,
        file: PathBuf,
        total: u64,
        observers: Arc<[Arc<dyn ProgressObserver>]>,
    ) -> Self {
        Self {
            inner: inner.take(total),
            file,
            sent: 0,
            total,
            started: false,
            finished: false,
            observers,
        }
    }

    fn notify(&self, sent: u64) {
        let event = ProgressEvent {
            file: self.file.clone(),
            sent,
            total: self.total,
        };
        for observer in self.observers.iter() {
            observer.progress(&event);
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.started {
            self.started = true;
            self.notify(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            self.notify(self.sent);
        } else if !self.finished {
            self.finished = true;
            if self.sent != self.total {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{} shrank during upload, sent {} of {} bytes",
                        self.file.display(),
                        self.sent,
                        self.total
                    ),
                ));
            }
            self.notify(self.total);
        }
        Ok(n)
    }
}
